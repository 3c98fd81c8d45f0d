//! JSON lines I/O for the CLI
//!
//! - Input: one JSON object per line via stdin, blank lines are skipped
//! - Output: one JSON object per line via stdout
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde::Serialize;
use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Reads JSON lines from a reader. Blank lines are skipped.
///
/// Malformed lines yield an invalid input error, the iteration continues.
pub fn read_lines<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<Value>> {
    reader.lines().filter_map(|line| match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(
            serde_json::from_str(&line)
                .map_err(|e| CliError::invalid_input(format!("Invalid JSON line: {}", e))),
        ),
        Err(e) => Some(Err(CliError::from(e))),
    })
}

/// Writes a value as a single JSON line.
pub fn write_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Writes a success response line and flushes.
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(out, &response)?;
    out.flush()?;
    Ok(())
}

/// Builds an error response line.
pub fn error_response(code: &str, message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}
