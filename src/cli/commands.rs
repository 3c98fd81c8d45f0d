//! CLI command implementations
//!
//! Every command loads the configuration, starts the index, runs and stops
//! the index again. Commands write to any `Write` so they can be tested
//! without a terminal.

use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::json;
use tracing::{info, warn};

use crate::config::NidxConfig;
use crate::index::{from_config, NameIndex, NameIndexImpl};
use crate::model::{MatchType, Name, NameKey};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{error_response, read_lines, write_line, write_response};

/// Parses the command line and runs the command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(command: Command) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Match {
            config,
            inserts,
            verbose,
        } => {
            let stdin = io::stdin();
            match_names(&config, stdin.lock(), &mut out, inserts, verbose)
        }
        Command::Stats { config } => stats(&config, &mut out),
        Command::Export { config } => export(&config, &mut out),
        Command::Rebuild { config } => rebuild(&config, &mut out),
        Command::Compact { config } => compact(&config, &mut out),
        Command::Reset { config } => reset(&config, &mut out),
        Command::Delete { config, key } => delete(&config, key, &mut out),
    }
}

fn open_index(config_path: &Path) -> CliResult<NameIndexImpl> {
    let config = NidxConfig::load(config_path)?;
    let index = from_config(&config)?;
    index.start()?;
    Ok(index)
}

/// Runs a command against a started index and always stops it again.
fn with_index<T>(config_path: &Path, f: impl FnOnce(&NameIndexImpl) -> CliResult<T>) -> CliResult<T> {
    let index = open_index(config_path)?;
    let result = f(&index);
    let stopped = index.stop();
    let value = result?;
    stopped?;
    Ok(value)
}

/// Matches every name read from `input`, writing one `NameMatch` per line.
///
/// Malformed lines produce an error line and matching continues.
pub fn match_names<R: BufRead, W: Write>(
    config_path: &Path,
    input: R,
    out: &mut W,
    inserts: bool,
    verbose: bool,
) -> CliResult<()> {
    with_index(config_path, |index| {
        let mut total = 0usize;
        let mut nomatch = 0usize;
        for item in read_lines(input) {
            let parsed = item.and_then(|value| {
                serde_json::from_value::<Name>(value)
                    .map_err(|e| CliError::invalid_input(format!("Invalid name: {}", e)))
            });
            let name = match parsed {
                Ok(name) => name,
                Err(e) if e.is_invalid_input() => {
                    warn!(error = %e, "skipping input line");
                    write_line(out, &error_response(e.code(), &e.to_string()))?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let m = index.match_name(&name, inserts, verbose)?;
            total += 1;
            if m.match_type == MatchType::None {
                nomatch += 1;
            }
            write_line(out, &m)?;
        }
        out.flush()?;
        info!(total, nomatch, "names matched");
        Ok(())
    })
}

pub fn stats<W: Write>(config_path: &Path, out: &mut W) -> CliResult<()> {
    with_index(config_path, |index| {
        let size = index.size()?;
        let created = index.created()?;
        write_response(out, json!({"size": size, "created": created}))
    })
}

pub fn export<W: Write>(config_path: &Path, out: &mut W) -> CliResult<()> {
    with_index(config_path, |index| {
        let names = index.all()?;
        for name in &names {
            write_line(out, name)?;
        }
        out.flush()?;
        info!(names = names.len(), "names exported");
        Ok(())
    })
}

pub fn rebuild<W: Write>(config_path: &Path, out: &mut W) -> CliResult<()> {
    with_index(config_path, |index| {
        let names = index.rebuild()?;
        write_response(out, json!({"rebuilt": names}))
    })
}

pub fn compact<W: Write>(config_path: &Path, out: &mut W) -> CliResult<()> {
    with_index(config_path, |index| {
        index.compact()?;
        write_response(out, json!({"compacted": true, "size": index.size()?}))
    })
}

pub fn reset<W: Write>(config_path: &Path, out: &mut W) -> CliResult<()> {
    with_index(config_path, |index| {
        index.reset()?;
        write_response(out, json!({"reset": true}))
    })
}

pub fn delete<W: Write>(config_path: &Path, key: NameKey, out: &mut W) -> CliResult<()> {
    with_index(config_path, |index| {
        let removed: Vec<NameKey> = index.delete(key)?.iter().filter_map(|n| n.key).collect();
        write_response(out, json!({"deleted": removed}))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_config(temp_dir: &TempDir) -> PathBuf {
        let config_path = temp_dir.path().join("nidx.json");
        let config = json!({
            "index_dir": temp_dir.path().join("index").to_string_lossy(),
            "mirror_file": temp_dir.path().join("mirror.dat").to_string_lossy(),
        });
        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    fn lines(out: Vec<u8>) -> Vec<Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    const INPUT: &str = concat!(
        "{\"scientificName\":\"Abies alba\",\"authorship\":\"Mill.\",\"rank\":\"SPECIES\"}\n",
        "not json\n",
        "{\"scientificName\":\"Abies alba\",\"rank\":\"SPECIES\"}\n",
    );

    #[test]
    fn test_match_with_inserts() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        let mut out = Vec::new();
        match_names(&config_path, INPUT.as_bytes(), &mut out, true, false).unwrap();
        let results = lines(out);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["type"], "EXACT");
        assert_eq!(results[1]["status"], "error");
        assert_eq!(results[1]["code"], "NIDX_CLI_INVALID_INPUT");
        assert_eq!(results[2]["type"], "CANONICAL");

        let mut out = Vec::new();
        stats(&config_path, &mut out).unwrap();
        assert_eq!(lines(out)[0]["data"]["size"], 2);
    }

    #[test]
    fn test_match_without_inserts() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        let mut out = Vec::new();
        match_names(&config_path, INPUT.as_bytes(), &mut out, false, false).unwrap();
        let results = lines(out);
        assert_eq!(results[0]["type"], "NONE");
        assert_eq!(results[2]["type"], "NONE");
    }

    #[test]
    fn test_export_delete_reset() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        match_names(&config_path, INPUT.as_bytes(), &mut Vec::new(), true, false).unwrap();

        let mut out = Vec::new();
        export(&config_path, &mut out).unwrap();
        let names = lines(out);
        assert_eq!(names.len(), 2);
        let canonical = names[0]["id"].as_u64().unwrap() as NameKey;

        let mut out = Vec::new();
        delete(&config_path, canonical, &mut out).unwrap();
        assert_eq!(lines(out)[0]["data"]["deleted"].as_array().unwrap().len(), 2);

        match_names(&config_path, INPUT.as_bytes(), &mut Vec::new(), true, false).unwrap();
        reset(&config_path, &mut Vec::new()).unwrap();
        let mut out = Vec::new();
        stats(&config_path, &mut out).unwrap();
        assert_eq!(lines(out)[0]["data"]["size"], 0);
    }

    #[test]
    fn test_rebuild_and_compact() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        match_names(&config_path, INPUT.as_bytes(), &mut Vec::new(), true, false).unwrap();

        let mut out = Vec::new();
        rebuild(&config_path, &mut out).unwrap();
        assert_eq!(lines(out)[0]["data"]["rebuilt"], 2);

        let mut out = Vec::new();
        compact(&config_path, &mut out).unwrap();
        assert_eq!(lines(out)[0]["data"]["size"], 2);
    }

    #[test]
    fn test_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let err = stats(&temp_dir.path().join("missing.json"), &mut Vec::new()).unwrap_err();
        assert_eq!(err.code(), "NIDX_CLI_CONFIG_ERROR");
    }
}
