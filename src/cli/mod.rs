//! CLI module for nidx
//!
//! Provides command-line access to a names index:
//! - match: match JSON names from stdin
//! - stats / export: inspect the index
//! - rebuild / compact / reset / delete: administration

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{compact, delete, export, match_names, rebuild, reset, run, run_command, stats};
pub use errors::{CliError, CliResult};
pub use io::{error_response, read_lines, write_line, write_response};
