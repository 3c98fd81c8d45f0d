//! CLI errors
//!
//! Error codes:
//! - NIDX_CLI_CONFIG_ERROR: the config file could not be loaded
//! - NIDX_CLI_IO_ERROR: reading stdin or writing stdout failed
//! - NIDX_CLI_INVALID_INPUT: a malformed input line, reported and skipped
//! - NIDX_CLI_INDEX_ERROR: the names index failed
//!
//! Every error except invalid input ends the process with a non-zero exit code.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::index::IndexError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("NIDX_CLI_CONFIG_ERROR: {0} ({code})", code = .0.code())]
    Config(#[from] ConfigError),

    #[error("NIDX_CLI_IO_ERROR: {0}")]
    Io(#[from] io::Error),

    #[error("NIDX_CLI_IO_ERROR: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("NIDX_CLI_INVALID_INPUT: {0}")]
    InvalidInput(String),

    #[error("NIDX_CLI_INDEX_ERROR: {0} ({code})", code = .0.code())]
    Index(#[from] IndexError),
}

impl CliError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        CliError::InvalidInput(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "NIDX_CLI_CONFIG_ERROR",
            CliError::Io(_) | CliError::Json(_) => "NIDX_CLI_IO_ERROR",
            CliError::InvalidInput(_) => "NIDX_CLI_INVALID_INPUT",
            CliError::Index(_) => "NIDX_CLI_INDEX_ERROR",
        }
    }

    /// Invalid input only affects a single line.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, CliError::InvalidInput(_))
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_errors_keep_their_code() {
        let err: CliError = IndexError::Unavailable.into();
        assert_eq!(err.code(), "NIDX_CLI_INDEX_ERROR");
        assert!(err.to_string().starts_with("NIDX_CLI_INDEX_ERROR"));
        assert!(err.to_string().contains("NIDX_INDEX_UNAVAILABLE"));
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn test_invalid_input() {
        let err = CliError::invalid_input("Invalid JSON line");
        assert_eq!(err.code(), "NIDX_CLI_INVALID_INPUT");
        assert!(err.is_invalid_input());
    }
}
