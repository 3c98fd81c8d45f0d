//! Configuration file
//!
//! A JSON object, every field optional:
//!
//! ```json
//! {
//!   "index_dir": "/var/lib/nidx/index",
//!   "mirror_file": "/var/lib/nidx/mirror.dat",
//!   "sync_writes": false,
//!   "batch_size": 10000,
//!   "missing_threshold": 0.9,
//!   "threads": 4,
//!   "allow_inserts": true
//! }
//! ```
//!
//! Without `index_dir` the store lives in memory, without `mirror_file` so
//! does the mirror.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "NIDX_CONFIG_READ",
            ConfigError::Parse(_) => "NIDX_CONFIG_PARSE",
            ConfigError::Invalid(_) => "NIDX_CONFIG_INVALID",
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NidxConfig {
    /// Directory of the persistent store (optional, in-memory if absent)
    #[serde(default)]
    pub index_dir: Option<PathBuf>,

    /// Mirror file (optional, in-memory if absent)
    #[serde(default)]
    pub mirror_file: Option<PathBuf>,

    /// fsync every journal and mirror record (default false)
    #[serde(default)]
    pub sync_writes: bool,

    /// Records per batch pipeline commit (default 10000)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Datasets below this match ratio are rematched by the missing sweep
    #[serde(default = "default_missing_threshold")]
    pub missing_threshold: f64,

    /// Worker threads for parallel dataset rematches (default 4)
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Insert unresolved names during batch matching (default true)
    #[serde(default = "default_allow_inserts")]
    pub allow_inserts: bool,
}

fn default_batch_size() -> usize {
    10_000
}
fn default_missing_threshold() -> f64 {
    0.9
}
fn default_threads() -> usize {
    4
}
fn default_allow_inserts() -> bool {
    true
}

impl Default for NidxConfig {
    fn default() -> Self {
        Self {
            index_dir: None,
            mirror_file: None,
            sync_writes: false,
            batch_size: default_batch_size(),
            missing_threshold: default_missing_threshold(),
            threads: default_threads(),
            allow_inserts: default_allow_inserts(),
        }
    }
}

impl NidxConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: NidxConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be > 0".to_string()));
        }
        if self.threads == 0 {
            return Err(ConfigError::Invalid("threads must be > 0".to_string()));
        }
        if !(self.missing_threshold > 0.0 && self.missing_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "missing_threshold must be within (0, 1], got {}",
                self.missing_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, value: serde_json::Value) -> PathBuf {
        let path = dir.path().join("nidx.json");
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, json!({}));
        let config = NidxConfig::load(&path).unwrap();
        assert_eq!(config, NidxConfig::default());
        assert_eq!(config.batch_size, 10_000);
        assert!(config.allow_inserts);
        assert!(config.index_dir.is_none());
    }

    #[test]
    fn test_paths() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            json!({"index_dir": "/tmp/idx", "mirror_file": "/tmp/mirror.dat", "threads": 2}),
        );
        let config = NidxConfig::load(&path).unwrap();
        assert_eq!(config.index_dir, Some(PathBuf::from("/tmp/idx")));
        assert_eq!(config.threads, 2);
    }

    #[test]
    fn test_validation() {
        let temp_dir = TempDir::new().unwrap();
        for invalid in [
            json!({"batch_size": 0}),
            json!({"threads": 0}),
            json!({"missing_threshold": 0.0}),
            json!({"missing_threshold": 1.5}),
        ] {
            let path = write_config(&temp_dir, invalid);
            let err = NidxConfig::load(&path).unwrap_err();
            assert_eq!(err.code(), "NIDX_CONFIG_INVALID");
        }
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let temp_dir = TempDir::new().unwrap();
        let err = NidxConfig::load(&temp_dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.code(), "NIDX_CONFIG_READ");

        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(NidxConfig::load(&path).unwrap_err().code(), "NIDX_CONFIG_PARSE");
    }
}
