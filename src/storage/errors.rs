//! Journal error types
//!
//! Error codes:
//! - NIDX_STORAGE_IO: reading or writing a journal file failed
//! - NIDX_STORAGE_CORRUPTION: framing or checksum failure while reading

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt record at byte offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        StorageError::Corruption {
            offset,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Io { .. } => "NIDX_STORAGE_IO",
            StorageError::Corruption { .. } => "NIDX_STORAGE_CORRUPTION",
        }
    }

    pub fn is_corruption(&self) -> bool {
        matches!(self, StorageError::Corruption { .. })
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = StorageError::corruption_at_offset(1024, "checksum mismatch");
        assert_eq!(err.code(), "NIDX_STORAGE_CORRUPTION");
        assert!(err.is_corruption());
        let display = err.to_string();
        assert!(display.contains("1024"));
        assert!(display.contains("checksum mismatch"));

        let err = StorageError::io("nidx.dat", io::Error::new(io::ErrorKind::Other, "disk full"));
        assert_eq!(err.code(), "NIDX_STORAGE_IO");
        assert!(!err.is_corruption());
    }
}
