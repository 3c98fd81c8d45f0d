//! Names index store errors
//!
//! Error codes:
//! - NIDX_STORE_UNAVAILABLE: the store has not been started or was stopped
//! - NIDX_STORE_INVALID_RECORD: a record misses a mandatory property
//! - NIDX_STORE_IO: reading or writing the persistent journal failed
//! - NIDX_STORE_CORRUPTION: the persistent journal is corrupt
//! - NIDX_STORE_SERIALIZATION: a record could not be (de)serialized
//! - NIDX_STORE_LOCK_POISONED: a writer panicked while holding the store lock

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("names index store is not started")]
    Unavailable,

    #[error("invalid index name {label}: missing {field}")]
    InvalidRecord { label: String, field: &'static str },

    #[error("store I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt store journal at byte offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },

    #[error("failed to serialize index name: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn invalid_record(label: impl Into<String>, field: &'static str) -> Self {
        StoreError::InvalidRecord {
            label: label.into(),
            field,
        }
    }

    pub fn corruption(offset: u64, reason: impl Into<String>) -> Self {
        StoreError::Corruption {
            offset,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unavailable => "NIDX_STORE_UNAVAILABLE",
            StoreError::InvalidRecord { .. } => "NIDX_STORE_INVALID_RECORD",
            StoreError::Io { .. } => "NIDX_STORE_IO",
            StoreError::Corruption { .. } => "NIDX_STORE_CORRUPTION",
            StoreError::Serialization(_) => "NIDX_STORE_SERIALIZATION",
            StoreError::LockPoisoned => "NIDX_STORE_LOCK_POISONED",
        }
    }

    /// Fatal errors leave the store in an unknown state.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Io { .. } | StoreError::LockPoisoned)
    }

    /// True for errors that a wipe and reload of the store can repair.
    pub fn is_corruption(&self) -> bool {
        matches!(self, StoreError::Corruption { .. })
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io { path, source } => StoreError::Io { path, source },
            StorageError::Corruption { offset, reason } => StoreError::Corruption { offset, reason },
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StoreError::Unavailable.code(), "NIDX_STORE_UNAVAILABLE");
        assert_eq!(
            StoreError::invalid_record("Abies", "key").code(),
            "NIDX_STORE_INVALID_RECORD"
        );
        assert_eq!(StoreError::corruption(0, "bad").code(), "NIDX_STORE_CORRUPTION");
        assert_eq!(StoreError::LockPoisoned.code(), "NIDX_STORE_LOCK_POISONED");
    }

    #[test]
    fn test_storage_errors_convert() {
        let err: StoreError = StorageError::corruption_at_offset(12, "checksum mismatch").into();
        assert!(err.is_corruption());
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("12"));

        let err: StoreError =
            StorageError::io("nidx.dat", io::Error::new(io::ErrorKind::Other, "disk full")).into();
        assert_eq!(err.code(), "NIDX_STORE_IO");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_invalid_record_message() {
        let err = StoreError::invalid_record("Larus fuscus", "canonicalId");
        assert_eq!(err.to_string(), "invalid index name Larus fuscus: missing canonicalId");
    }
}
