//! Mirror errors
//!
//! Error codes:
//! - NIDX_MIRROR_IO
//! - NIDX_MIRROR_CORRUPTION
//! - NIDX_MIRROR_SERIALIZATION
//! - NIDX_MIRROR_INVALID_RECORD
//! - NIDX_MIRROR_LOCK_POISONED

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("mirror I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt mirror file at byte offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },

    #[error("failed to serialize mirrored name: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cannot mirror a name without key: {0}")]
    InvalidRecord(String),

    #[error("mirror lock poisoned")]
    LockPoisoned,
}

impl MirrorError {
    pub fn code(&self) -> &'static str {
        match self {
            MirrorError::Io { .. } => "NIDX_MIRROR_IO",
            MirrorError::Corruption { .. } => "NIDX_MIRROR_CORRUPTION",
            MirrorError::Serialization(_) => "NIDX_MIRROR_SERIALIZATION",
            MirrorError::InvalidRecord(_) => "NIDX_MIRROR_INVALID_RECORD",
            MirrorError::LockPoisoned => "NIDX_MIRROR_LOCK_POISONED",
        }
    }

    /// The mirror is authoritative, a corrupt mirror cannot be repaired.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MirrorError::Io { .. } | MirrorError::Corruption { .. } | MirrorError::LockPoisoned
        )
    }
}

impl From<StorageError> for MirrorError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io { path, source } => MirrorError::Io { path, source },
            StorageError::Corruption { offset, reason } => MirrorError::Corruption { offset, reason },
        }
    }
}

pub type MirrorResult<T> = Result<T, MirrorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corruption_is_fatal() {
        let err: MirrorError = StorageError::corruption_at_offset(3, "checksum mismatch").into();
        assert_eq!(err.code(), "NIDX_MIRROR_CORRUPTION");
        assert!(err.is_fatal());
        assert!(!MirrorError::InvalidRecord("Abies".into()).is_fatal());
    }
}
