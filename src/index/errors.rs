//! Names index errors
//!
//! Error codes:
//! - NIDX_INDEX_UNAVAILABLE: the index has not been started
//! - NIDX_INDEX_MATCHING: matching a label failed unexpectedly
//! - NIDX_INDEX_MISSING_CANONICAL: a name points at no canonical record
//! - NIDX_INDEX_DEPENDENTS: dependent match records could not be removed
//! - store and mirror errors keep their own codes

use thiserror::Error;

use crate::mirror::MirrorError;
use crate::model::NameKey;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("names index is not started")]
    Unavailable,

    #[error("failed to match {label}: {reason}")]
    Matching { label: String, reason: String },

    #[error("canonical name {canonical_id} of {label} does not exist")]
    MissingCanonical { label: String, canonical_id: NameKey },

    #[error("failed to remove dependent matches: {0}")]
    Dependents(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Mirror(#[from] MirrorError),
}

impl IndexError {
    pub fn matching(label: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::Matching {
            label: label.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            IndexError::Unavailable => "NIDX_INDEX_UNAVAILABLE",
            IndexError::Matching { .. } => "NIDX_INDEX_MATCHING",
            IndexError::MissingCanonical { .. } => "NIDX_INDEX_MISSING_CANONICAL",
            IndexError::Dependents(_) => "NIDX_INDEX_DEPENDENTS",
            IndexError::Store(e) => e.code(),
            IndexError::Mirror(e) => e.code(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        match self {
            IndexError::Unavailable
            | IndexError::Matching { .. }
            | IndexError::MissingCanonical { .. }
            | IndexError::Dependents(_) => false,
            IndexError::Store(e) => e.is_fatal(),
            IndexError::Mirror(e) => e.is_fatal(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, IndexError::Unavailable)
    }
}

/// Unavailable stores surface as an unavailable index.
impl From<StoreError> for IndexError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => IndexError::Unavailable,
            other => IndexError::Store(other),
        }
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
