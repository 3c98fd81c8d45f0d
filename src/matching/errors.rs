//! Batch matching errors
//!
//! Error codes:
//! - NIDX_MATCHING_INDEX: the names index failed
//! - NIDX_MATCHING_SOURCE: reading records failed
//! - NIDX_MATCHING_PERSISTENCE: writing matches failed
//! - NIDX_MATCHING_WORKER: a worker thread panicked
//!
//! Every error carries the scope of the failed run. Batches committed before
//! the failure stay committed.

use thiserror::Error;

use super::Scope;
use crate::index::IndexError;

#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("matching {scope} failed: {source}")]
    Index {
        scope: Scope,
        #[source]
        source: IndexError,
    },

    #[error("failed to read records of {scope}: {reason}")]
    Source { scope: Scope, reason: String },

    #[error("failed to persist matches of {scope}: {reason}")]
    Persistence { scope: Scope, reason: String },

    #[error("matching worker for {scope} panicked")]
    Worker { scope: Scope },
}

impl MatchingError {
    pub fn index(scope: Scope, source: IndexError) -> Self {
        MatchingError::Index { scope, source }
    }

    pub fn source(scope: Scope, reason: impl Into<String>) -> Self {
        MatchingError::Source {
            scope,
            reason: reason.into(),
        }
    }

    pub fn persistence(scope: Scope, reason: impl Into<String>) -> Self {
        MatchingError::Persistence {
            scope,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MatchingError::Index { .. } => "NIDX_MATCHING_INDEX",
            MatchingError::Source { .. } => "NIDX_MATCHING_SOURCE",
            MatchingError::Persistence { .. } => "NIDX_MATCHING_PERSISTENCE",
            MatchingError::Worker { .. } => "NIDX_MATCHING_WORKER",
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            MatchingError::Index { scope, .. }
            | MatchingError::Source { scope, .. }
            | MatchingError::Persistence { scope, .. }
            | MatchingError::Worker { scope } => *scope,
        }
    }

    /// Only index failures can affect other scopes.
    pub fn is_fatal(&self) -> bool {
        match self {
            MatchingError::Index { source, .. } => source.is_fatal() || source.is_unavailable(),
            _ => false,
        }
    }
}

pub type MatchingResult<T> = Result<T, MatchingError>;
