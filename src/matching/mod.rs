//! Batch matching pipeline
//!
//! Streams name records of a dataset, a sector or the archive through the
//! names index and persists their matches.
//!
//! # Boundaries
//!
//! - [`NameSource`]: read cursors over records, each with its prior match
//! - [`MatchStore`]: opens [`MatchBatch`] write sessions, separate from the
//!   read cursor
//!
//! # Commits
//!
//! A batch is committed every `batch_size` processed records and once at the
//! end of the stream. A failure aborts the run but earlier commits remain.

mod dataset;
mod errors;
mod memory;

pub use dataset::{DatasetMatcher, MatchCounts, MatchSettings};
pub use errors::{MatchingError, MatchingResult};
pub use memory::MemoryMatchDb;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{MatchType, Name, NameKey};

pub type DatasetKey = i32;
pub type SectorKey = i32;

/// Part of the data a pipeline run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Dataset(DatasetKey),
    Sector { dataset: DatasetKey, sector: SectorKey },
    Archive,
    /// Every dataset and the archive
    All,
}

impl Scope {
    pub fn is_archive(&self) -> bool {
        matches!(self, Scope::Archive)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Dataset(key) => write!(f, "dataset {}", key),
            Scope::Sector { dataset, sector } => write!(f, "sector {} of dataset {}", sector, dataset),
            Scope::Archive => write!(f, "archive"),
            Scope::All => write!(f, "all datasets"),
        }
    }
}

/// Persisted match of a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub dataset_key: DatasetKey,
    pub record_id: String,
    pub index_id: Option<NameKey>,
    #[serde(rename = "type")]
    pub match_type: MatchType,
    #[serde(default)]
    pub archived: bool,
}

/// A record to match together with its prior match, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub dataset_key: DatasetKey,
    pub sector_key: Option<SectorKey>,
    pub id: String,
    pub name: Name,
    pub prior: Option<MatchRecord>,
}

pub type RecordCursor<'a> = Box<dyn Iterator<Item = MatchingResult<SourceRecord>> + 'a>;

pub trait NameSource: Send + Sync {
    fn dataset(&self, dataset_key: DatasetKey) -> MatchingResult<RecordCursor<'_>>;

    fn sector(&self, dataset_key: DatasetKey, sector_key: SectorKey) -> MatchingResult<RecordCursor<'_>>;

    /// Records of all archived name usages.
    fn archive(&self) -> MatchingResult<RecordCursor<'_>>;

    /// Keys of all datasets with records, ascending.
    fn datasets(&self) -> MatchingResult<Vec<DatasetKey>>;

    /// Share of the dataset records matched to an index name, within [0, 1].
    fn coverage(&self, dataset_key: DatasetKey) -> MatchingResult<f64>;
}

pub trait MatchStore: Send + Sync {
    /// Opens a write session for the given scope.
    fn batch(&self, scope: Scope) -> MatchingResult<Box<dyn MatchBatch + '_>>;

    /// Removes all archived matches.
    fn truncate_archive(&self) -> MatchingResult<()>;

    /// Removes every match, archived or not.
    fn truncate_all(&self) -> MatchingResult<()>;
}

/// Write session, nothing is visible before [`MatchBatch::commit`].
pub trait MatchBatch {
    fn create(&mut self, record: MatchRecord) -> MatchingResult<()>;

    fn update(&mut self, record: MatchRecord) -> MatchingResult<()>;

    fn commit(&mut self) -> MatchingResult<()>;
}
