//! Names index store
//!
//! The store keeps every [`IndexName`] by key together with two grouping
//! indices: the candidate pool of a normalized name key and the variants of
//! a canonical name. Two interchangeable backends exist:
//!
//! - [`MemoryStore`]: in-process maps, lost on restart
//! - [`MappedStore`]: maps rebuilt from a memory-mapped journal on start
//!
//! Stores use interior locking and are shared as `Arc<dyn NameIndexStore>`.

mod errors;
mod groups;
mod journal;
mod mapped;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use groups::NameGroups;
pub use journal::{JournalOp, JOURNAL_FILE};
pub use mapped::MappedStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};

use crate::model::{IndexName, NameKey};

pub trait NameIndexStore: Send + Sync {
    /// Opens the store. A corrupt persistent journal is wiped, not reported.
    fn start(&self) -> StoreResult<()>;

    fn stop(&self) -> StoreResult<()>;

    fn has_started(&self) -> bool;

    /// Creation time of the store content.
    fn created(&self) -> StoreResult<DateTime<Utc>>;

    fn get(&self, key: NameKey) -> StoreResult<Option<IndexName>>;

    /// Candidate pool of a normalized key, empty if none.
    fn get_group(&self, normalized_key: &str) -> StoreResult<Vec<IndexName>>;

    fn contains_key(&self, normalized_key: &str) -> StoreResult<bool>;

    /// Distinct variants of a canonical name, `None` if none are registered.
    fn by_canonical(&self, canonical_key: NameKey) -> StoreResult<Option<Vec<IndexName>>>;

    /// Upserts a record into the key map and both grouping indices.
    ///
    /// Invalid records are rejected by [`check`] before any mutation.
    fn add(&self, normalized_key: &str, name: IndexName) -> StoreResult<()>;

    /// Deletes a record, cascading to all variants of a canonical record.
    ///
    /// `key_fn` derives the normalized key of a record. Returns the removed
    /// records.
    fn delete(
        &self,
        key: NameKey,
        key_fn: &dyn Fn(&IndexName) -> String,
    ) -> StoreResult<Vec<IndexName>>;

    /// De-duplicates group arrays. Idempotent.
    fn compact(&self) -> StoreResult<()>;

    fn count(&self) -> StoreResult<usize>;

    fn clear(&self) -> StoreResult<()>;

    /// Every record ordered by key.
    fn all(&self) -> StoreResult<Vec<IndexName>>;

    fn max_key(&self) -> StoreResult<Option<NameKey>>;
}

/// Rejects records missing any of key, canonical id, rank or scientific name.
pub fn check(name: &IndexName) -> StoreResult<()> {
    let label = || {
        if name.scientific_name.is_empty() {
            format!("#{}", name.key.map(|k| k.to_string()).unwrap_or_default())
        } else {
            name.scientific_name.clone()
        }
    };
    if name.key.is_none() {
        return Err(StoreError::invalid_record(label(), "key"));
    }
    if name.canonical_id.is_none() {
        return Err(StoreError::invalid_record(label(), "canonicalId"));
    }
    if name.rank.is_none() {
        return Err(StoreError::invalid_record(label(), "rank"));
    }
    if name.scientific_name.trim().is_empty() {
        return Err(StoreError::invalid_record(label(), "scientificName"));
    }
    Ok(())
}
