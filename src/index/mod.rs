//! Names index
//!
//! Resolves parsed names to stable index identities.
//!
//! # Matching
//!
//! A query is normalized into a coarse lookup key ignoring authorship. All
//! names sharing that key form the candidate pool which is scored by
//! [`match_candidates`]. With inserts allowed, unresolved names are added
//! under a single write lock.
//!
//! # Lifecycle
//!
//! - `start()` opens the store and reloads it from the mirror if it is empty
//!   or differs in size
//! - every other call fails with [`IndexError::Unavailable`] until started

mod errors;
mod factory;
mod matcher;
mod name_index;

pub use errors::{IndexError, IndexResult};
pub use factory::{from_config, memory_index, persistent_index};
pub use matcher::match_candidates;
pub use name_index::{is_insertable, needs_insert, record_key, NameIndexImpl};

use chrono::{DateTime, Utc};

use crate::model::{IndexName, Name, NameKey, NameMatch};

pub trait NameIndex: Send + Sync {
    fn start(&self) -> IndexResult<()>;

    fn stop(&self) -> IndexResult<()>;

    fn has_started(&self) -> bool;

    /// Creation time of the index content.
    fn created(&self) -> IndexResult<DateTime<Utc>>;

    /// Matches a name, inserting it when unresolved and `allow_inserts` is set.
    ///
    /// `verbose` populates the alternatives of the result.
    fn match_name(&self, name: &Name, allow_inserts: bool, verbose: bool) -> IndexResult<NameMatch>;

    fn get(&self, key: NameKey) -> IndexResult<Option<IndexName>>;

    /// Variants sharing the given canonical record.
    fn by_canonical(&self, canonical_key: NameKey) -> IndexResult<Option<Vec<IndexName>>>;

    /// Adds a name, assigning a key unless it already has one.
    fn add(&self, name: IndexName) -> IndexResult<IndexName>;

    /// Deletes a name and, for canonical names, all of its variants.
    fn delete(&self, key: NameKey) -> IndexResult<Vec<IndexName>>;

    fn size(&self) -> IndexResult<usize>;

    /// Every name ordered by key.
    fn all(&self) -> IndexResult<Vec<IndexName>>;

    /// Removes every name from the index and the mirror, together with the
    /// match records depending on them.
    fn reset(&self) -> IndexResult<()>;

    fn compact(&self) -> IndexResult<()>;

    /// Reloads the store from the mirror, returning the number of names.
    fn rebuild(&self) -> IndexResult<usize>;
}
