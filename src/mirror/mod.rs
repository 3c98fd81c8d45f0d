//! Durable mirror of the names index
//!
//! The mirror holds every [`IndexName`] ever inserted and is authoritative:
//! on start the index reloads itself from the mirror whenever the local store
//! is empty or disagrees in size.

mod errors;
mod file;
mod memory;

pub use errors::{MirrorError, MirrorResult};
pub use file::FileMirror;
pub use memory::MemoryMirror;

use crate::model::{IndexName, NameKey};

pub trait NameMirror: Send + Sync {
    fn count(&self) -> MirrorResult<usize>;

    /// All names ordered by key.
    fn load_all(&self) -> MirrorResult<Vec<IndexName>>;

    fn create(&self, name: &IndexName) -> MirrorResult<()>;

    fn delete(&self, keys: &[NameKey]) -> MirrorResult<()>;

    /// Removes every name.
    fn truncate(&self) -> MirrorResult<()>;
}
