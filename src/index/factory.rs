//! Names index construction
//!
//! The store backend is chosen here and injected, the index itself never
//! knows which backend it runs on.

use std::path::PathBuf;
use std::sync::Arc;

use super::errors::IndexResult;
use super::name_index::NameIndexImpl;
use crate::authorship::{AuthorComparator, BasicAuthorComparator};
use crate::config::NidxConfig;
use crate::mirror::{FileMirror, MemoryMirror, NameMirror};
use crate::store::{MappedStore, MemoryStore, NameIndexStore};

/// Unstarted index over an in-memory store.
pub fn memory_index(mirror: Arc<dyn NameMirror>, comparator: Arc<dyn AuthorComparator>) -> NameIndexImpl {
    NameIndexImpl::new(Arc::new(MemoryStore::new()), mirror, comparator)
}

/// Unstarted index over a journal in `dir`.
pub fn persistent_index(
    dir: impl Into<PathBuf>,
    sync_writes: bool,
    mirror: Arc<dyn NameMirror>,
    comparator: Arc<dyn AuthorComparator>,
) -> NameIndexImpl {
    NameIndexImpl::new(Arc::new(MappedStore::new(dir, sync_writes)), mirror, comparator)
}

/// Unstarted index as described by the configuration, with the default comparator.
pub fn from_config(config: &NidxConfig) -> IndexResult<NameIndexImpl> {
    let mirror: Arc<dyn NameMirror> = match &config.mirror_file {
        Some(path) => Arc::new(FileMirror::open(path, config.sync_writes)?),
        None => Arc::new(MemoryMirror::new()),
    };
    let store: Arc<dyn NameIndexStore> = match &config.index_dir {
        Some(dir) => Arc::new(MappedStore::new(dir.clone(), config.sync_writes)),
        None => Arc::new(MemoryStore::new()),
    };
    Ok(NameIndexImpl::new(store, mirror, Arc::new(BasicAuthorComparator::new())))
}
