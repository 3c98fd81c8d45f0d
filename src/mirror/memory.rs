use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::errors::{MirrorError, MirrorResult};
use super::NameMirror;
use crate::model::{IndexName, NameKey};

/// In-process mirror for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryMirror {
    names: Mutex<BTreeMap<NameKey, IndexName>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mirror pre-filled with the given names.
    pub fn with_names(names: impl IntoIterator<Item = IndexName>) -> Self {
        let map = names
            .into_iter()
            .filter_map(|n| n.key.map(|k| (k, n)))
            .collect();
        Self {
            names: Mutex::new(map),
        }
    }

    fn lock(&self) -> MirrorResult<MutexGuard<'_, BTreeMap<NameKey, IndexName>>> {
        self.names.lock().map_err(|_| MirrorError::LockPoisoned)
    }
}

impl NameMirror for MemoryMirror {
    fn count(&self) -> MirrorResult<usize> {
        Ok(self.lock()?.len())
    }

    fn load_all(&self) -> MirrorResult<Vec<IndexName>> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn create(&self, name: &IndexName) -> MirrorResult<()> {
        let key = name
            .key
            .ok_or_else(|| MirrorError::InvalidRecord(name.scientific_name.clone()))?;
        self.lock()?.insert(key, name.clone());
        Ok(())
    }

    fn delete(&self, keys: &[NameKey]) -> MirrorResult<()> {
        let mut names = self.lock()?;
        for key in keys {
            names.remove(key);
        }
        Ok(())
    }

    fn truncate(&self) -> MirrorResult<()> {
        self.lock()?.clear();
        Ok(())
    }
}
