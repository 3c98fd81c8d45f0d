//! In-process store backend.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::errors::{StoreError, StoreResult};
use super::groups::NameGroups;
use super::{check, NameIndexStore};
use crate::model::{IndexName, NameKey};

#[derive(Debug, Default)]
struct State {
    started: bool,
    created: Option<DateTime<Utc>>,
    groups: NameGroups,
}

/// Store backed by plain hash maps.
///
/// Content survives `stop()`/`start()` cycles of the same instance but not
/// the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        if !state.started {
            return Err(StoreError::Unavailable);
        }
        Ok(state)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        let state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if !state.started {
            return Err(StoreError::Unavailable);
        }
        Ok(state)
    }
}

impl NameIndexStore for MemoryStore {
    fn start(&self) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if state.created.is_none() {
            state.created = Some(Utc::now());
        }
        state.started = true;
        debug!(names = state.groups.len(), "memory store started");
        Ok(())
    }

    fn stop(&self) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        state.started = false;
        Ok(())
    }

    fn has_started(&self) -> bool {
        self.state.read().map(|s| s.started).unwrap_or(false)
    }

    fn created(&self) -> StoreResult<DateTime<Utc>> {
        self.read()?.created.ok_or(StoreError::Unavailable)
    }

    fn get(&self, key: NameKey) -> StoreResult<Option<IndexName>> {
        Ok(self.read()?.groups.get(key).cloned())
    }

    fn get_group(&self, normalized_key: &str) -> StoreResult<Vec<IndexName>> {
        Ok(self.read()?.groups.group(normalized_key))
    }

    fn contains_key(&self, normalized_key: &str) -> StoreResult<bool> {
        Ok(self.read()?.groups.contains_group(normalized_key))
    }

    fn by_canonical(&self, canonical_key: NameKey) -> StoreResult<Option<Vec<IndexName>>> {
        Ok(self.read()?.groups.variants(canonical_key))
    }

    fn add(&self, normalized_key: &str, name: IndexName) -> StoreResult<()> {
        check(&name)?;
        self.write()?.groups.put(normalized_key, name);
        Ok(())
    }

    fn delete(
        &self,
        key: NameKey,
        key_fn: &dyn Fn(&IndexName) -> String,
    ) -> StoreResult<Vec<IndexName>> {
        Ok(self.write()?.groups.remove(key, key_fn))
    }

    fn compact(&self) -> StoreResult<()> {
        self.write()?.groups.compact();
        Ok(())
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.read()?.groups.len())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut state = self.write()?;
        state.groups.clear();
        state.created = Some(Utc::now());
        Ok(())
    }

    fn all(&self) -> StoreResult<Vec<IndexName>> {
        Ok(self.read()?.groups.all())
    }

    fn max_key(&self) -> StoreResult<Option<NameKey>> {
        Ok(self.read()?.groups.max_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Name, Rank};

    fn name(key: NameKey, canonical_id: NameKey, label: &str) -> IndexName {
        let mut n = IndexName::from_name(&Name::new(label, Some(Rank::Species)));
        n.key = Some(key);
        n.canonical_id = Some(canonical_id);
        n
    }

    #[test]
    fn test_not_started_is_unavailable() {
        let store = MemoryStore::new();
        assert!(!store.has_started());
        assert!(matches!(store.get(1), Err(StoreError::Unavailable)));
        assert!(matches!(store.count(), Err(StoreError::Unavailable)));
    }

    #[test]
    fn test_add_and_get() {
        let store = MemoryStore::new();
        store.start().unwrap();
        store.add("abies alba", name(1, 1, "Abies alba")).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(1).unwrap().unwrap().scientific_name, "Abies alba");
        assert_eq!(store.get_group("abies alba").unwrap().len(), 1);
        assert!(store.contains_key("abies alba").unwrap());
        assert!(store.get_group("abies nordmanniana").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_record_leaves_store_untouched() {
        let store = MemoryStore::new();
        store.start().unwrap();
        let mut invalid = name(1, 1, "Abies alba");
        invalid.rank = None;
        assert!(store.add("abies alba", invalid).is_err());
        assert_eq!(store.count().unwrap(), 0);
        assert!(!store.contains_key("abies alba").unwrap());
    }

    #[test]
    fn test_stop_and_restart_keeps_content() {
        let store = MemoryStore::new();
        store.start().unwrap();
        store.add("abies alba", name(1, 1, "Abies alba")).unwrap();
        let created = store.created().unwrap();
        store.stop().unwrap();
        assert!(store.get(1).is_err());
        store.start().unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.created().unwrap(), created);
    }

    #[test]
    fn test_delete_canonical_cascades() {
        let store = MemoryStore::new();
        store.start().unwrap();
        store.add("abies alba", name(1, 1, "Abies alba")).unwrap();
        store.add("abies alba", name(2, 1, "Abies alba")).unwrap();
        assert_eq!(store.by_canonical(1).unwrap().unwrap().len(), 1);

        let removed = store
            .delete(1, &|n: &IndexName| n.scientific_name.to_lowercase())
            .unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.by_canonical(1).unwrap().is_none());
    }
}
