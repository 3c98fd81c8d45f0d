//! Persistent store backend.
//!
//! All maps live in memory and are rebuilt on `start()` by replaying the
//! memory-mapped journal `nidx.dat` of the index directory. Every mutation
//! is appended to the journal before it is applied to the maps.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::errors::{StoreError, StoreResult};
use super::groups::NameGroups;
use super::journal::{JournalOp, JOURNAL_FILE};
use super::{check, NameIndexStore};
use crate::model::{IndexName, NameKey};
use crate::storage::{map_file, Record, RecordReader, RecordWriter};

#[derive(Default)]
struct State {
    writer: Option<RecordWriter>,
    created: Option<DateTime<Utc>>,
    groups: NameGroups,
}

impl State {
    fn writer(&mut self) -> StoreResult<&mut RecordWriter> {
        self.writer.as_mut().ok_or(StoreError::Unavailable)
    }

    fn append(&mut self, op: &JournalOp) -> StoreResult<()> {
        let record = op.to_record()?;
        self.writer()?.append(&record)?;
        Ok(())
    }
}

pub struct MappedStore {
    dir: PathBuf,
    sync_writes: bool,
    state: RwLock<State>,
}

impl MappedStore {
    /// Creates a store persisting into the given directory.
    ///
    /// Nothing is read or written before [`NameIndexStore::start`].
    pub fn new(dir: impl Into<PathBuf>, sync_writes: bool) -> Self {
        Self {
            dir: dir.into(),
            sync_writes,
            state: RwLock::new(State::default()),
        }
    }

    pub fn journal_path(&self) -> PathBuf {
        self.dir.join(JOURNAL_FILE)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        if state.writer.is_none() {
            return Err(StoreError::Unavailable);
        }
        Ok(state)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        let state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if state.writer.is_none() {
            return Err(StoreError::Unavailable);
        }
        Ok(state)
    }
}

/// Rebuilds the maps from the journal.
fn replay(path: &Path) -> StoreResult<(NameGroups, Option<DateTime<Utc>>)> {
    let mut groups = NameGroups::new();
    let mut created = None;
    let Some(mmap) = map_file(path)? else {
        return Ok((groups, created));
    };

    let mut reader = RecordReader::new(&mmap);
    loop {
        let offset = reader.current_offset();
        let Some(record) = reader.read_next()? else {
            break;
        };
        match JournalOp::from_record(&record, offset)? {
            JournalOp::Created(ts) => created = Some(ts),
            JournalOp::Put {
                normalized_key,
                name,
            } => {
                check(&name).map_err(|e| StoreError::corruption(offset, e.to_string()))?;
                groups.put(&normalized_key, name);
            }
            JournalOp::Delete {
                key,
                normalized_key,
            } => {
                groups.remove_one(key, &normalized_key);
            }
            JournalOp::Clear => {
                groups.clear();
                created = None;
            }
        }
    }
    Ok((groups, created))
}

fn remove_journal(path: &Path) -> StoreResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

impl NameIndexStore for MappedStore {
    fn start(&self) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if state.writer.is_some() {
            return Ok(());
        }

        let path = self.journal_path();
        let (groups, created) = match replay(&path) {
            Ok(replayed) => replayed,
            Err(e) if e.is_corruption() => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "names index store is corrupt, wiping it"
                );
                remove_journal(&path)?;
                (NameGroups::new(), None)
            }
            Err(e) => return Err(e),
        };

        state.groups = groups;
        state.created = created;
        state.writer = Some(RecordWriter::open(&path, self.sync_writes)?);
        if state.created.is_none() {
            let now = Utc::now();
            state.append(&JournalOp::Created(now))?;
            state.created = Some(now);
        }
        info!(
            path = %path.display(),
            names = state.groups.len(),
            "names index store started"
        );
        Ok(())
    }

    fn stop(&self) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(mut writer) = state.writer.take() {
            writer.sync()?;
            state.groups = NameGroups::new();
            debug!(path = %writer.path().display(), "names index store stopped");
        }
        Ok(())
    }

    fn has_started(&self) -> bool {
        self.state
            .read()
            .map(|s| s.writer.is_some())
            .unwrap_or(false)
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
        let mut state = self.write()?;
        state.append(&JournalOp::Put {
            normalized_key: normalized_key.to_string(),
            name: name.clone(),
        })?;
        state.groups.put(normalized_key, name);
        Ok(())
    }

    fn delete(
        &self,
        key: NameKey,
        key_fn: &dyn Fn(&IndexName) -> String,
    ) -> StoreResult<Vec<IndexName>> {
        let mut state = self.write()?;
        for name in state.groups.cascade(key) {
            if let Some(key) = name.key {
                state.append(&JournalOp::Delete {
                    key,
                    normalized_key: key_fn(&name),
                })?;
            }
        }
        Ok(state.groups.remove(key, key_fn))
    }

    /// De-duplicates the maps and rewrites the journal as a snapshot.
    fn compact(&self) -> StoreResult<()> {
        let mut state = self.write()?;
        state.groups.compact();

        let mut records: Vec<Record> = Vec::with_capacity(state.groups.len() + 1);
        if let Some(created) = state.created {
            records.push(JournalOp::Created(created).to_record()?);
        }
        for (normalized_key, name) in state.groups.entries() {
            records.push(
                JournalOp::Put {
                    normalized_key,
                    name,
                }
                .to_record()?,
            );
        }
        let before = state.writer()?.current_offset();
        state.writer()?.rewrite(records)?;
        let after = state.writer()?.current_offset();
        debug!(
            names = state.groups.len(),
            bytes_before = before,
            bytes_after = after,
            "names index store compacted"
        );
        Ok(())
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.read()?.groups.len())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut state = self.write()?;
        let now = Utc::now();
        state.writer()?.truncate()?;
        state.append(&JournalOp::Created(now))?;
        state.groups.clear();
        state.created = Some(now);
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
    use std::io::Write;
    use tempfile::TempDir;

    fn name(key: NameKey, canonical_id: NameKey, label: &str) -> IndexName {
        let mut n = IndexName::from_name(&Name::new(label, Some(Rank::Species)));
        n.key = Some(key);
        n.canonical_id = Some(canonical_id);
        n
    }

    fn key_fn(n: &IndexName) -> String {
        n.scientific_name.to_lowercase()
    }

    #[test]
    fn test_not_started_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let store = MappedStore::new(temp_dir.path(), false);
        assert!(!store.has_started());
        assert!(matches!(store.count(), Err(StoreError::Unavailable)));
        assert!(!store.journal_path().exists());
    }

    #[test]
    fn test_content_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let created;
        {
            let store = MappedStore::new(temp_dir.path(), false);
            store.start().unwrap();
            store.add("abies alba", name(1, 1, "Abies alba")).unwrap();
            store.add("abies alba", name(2, 1, "Abies alba")).unwrap();
            created = store.created().unwrap();
            store.stop().unwrap();
        }

        let store = MappedStore::new(temp_dir.path(), false);
        store.start().unwrap();
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.get_group("abies alba").unwrap().len(), 2);
        assert_eq!(store.by_canonical(1).unwrap().unwrap().len(), 1);
        assert_eq!(store.created().unwrap(), created);
        assert_eq!(store.max_key().unwrap(), Some(2));
    }

    #[test]
    fn test_deletes_are_replayed() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = MappedStore::new(temp_dir.path(), true);
            store.start().unwrap();
            store.add("abies alba", name(1, 1, "Abies alba")).unwrap();
            store.add("abies alba", name(2, 1, "Abies alba")).unwrap();
            store.add("picea abies", name(3, 3, "Picea abies")).unwrap();
            assert_eq!(store.delete(1, &key_fn).unwrap().len(), 2);
            store.stop().unwrap();
        }

        let store = MappedStore::new(temp_dir.path(), false);
        store.start().unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(!store.contains_key("abies alba").unwrap());
        assert!(store.by_canonical(1).unwrap().is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_delete_append_keeps_maps() {
        let temp_dir = TempDir::new().unwrap();
        let store = MappedStore::new(temp_dir.path(), false);
        store.start().unwrap();
        store.add("abies alba", name(1, 1, "Abies alba")).unwrap();
        store.add("abies alba", name(2, 1, "Abies alba")).unwrap();

        // every write to /dev/full fails with ENOSPC
        store.state.write().unwrap().writer =
            Some(RecordWriter::open(Path::new("/dev/full"), false).unwrap());
        assert!(store.delete(1, &key_fn).is_err());
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.get_group("abies alba").unwrap().len(), 2);
        assert_eq!(store.by_canonical(1).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_journal_is_wiped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(JOURNAL_FILE);
        {
            let store = MappedStore::new(temp_dir.path(), false);
            store.start().unwrap();
            store.add("abies alba", name(1, 1, "Abies alba")).unwrap();
            store.stop().unwrap();
        }
        {
            let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[0xde, 0xad, 0xbe, 0xef, 0x01]).unwrap();
        }

        let store = MappedStore::new(temp_dir.path(), false);
        store.start().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        store.add("picea abies", name(7, 7, "Picea abies")).unwrap();
        store.stop().unwrap();

        store.start().unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_compact_rewrites_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = MappedStore::new(temp_dir.path(), false);
        store.start().unwrap();
        for _ in 0..5 {
            store.add("abies alba", name(1, 1, "Abies alba")).unwrap();
        }
        store.add("abies alba", name(2, 1, "Abies alba")).unwrap();
        let size_before = fs::metadata(store.journal_path()).unwrap().len();

        store.compact().unwrap();
        let size_after = fs::metadata(store.journal_path()).unwrap().len();
        assert!(size_after < size_before);
        let all = store.all().unwrap();

        store.compact().unwrap();
        assert_eq!(store.all().unwrap(), all);
        assert_eq!(fs::metadata(store.journal_path()).unwrap().len(), size_after);

        store.stop().unwrap();
        store.start().unwrap();
        assert_eq!(store.all().unwrap(), all);
    }

    #[test]
    fn test_clear_persists() {
        let temp_dir = TempDir::new().unwrap();
        let store = MappedStore::new(temp_dir.path(), false);
        store.start().unwrap();
        store.add("abies alba", name(1, 1, "Abies alba")).unwrap();
        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        store.stop().unwrap();
        store.start().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.created().is_ok());
    }

    #[test]
    fn test_invalid_record_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = MappedStore::new(temp_dir.path(), false);
        store.start().unwrap();
        let mut invalid = name(1, 1, "Abies alba");
        invalid.canonical_id = None;
        assert!(matches!(
            store.add("abies alba", invalid),
            Err(StoreError::InvalidRecord { .. })
        ));
        store.stop().unwrap();
        store.start().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }
}
