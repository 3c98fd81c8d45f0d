//! Mirror persisted as a checksummed append-only file.
//!
//! Ops:
//!
//! - CREATE: IndexName JSON
//! - DELETE: keys as consecutive u32 LE
//! - TRUNCATE: empty
//!
//! Unlike the store journal a corrupt mirror file is never wiped, opening it
//! fails instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use super::errors::{MirrorError, MirrorResult};
use super::NameMirror;
use crate::model::{IndexName, NameKey};
use crate::storage::{map_file, Record, RecordReader, RecordWriter};

const OP_CREATE: u8 = 1;
const OP_DELETE: u8 = 2;
const OP_TRUNCATE: u8 = 3;

struct State {
    writer: RecordWriter,
    names: BTreeMap<NameKey, IndexName>,
}

pub struct FileMirror {
    path: PathBuf,
    state: Mutex<State>,
}

impl FileMirror {
    /// Opens or creates the mirror file, loading all names.
    pub fn open(path: impl AsRef<Path>, sync_writes: bool) -> MirrorResult<Self> {
        let path = path.as_ref().to_path_buf();
        let names = load(&path)?;
        let writer = RecordWriter::open(&path, sync_writes)?;
        info!(path = %path.display(), names = names.len(), "mirror opened");
        Ok(Self {
            path,
            state: Mutex::new(State { writer, names }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrites the file with one CREATE per live name.
    pub fn compact(&self) -> MirrorResult<()> {
        let mut state = self.lock()?;
        let records = state
            .names
            .values()
            .map(|n| -> MirrorResult<Record> { Ok(Record::new(OP_CREATE, serde_json::to_vec(n)?)) })
            .collect::<MirrorResult<Vec<_>>>()?;
        state.writer.rewrite(records)?;
        debug!(path = %self.path.display(), names = state.names.len(), "mirror compacted");
        Ok(())
    }

    /// Flushes pending writes to disk.
    pub fn sync(&self) -> MirrorResult<()> {
        self.lock()?.writer.sync()?;
        Ok(())
    }

    fn lock(&self) -> MirrorResult<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| MirrorError::LockPoisoned)
    }
}

fn load(path: &Path) -> MirrorResult<BTreeMap<NameKey, IndexName>> {
    let mut names = BTreeMap::new();
    let Some(mmap) = map_file(path)? else {
        return Ok(names);
    };
    let mut reader = RecordReader::new(&mmap);
    loop {
        let offset = reader.current_offset();
        let Some(record) = reader.read_next()? else {
            break;
        };
        match record.op {
            OP_CREATE => {
                let name: IndexName =
                    serde_json::from_slice(&record.payload).map_err(|e| MirrorError::Corruption {
                        offset,
                        reason: format!("invalid index name: {}", e),
                    })?;
                if let Some(key) = name.key {
                    names.insert(key, name);
                }
            }
            OP_DELETE => {
                if record.payload.len() % 4 != 0 {
                    return Err(MirrorError::Corruption {
                        offset,
                        reason: "invalid delete payload".to_string(),
                    });
                }
                for chunk in record.payload.chunks_exact(4) {
                    names.remove(&NameKey::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
                }
            }
            OP_TRUNCATE => names.clear(),
            op => {
                return Err(MirrorError::Corruption {
                    offset,
                    reason: format!("unknown mirror op {}", op),
                })
            }
        }
    }
    Ok(names)
}

impl NameMirror for FileMirror {
    fn count(&self) -> MirrorResult<usize> {
        Ok(self.lock()?.names.len())
    }

    fn load_all(&self) -> MirrorResult<Vec<IndexName>> {
        Ok(self.lock()?.names.values().cloned().collect())
    }

    fn create(&self, name: &IndexName) -> MirrorResult<()> {
        let key = name
            .key
            .ok_or_else(|| MirrorError::InvalidRecord(name.scientific_name.clone()))?;
        let record = Record::new(OP_CREATE, serde_json::to_vec(name)?);
        let mut state = self.lock()?;
        state.writer.append(&record)?;
        state.names.insert(key, name.clone());
        Ok(())
    }

    fn delete(&self, keys: &[NameKey]) -> MirrorResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let payload = keys.iter().flat_map(|k| k.to_le_bytes()).collect();
        let mut state = self.lock()?;
        state.writer.append(&Record::new(OP_DELETE, payload))?;
        for key in keys {
            state.names.remove(key);
        }
        Ok(())
    }

    fn truncate(&self) -> MirrorResult<()> {
        let mut state = self.lock()?;
        state.writer.truncate()?;
        state.names.clear();
        info!(path = %self.path.display(), "mirror truncated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Name, Rank};
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn name(key: NameKey, label: &str) -> IndexName {
        let mut n = IndexName::from_name(&Name::new(label, Some(Rank::Genus)));
        n.key = Some(key);
        n.canonical_id = Some(key);
        n
    }

    #[test]
    fn test_names_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mirror.dat");
        {
            let mirror = FileMirror::open(&path, false).unwrap();
            mirror.create(&name(2, "Larix")).unwrap();
            mirror.create(&name(1, "Abies")).unwrap();
            mirror.create(&name(3, "Picea")).unwrap();
            mirror.delete(&[3]).unwrap();
        }

        let mirror = FileMirror::open(&path, false).unwrap();
        let names = mirror.load_all().unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].scientific_name, "Abies");
        assert_eq!(names[1].scientific_name, "Larix");
    }

    #[test]
    fn test_truncate_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mirror.dat");
        {
            let mirror = FileMirror::open(&path, false).unwrap();
            mirror.create(&name(1, "Abies")).unwrap();
            mirror.truncate().unwrap();
            mirror.create(&name(5, "Pinus")).unwrap();
        }
        let mirror = FileMirror::open(&path, false).unwrap();
        assert_eq!(mirror.count().unwrap(), 1);
    }

    #[test]
    fn test_corrupt_file_fails_to_open() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mirror.dat");
        {
            let mirror = FileMirror::open(&path, false).unwrap();
            mirror.create(&name(1, "Abies")).unwrap();
        }
        {
            let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[1, 2, 3]).unwrap();
        }
        match FileMirror::open(&path, false) {
            Err(MirrorError::Corruption { .. }) => {}
            other => panic!("expected corruption, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_compact_keeps_names() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mirror.dat");
        let mirror = FileMirror::open(&path, false).unwrap();
        for key in 1..=10 {
            mirror.create(&name(key, "Abies")).unwrap();
        }
        mirror.delete(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let before = fs::metadata(&path).unwrap().len();
        mirror.compact().unwrap();
        assert!(fs::metadata(&path).unwrap().len() < before);
        drop(mirror);

        let mirror = FileMirror::open(&path, false).unwrap();
        assert_eq!(mirror.count().unwrap(), 2);
    }
}
