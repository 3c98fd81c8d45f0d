//! In-memory record source and match store.
//!
//! Cursors iterate over a snapshot taken when they are opened, so committing
//! while a cursor is open never blocks.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::errors::{MatchingError, MatchingResult};
use super::{
    DatasetKey, MatchBatch, MatchRecord, MatchStore, NameSource, RecordCursor, Scope, SectorKey,
    SourceRecord,
};
use crate::model::Name;

type RecordId = (DatasetKey, String);

#[derive(Debug, Clone)]
struct Usage {
    sector_key: Option<SectorKey>,
    name: Name,
}

#[derive(Debug, Default)]
struct State {
    usages: BTreeMap<RecordId, Usage>,
    archived_usages: BTreeMap<RecordId, Name>,
    matches: BTreeMap<RecordId, MatchRecord>,
    archived_matches: BTreeMap<RecordId, MatchRecord>,
    commits: usize,
    fail_commit: Option<usize>,
}

/// Records and matches held in memory, for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryMatchDb {
    state: RwLock<State>,
}

impl MemoryMatchDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_usage(&self, dataset_key: DatasetKey, sector_key: Option<SectorKey>, id: impl Into<String>, name: Name) {
        if let Ok(mut state) = self.state.write() {
            state
                .usages
                .insert((dataset_key, id.into()), Usage { sector_key, name });
        }
    }

    pub fn add_archived_usage(&self, dataset_key: DatasetKey, id: impl Into<String>, name: Name) {
        if let Ok(mut state) = self.state.write() {
            state.archived_usages.insert((dataset_key, id.into()), name);
        }
    }

    /// Makes the n-th commit from now on fail.
    pub fn fail_commit(&self, n: usize) {
        if let Ok(mut state) = self.state.write() {
            state.fail_commit = Some(state.commits + n);
        }
    }

    /// Number of successful commits.
    pub fn commits(&self) -> usize {
        self.state.read().map(|s| s.commits).unwrap_or(0)
    }

    pub fn match_of(&self, dataset_key: DatasetKey, id: &str) -> Option<MatchRecord> {
        let state = self.state.read().ok()?;
        state.matches.get(&(dataset_key, id.to_string())).cloned()
    }

    /// Committed matches of a dataset ordered by record id.
    pub fn matches(&self, dataset_key: DatasetKey) -> Vec<MatchRecord> {
        self.state
            .read()
            .map(|s| {
                s.matches
                    .values()
                    .filter(|m| m.dataset_key == dataset_key)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn archived_matches(&self) -> Vec<MatchRecord> {
        self.state
            .read()
            .map(|s| s.archived_matches.values().cloned().collect())
            .unwrap_or_default()
    }

    fn read(&self, scope: Scope) -> MatchingResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| MatchingError::source(scope, "match db lock poisoned"))
    }

    fn write(&self, scope: Scope) -> MatchingResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| MatchingError::persistence(scope, "match db lock poisoned"))
    }

    fn usages<F>(&self, scope: Scope, filter: F) -> MatchingResult<RecordCursor<'_>>
    where
        F: Fn(&RecordId, &Usage) -> bool,
    {
        let state = self.read(scope)?;
        let records: Vec<SourceRecord> = state
            .usages
            .iter()
            .filter(|(id, usage)| filter(id, usage))
            .map(|(id, usage)| SourceRecord {
                dataset_key: id.0,
                sector_key: usage.sector_key,
                id: id.1.clone(),
                name: usage.name.clone(),
                prior: state.matches.get(id).cloned(),
            })
            .collect();
        Ok(Box::new(records.into_iter().map(Ok)))
    }
}

impl NameSource for MemoryMatchDb {
    fn dataset(&self, dataset_key: DatasetKey) -> MatchingResult<RecordCursor<'_>> {
        self.usages(Scope::Dataset(dataset_key), |id, _| id.0 == dataset_key)
    }

    fn sector(&self, dataset_key: DatasetKey, sector_key: SectorKey) -> MatchingResult<RecordCursor<'_>> {
        let scope = Scope::Sector {
            dataset: dataset_key,
            sector: sector_key,
        };
        self.usages(scope, |id, usage| {
            id.0 == dataset_key && usage.sector_key == Some(sector_key)
        })
    }

    fn archive(&self) -> MatchingResult<RecordCursor<'_>> {
        let state = self.read(Scope::Archive)?;
        let records: Vec<SourceRecord> = state
            .archived_usages
            .iter()
            .map(|(id, name)| SourceRecord {
                dataset_key: id.0,
                sector_key: None,
                id: id.1.clone(),
                name: name.clone(),
                prior: state.archived_matches.get(id).cloned(),
            })
            .collect();
        Ok(Box::new(records.into_iter().map(Ok)))
    }

    fn datasets(&self) -> MatchingResult<Vec<DatasetKey>> {
        let state = self.read(Scope::Archive)?;
        let keys: BTreeSet<DatasetKey> = state.usages.keys().map(|id| id.0).collect();
        Ok(keys.into_iter().collect())
    }

    fn coverage(&self, dataset_key: DatasetKey) -> MatchingResult<f64> {
        let state = self.read(Scope::Dataset(dataset_key))?;
        let mut total = 0usize;
        let mut matched = 0usize;
        for id in state.usages.keys().filter(|id| id.0 == dataset_key) {
            total += 1;
            if state.matches.get(id).map_or(false, |m| m.index_id.is_some()) {
                matched += 1;
            }
        }
        if total == 0 {
            return Ok(1.0);
        }
        Ok(matched as f64 / total as f64)
    }
}

impl MatchStore for MemoryMatchDb {
    fn batch(&self, scope: Scope) -> MatchingResult<Box<dyn MatchBatch + '_>> {
        Ok(Box::new(MemoryBatch {
            db: self,
            scope,
            pending: Vec::new(),
        }))
    }

    fn truncate_archive(&self) -> MatchingResult<()> {
        self.write(Scope::Archive)?.archived_matches.clear();
        Ok(())
    }

    fn truncate_all(&self) -> MatchingResult<()> {
        let mut state = self.write(Scope::All)?;
        state.matches.clear();
        state.archived_matches.clear();
        Ok(())
    }
}

struct MemoryBatch<'a> {
    db: &'a MemoryMatchDb,
    scope: Scope,
    pending: Vec<MatchRecord>,
}

impl MatchBatch for MemoryBatch<'_> {
    fn create(&mut self, record: MatchRecord) -> MatchingResult<()> {
        self.pending.push(record);
        Ok(())
    }

    fn update(&mut self, record: MatchRecord) -> MatchingResult<()> {
        self.pending.push(record);
        Ok(())
    }

    fn commit(&mut self) -> MatchingResult<()> {
        let mut state = self.db.write(self.scope)?;
        if state.fail_commit == Some(state.commits + 1) {
            state.fail_commit = None;
            self.pending.clear();
            return Err(MatchingError::persistence(self.scope, "commit rejected"));
        }
        for record in self.pending.drain(..) {
            let id = (record.dataset_key, record.record_id.clone());
            if record.archived {
                state.archived_matches.insert(id, record);
            } else {
                state.matches.insert(id, record);
            }
        }
        state.commits += 1;
        Ok(())
    }
}
