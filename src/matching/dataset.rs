//! Dataset, sector and archive matching runs.

use std::collections::VecDeque;
use std::ops::AddAssign;
use std::sync::Mutex;
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{MatchingError, MatchingResult};
use super::{DatasetKey, MatchRecord, MatchStore, NameSource, RecordCursor, Scope, SectorKey};
use crate::config::NidxConfig;
use crate::index::{IndexError, NameIndex};
use crate::model::MatchType;

/// Counters of a matching run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounts {
    /// Records processed
    pub total: usize,
    /// Matches created or changed
    pub updated: usize,
    /// Records without any match
    pub nomatch: usize,
}

impl AddAssign for MatchCounts {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.updated += other.updated;
        self.nomatch += other.nomatch;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSettings {
    pub batch_size: usize,
    pub allow_inserts: bool,
    pub missing_threshold: f64,
    pub threads: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self::from(&NidxConfig::default())
    }
}

impl From<&NidxConfig> for MatchSettings {
    fn from(config: &NidxConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            allow_inserts: config.allow_inserts,
            missing_threshold: config.missing_threshold,
            threads: config.threads,
        }
    }
}

/// Matches records of a [`NameSource`] against the names index and writes
/// changed matches to a [`MatchStore`].
///
/// A matcher holds no mutable state and can be shared by worker threads.
pub struct DatasetMatcher<'a> {
    index: &'a dyn NameIndex,
    source: &'a dyn NameSource,
    store: &'a dyn MatchStore,
    settings: MatchSettings,
}

impl<'a> DatasetMatcher<'a> {
    pub fn new(
        index: &'a dyn NameIndex,
        source: &'a dyn NameSource,
        store: &'a dyn MatchStore,
        settings: MatchSettings,
    ) -> Self {
        Self {
            index,
            source,
            store,
            settings,
        }
    }

    pub fn match_dataset(&self, dataset_key: DatasetKey) -> MatchingResult<MatchCounts> {
        let scope = Scope::Dataset(dataset_key);
        self.ensure_online(scope)?;
        self.run(scope, self.source.dataset(dataset_key)?)
    }

    pub fn match_sector(&self, dataset_key: DatasetKey, sector_key: SectorKey) -> MatchingResult<MatchCounts> {
        let scope = Scope::Sector {
            dataset: dataset_key,
            sector: sector_key,
        };
        self.ensure_online(scope)?;
        self.run(scope, self.source.sector(dataset_key, sector_key)?)
    }

    /// Drops all archived matches and matches the whole archive again.
    pub fn rebuild_archive(&self) -> MatchingResult<MatchCounts> {
        let scope = Scope::Archive;
        self.ensure_online(scope)?;
        self.store.truncate_archive()?;
        info!("archived matches truncated");
        self.run(scope, self.source.archive()?)
    }

    /// Rematches datasets on up to `threads` workers sharing the index.
    ///
    /// Results are returned in the order of `dataset_keys`. A failing dataset
    /// does not stop the others.
    pub fn rematch_datasets(
        &self,
        dataset_keys: &[DatasetKey],
        threads: usize,
    ) -> Vec<(DatasetKey, MatchingResult<MatchCounts>)> {
        let queue: Mutex<VecDeque<(usize, DatasetKey)>> =
            Mutex::new(dataset_keys.iter().copied().enumerate().collect());
        let workers = threads.clamp(1, dataset_keys.len().max(1));

        let mut results: Vec<(usize, DatasetKey, MatchingResult<MatchCounts>)> = thread::scope(|s| {
            let mut tasks = Vec::with_capacity(workers);
            for _ in 0..workers {
                tasks.push(s.spawn(|| {
                    let mut done = Vec::new();
                    while let Some((pos, key)) = next_job(&queue) {
                        done.push((pos, key, self.match_dataset(key)));
                    }
                    done
                }));
            }
            let mut results = Vec::with_capacity(dataset_keys.len());
            for task in tasks {
                match task.join() {
                    Ok(done) => results.extend(done),
                    Err(_) => warn!("matching worker panicked"),
                }
            }
            results
        });

        // datasets lost with a panicked worker
        for (pos, key) in dataset_keys.iter().copied().enumerate() {
            if !results.iter().any(|(p, _, _)| *p == pos) {
                results.push((pos, key, Err(MatchingError::Worker { scope: Scope::Dataset(key) })));
            }
        }
        results.sort_by_key(|(pos, _, _)| *pos);
        results.into_iter().map(|(_, key, result)| (key, result)).collect()
    }

    /// Rematches all datasets whose match coverage is below the threshold.
    pub fn rematch_missing(&self) -> MatchingResult<Vec<(DatasetKey, MatchingResult<MatchCounts>)>> {
        let mut missing = Vec::new();
        for key in self.source.datasets()? {
            let coverage = self.source.coverage(key)?;
            if coverage < self.settings.missing_threshold {
                debug!(dataset = key, coverage, "dataset below match threshold");
                missing.push(key);
            }
        }
        info!(
            datasets = missing.len(),
            threshold = self.settings.missing_threshold,
            "rematching datasets with missing matches"
        );
        Ok(self.rematch_datasets(&missing, self.settings.threads))
    }

    fn ensure_online(&self, scope: Scope) -> MatchingResult<()> {
        if self.index.has_started() {
            Ok(())
        } else {
            Err(MatchingError::index(scope, IndexError::Unavailable))
        }
    }

    fn run(&self, scope: Scope, records: RecordCursor<'_>) -> MatchingResult<MatchCounts> {
        let job = Uuid::new_v4();
        let batch_size = self.settings.batch_size.max(1);
        info!(%job, %scope, "matching started");

        let mut batch = self.store.batch(scope)?;
        let mut counts = MatchCounts::default();
        for record in records {
            let record = record?;
            let m = self
                .index
                .match_name(&record.name, self.settings.allow_inserts, false)
                .map_err(|e| MatchingError::index(scope, e))?;
            counts.total += 1;
            if m.match_type == MatchType::None {
                counts.nomatch += 1;
            }

            let index_id = m.key();
            let matched = MatchRecord {
                dataset_key: record.dataset_key,
                record_id: record.id,
                index_id,
                match_type: m.match_type,
                archived: scope.is_archive(),
            };
            match &record.prior {
                None => {
                    batch.create(matched)?;
                    counts.updated += 1;
                }
                Some(prior) if prior.index_id != index_id => {
                    batch.update(matched)?;
                    counts.updated += 1;
                }
                Some(_) => {}
            }

            if counts.total % batch_size == 0 {
                batch.commit()?;
                debug!(%job, %scope, processed = counts.total, "batch committed");
            }
        }
        batch.commit()?;

        info!(
            %job,
            %scope,
            total = counts.total,
            updated = counts.updated,
            nomatch = counts.nomatch,
            "matching finished"
        );
        Ok(counts)
    }
}

fn next_job(queue: &Mutex<VecDeque<(usize, DatasetKey)>>) -> Option<(usize, DatasetKey)> {
    queue.lock().ok()?.pop_front()
}
