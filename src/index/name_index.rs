//! Names index implementation
//!
//! Combines a [`NameIndexStore`] for lookups, a [`NameMirror`] as the durable
//! source of truth and an [`AuthorComparator`] for scoring.
//!
//! # Inserts
//!
//! Inserts are serialized by a single lock. Inside the lock the name is
//! matched again so that concurrent callers asking for the same name end up
//! with one record. New records are written to the mirror before the store.
//!
//! # Keys
//!
//! Keys come from a sequence seeded with the highest stored key on start.
//!
//! # Dependents
//!
//! Match stores registered with [`NameIndexImpl::add_dependent`] hold match
//! records pointing at index keys. `reset()` truncates them first.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::errors::{IndexError, IndexResult};
use super::matcher::match_candidates;
use super::NameIndex;
use crate::authorship::AuthorComparator;
use crate::matching::MatchStore;
use crate::mirror::NameMirror;
use crate::model::{IndexName, MatchType, Name, NameKey, NameMatch, ScientificName};
use crate::normalizer::{has_ascii_alphanumeric, index_key};
use crate::store::{NameIndexStore, StoreError};

/// Normalized key of a stored record.
pub fn record_key(name: &IndexName) -> String {
    index_key(&name.scientific_name)
}

/// True if a match outcome calls for a new record.
///
/// Authored names only matching their canonical form get their own record.
pub fn needs_insert(m: &NameMatch, query: &Name) -> bool {
    match m.match_type {
        MatchType::None => true,
        MatchType::Canonical => query.has_authorship(),
        _ => false,
    }
}

/// True if the name may be inserted at all.
pub fn is_insertable(query: &Name) -> bool {
    query.name_type.is_indexable() && has_ascii_alphanumeric(&query.label())
}

pub struct NameIndexImpl {
    store: Arc<dyn NameIndexStore>,
    mirror: Arc<dyn NameMirror>,
    comparator: Arc<dyn AuthorComparator>,
    started: AtomicBool,
    insert_lock: Mutex<()>,
    sequence: AtomicU32,
    dependents: Mutex<Vec<Arc<dyn MatchStore>>>,
}

impl NameIndexImpl {
    pub fn new(
        store: Arc<dyn NameIndexStore>,
        mirror: Arc<dyn NameMirror>,
        comparator: Arc<dyn AuthorComparator>,
    ) -> Self {
        Self {
            store,
            mirror,
            comparator,
            started: AtomicBool::new(false),
            insert_lock: Mutex::new(()),
            sequence: AtomicU32::new(0),
            dependents: Mutex::new(Vec::new()),
        }
    }

    /// Registers a match store whose records are removed on reset.
    pub fn add_dependent(&self, store: Arc<dyn MatchStore>) -> IndexResult<()> {
        self.dependents
            .lock()
            .map_err(|_| IndexError::Dependents("dependents lock poisoned".to_string()))?
            .push(store);
        Ok(())
    }

    fn truncate_dependents(&self) -> IndexResult<()> {
        let dependents = self
            .dependents
            .lock()
            .map_err(|_| IndexError::Dependents("dependents lock poisoned".to_string()))?;
        for store in dependents.iter() {
            store
                .truncate_all()
                .map_err(|e| IndexError::Dependents(e.to_string()))?;
        }
        if !dependents.is_empty() {
            info!(stores = dependents.len(), "dependent matches truncated");
        }
        Ok(())
    }

    fn ensure_started(&self) -> IndexResult<()> {
        if self.started.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(IndexError::Unavailable)
        }
    }

    fn lock_inserts(&self, label: &str) -> IndexResult<MutexGuard<'_, ()>> {
        self.insert_lock
            .lock()
            .map_err(|_| IndexError::matching(label, "insert lock poisoned"))
    }

    /// Replaces the store content with the mirror content.
    fn rebuild_from_mirror(&self) -> IndexResult<usize> {
        self.store.clear()?;
        let names = self.mirror.load_all()?;
        let count = names.len();
        for name in names {
            let key = record_key(&name);
            self.store.add(&key, name)?;
        }
        self.seed_sequence()?;
        info!(names = count, "names index rebuilt from mirror");
        Ok(count)
    }

    fn seed_sequence(&self) -> IndexResult<()> {
        let max = self.store.max_key()?.unwrap_or(0);
        self.sequence.store(max, Ordering::SeqCst);
        Ok(())
    }

    fn next_key(&self, label: &str) -> IndexResult<NameKey> {
        let previous = self
            .sequence
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |k| k.checked_add(1))
            .map_err(|_| IndexError::matching(label, "name key space exhausted"))?;
        Ok(previous + 1)
    }

    fn lookup(&self, name: &Name, verbose: bool) -> IndexResult<NameMatch> {
        let candidates = self
            .store
            .get_group(&index_key(&name.scientific_name))
            .map_err(|e| match e {
                StoreError::Unavailable => IndexError::Unavailable,
                other => IndexError::matching(name.label(), other.to_string()),
            })?;
        Ok(match_candidates(name, candidates, self.comparator.as_ref(), verbose))
    }

    /// Inserts the name unless a concurrent caller already did.
    fn try_to_add(&self, name: &Name, verbose: bool) -> IndexResult<NameMatch> {
        let label = name.label();
        let _guard = self.lock_inserts(&label)?;
        let m = self.lookup(name, verbose)?;
        if !needs_insert(&m, name) {
            return Ok(m);
        }
        let stored = self.insert(IndexName::from_name(name))?;
        Ok(NameMatch::of(stored, MatchType::Exact))
    }

    /// Persists a name, creating its canonical sibling first if needed.
    ///
    /// Must be called while holding the insert lock.
    fn insert(&self, mut name: IndexName) -> IndexResult<IndexName> {
        let normalized_key = record_key(&name);
        if let Some(canonical_id) = name.canonical_id.filter(|c| Some(*c) != name.key) {
            let exists = self
                .store
                .get(canonical_id)?
                .map_or(false, |c| c.is_canonical());
            if !exists {
                return Err(IndexError::MissingCanonical {
                    label: name.label(),
                    canonical_id,
                });
            }
        }
        if name.canonical_id.is_none() && name.has_authorship() {
            let canonical = match self.find_canonical(&normalized_key, &name.scientific_name)? {
                Some(c) => c,
                None => self.persist(name.new_canonical(), &normalized_key)?,
            };
            name.canonical_id = canonical.key;
        }
        self.persist(name, &normalized_key)
    }

    /// Authorless canonical record of the pool, preferring the same spelling.
    fn find_canonical(&self, normalized_key: &str, scientific_name: &str) -> IndexResult<Option<IndexName>> {
        let mut canonicals: Vec<IndexName> = self
            .store
            .get_group(normalized_key)?
            .into_iter()
            .filter(|n| n.is_canonical() && !n.has_authorship())
            .collect();
        canonicals.sort_by_key(|n| n.key);
        let same_spelling = canonicals
            .iter()
            .position(|n| n.scientific_name.eq_ignore_ascii_case(scientific_name));
        Ok(match same_spelling {
            Some(idx) => Some(canonicals.swap_remove(idx)),
            None => canonicals.into_iter().next(),
        })
    }

    fn persist(&self, mut name: IndexName, normalized_key: &str) -> IndexResult<IndexName> {
        let key = match name.key {
            Some(k) => {
                self.sequence.fetch_max(k, Ordering::SeqCst);
                k
            }
            None => self.next_key(&name.label())?,
        };
        name.key = Some(key);
        if name.canonical_id.is_none() {
            name.canonical_id = Some(key);
        }
        if name.created.is_none() {
            name.created = Some(Utc::now());
        }
        self.mirror.create(&name)?;
        self.store.add(normalized_key, name.clone())?;
        debug!(key, name = %name.label_with_rank(), canonical = ?name.canonical_id, "inserted name");
        Ok(name)
    }
}

impl NameIndex for NameIndexImpl {
    fn start(&self) -> IndexResult<()> {
        self.store.start()?;
        let stored = self.store.count()?;
        let mirrored = self.mirror.count()?;
        if stored == 0 || stored != mirrored {
            if stored != 0 {
                warn!(stored, mirrored, "names index differs from mirror, reloading");
            }
            self.rebuild_from_mirror()?;
        } else {
            self.seed_sequence()?;
        }
        self.started.store(true, Ordering::SeqCst);
        info!(names = self.store.count()?, "names index started");
        Ok(())
    }

    fn stop(&self) -> IndexResult<()> {
        if self.started.swap(false, Ordering::SeqCst) {
            info!(names = self.store.count().unwrap_or(0), "stopping names index");
        }
        self.store.stop()?;
        Ok(())
    }

    fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn created(&self) -> IndexResult<DateTime<Utc>> {
        self.ensure_started()?;
        Ok(self.store.created()?)
    }

    fn match_name(&self, name: &Name, allow_inserts: bool, verbose: bool) -> IndexResult<NameMatch> {
        self.ensure_started()?;
        let m = self.lookup(name, verbose)?;
        if allow_inserts && needs_insert(&m, name) && is_insertable(name) {
            return self.try_to_add(name, verbose);
        }
        if m.match_type == MatchType::None {
            debug!(name = %name.label(), "no match");
        }
        Ok(m)
    }

    fn get(&self, key: NameKey) -> IndexResult<Option<IndexName>> {
        self.ensure_started()?;
        Ok(self.store.get(key)?)
    }

    fn by_canonical(&self, canonical_key: NameKey) -> IndexResult<Option<Vec<IndexName>>> {
        self.ensure_started()?;
        Ok(self.store.by_canonical(canonical_key)?)
    }

    fn add(&self, name: IndexName) -> IndexResult<IndexName> {
        self.ensure_started()?;
        let _guard = self.lock_inserts(&name.label())?;
        self.insert(name)
    }

    fn delete(&self, key: NameKey) -> IndexResult<Vec<IndexName>> {
        self.ensure_started()?;
        let _guard = self.lock_inserts(&format!("#{}", key))?;
        let removed = self.store.delete(key, &record_key)?;
        let keys: Vec<NameKey> = removed.iter().filter_map(|n| n.key).collect();
        self.mirror.delete(&keys)?;
        if !removed.is_empty() {
            info!(key, removed = removed.len(), "deleted names");
        }
        Ok(removed)
    }

    fn size(&self) -> IndexResult<usize> {
        self.ensure_started()?;
        Ok(self.store.count()?)
    }

    fn all(&self) -> IndexResult<Vec<IndexName>> {
        self.ensure_started()?;
        Ok(self.store.all()?)
    }

    fn reset(&self) -> IndexResult<()> {
        self.ensure_started()?;
        let _guard = self.lock_inserts("reset")?;
        self.truncate_dependents()?;
        self.mirror.truncate()?;
        self.store.clear()?;
        self.sequence.store(0, Ordering::SeqCst);
        info!("names index reset");
        Ok(())
    }

    fn compact(&self) -> IndexResult<()> {
        self.ensure_started()?;
        self.store.compact()?;
        Ok(())
    }

    fn rebuild(&self) -> IndexResult<usize> {
        self.ensure_started()?;
        let _guard = self.lock_inserts("rebuild")?;
        self.rebuild_from_mirror()
    }
}
