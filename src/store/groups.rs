//! In-memory grouping maps shared by all store backends.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::model::{IndexName, NameKey};

/// Records by key plus the two grouping indices.
///
/// - `groups`: normalized key -> keys of the candidate pool
/// - `canonical`: canonical key -> keys of its variants
/// - `normalized_keys`: key -> normalized key the record is grouped under
#[derive(Debug, Default, Clone)]
pub struct NameGroups {
    names: HashMap<NameKey, IndexName>,
    normalized_keys: HashMap<NameKey, String>,
    groups: HashMap<String, Vec<NameKey>>,
    canonical: HashMap<NameKey, Vec<NameKey>>,
}

fn push_unique(keys: &mut Vec<NameKey>, key: NameKey) {
    keys.retain(|k| *k != key);
    keys.push(key);
}

fn remove_key<K, Q>(map: &mut HashMap<K, Vec<NameKey>>, group: &Q, key: NameKey)
where
    K: Borrow<Q> + Hash + Eq,
    Q: Hash + Eq + ?Sized,
{
    if let Some(keys) = map.get_mut(group) {
        keys.retain(|k| *k != key);
        if keys.is_empty() {
            map.remove(group);
        }
    }
}

impl NameGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, key: NameKey) -> Option<&IndexName> {
        self.names.get(&key)
    }

    /// Candidate pool of a normalized key, in insertion order.
    pub fn group(&self, normalized_key: &str) -> Vec<IndexName> {
        self.groups
            .get(normalized_key)
            .map(|keys| keys.iter().filter_map(|k| self.names.get(k)).cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains_group(&self, normalized_key: &str) -> bool {
        self.groups.contains_key(normalized_key)
    }

    /// Distinct variants registered for a canonical key.
    pub fn variants(&self, canonical_key: NameKey) -> Option<Vec<IndexName>> {
        let keys = self.canonical.get(&canonical_key)?;
        let mut seen = HashSet::new();
        let variants: Vec<IndexName> = keys
            .iter()
            .filter(|k| seen.insert(**k))
            .filter_map(|k| self.names.get(k))
            .cloned()
            .collect();
        if variants.is_empty() {
            None
        } else {
            Some(variants)
        }
    }

    /// Upserts a validated record.
    ///
    /// A record stored under the same key is removed from its name group and
    /// its canonical group first, even when the new record moves elsewhere.
    pub fn put(&mut self, normalized_key: &str, name: IndexName) {
        let Some(key) = name.key else {
            return;
        };
        if let Some(old_key) = self.normalized_keys.get(&key).cloned() {
            self.remove_one(key, &old_key);
        }
        self.normalized_keys.insert(key, normalized_key.to_string());
        push_unique(self.groups.entry(normalized_key.to_string()).or_default(), key);
        if let Some(canonical_id) = name.canonical_id {
            if canonical_id != key {
                push_unique(self.canonical.entry(canonical_id).or_default(), key);
            }
        }
        self.names.insert(key, name);
    }

    /// Removes a single record without cascading.
    ///
    /// The record is looked up under the normalized key it was stored with,
    /// the given one only serves records stored without it.
    pub fn remove_one(&mut self, key: NameKey, normalized_key: &str) -> Option<IndexName> {
        let name = self.names.remove(&key)?;
        let stored = self.normalized_keys.remove(&key);
        remove_key(&mut self.groups, stored.as_deref().unwrap_or(normalized_key), key);
        if let Some(canonical_id) = name.canonical_id {
            if canonical_id != key {
                remove_key(&mut self.canonical, &canonical_id, key);
            }
        }
        Some(name)
    }

    /// Records [`NameGroups::remove`] would remove, in the same order,
    /// without touching the maps.
    pub fn cascade(&self, key: NameKey) -> Vec<IndexName> {
        let Some(name) = self.names.get(&key) else {
            return Vec::new();
        };
        let mut doomed = vec![name.clone()];
        if name.canonical_id == Some(key) {
            if let Some(variants) = self.canonical.get(&key) {
                let mut seen = HashSet::from([key]);
                doomed.extend(
                    variants
                        .iter()
                        .filter(|k| seen.insert(**k))
                        .filter_map(|k| self.names.get(k))
                        .cloned(),
                );
            }
        }
        doomed
    }

    /// Removes a record, cascading to all variants if it was canonical.
    ///
    /// Returns every removed record, the requested one first.
    pub fn remove<F>(&mut self, key: NameKey, key_fn: &F) -> Vec<IndexName>
    where
        F: Fn(&IndexName) -> String + ?Sized,
    {
        let mut removed = Vec::new();
        let Some(normalized_key) = self.names.get(&key).map(|n| key_fn(n)) else {
            return removed;
        };
        let Some(name) = self.remove_one(key, &normalized_key) else {
            return removed;
        };
        let variants = if name.canonical_id == Some(key) {
            self.canonical.remove(&key).unwrap_or_default()
        } else {
            Vec::new()
        };
        removed.push(name);
        for variant in variants {
            if variant != key {
                removed.extend(self.remove(variant, key_fn));
            }
        }
        removed
    }

    /// De-duplicates group arrays and drops dangling keys. Idempotent.
    pub fn compact(&mut self) {
        let names = &self.names;
        let dedup = |keys: &mut Vec<NameKey>| {
            let mut seen = HashSet::new();
            keys.retain(|k| names.contains_key(k) && seen.insert(*k));
        };
        self.groups.values_mut().for_each(dedup);
        self.groups.retain(|_, keys| !keys.is_empty());
        self.canonical.values_mut().for_each(dedup);
        self.canonical.retain(|_, keys| !keys.is_empty());
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.normalized_keys.clear();
        self.groups.clear();
        self.canonical.clear();
    }

    /// All records ordered by key.
    pub fn all(&self) -> Vec<IndexName> {
        let mut all: Vec<IndexName> = self.names.values().cloned().collect();
        all.sort_by_key(|n| n.key);
        all
    }

    /// Normalized key of every record, ordered by record key.
    pub fn entries(&self) -> Vec<(String, IndexName)> {
        let mut entries = Vec::with_capacity(self.names.len());
        for (nk, keys) in &self.groups {
            for name in keys.iter().filter_map(|k| self.names.get(k)) {
                entries.push((nk.clone(), name.clone()));
            }
        }
        entries.sort_by_key(|(_, n)| n.key);
        entries.dedup_by_key(|(_, n)| n.key);
        entries
    }

    pub fn max_key(&self) -> Option<NameKey> {
        self.names.keys().max().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Name, Rank};

    fn index_name(key: NameKey, canonical_id: NameKey, label: &str, authorship: Option<&str>) -> IndexName {
        let mut name = Name::new(label, Some(Rank::Species));
        if let Some(a) = authorship {
            name = name.with_authorship(a);
        }
        let mut n = IndexName::from_name(&name);
        n.key = Some(key);
        n.canonical_id = Some(canonical_id);
        n
    }

    fn key_fn(n: &IndexName) -> String {
        n.scientific_name.to_lowercase()
    }

    fn sample() -> NameGroups {
        let mut g = NameGroups::new();
        g.put("larus fuscus", index_name(10, 10, "Larus fuscus", None));
        g.put("larus fuscus", index_name(11, 10, "Larus fuscus", Some("Linnaeus, 1758")));
        g.put("larus fuscus", index_name(12, 10, "Larus fuscus", Some("L.")));
        g.put("abies alba", index_name(20, 20, "Abies alba", None));
        g
    }

    #[test]
    fn test_put_groups_by_key() {
        let g = sample();
        assert_eq!(g.len(), 4);
        let keys: Vec<_> = g.group("larus fuscus").iter().map(|n| n.key).collect();
        assert_eq!(keys, vec![Some(10), Some(11), Some(12)]);
        assert!(g.group("missing").is_empty());
        let variants = g.variants(10).unwrap();
        assert_eq!(variants.len(), 2);
        assert!(g.variants(20).is_none());
    }

    #[test]
    fn test_put_replaces_stale_entry() {
        let mut g = sample();
        g.put("larus fuscus", index_name(11, 10, "Larus fuscus", Some("Linnaeus, 1758")));
        let keys: Vec<_> = g.group("larus fuscus").iter().map(|n| n.key).collect();
        assert_eq!(keys, vec![Some(10), Some(12), Some(11)]);
        assert_eq!(g.variants(10).unwrap().len(), 2);
    }

    #[test]
    fn test_put_moves_record_to_new_groups() {
        let mut g = sample();
        g.put("abies alba", index_name(11, 20, "Abies alba", Some("Mill.")));
        assert_eq!(g.len(), 4);

        let keys: Vec<_> = g.group("larus fuscus").iter().map(|n| n.key).collect();
        assert_eq!(keys, vec![Some(10), Some(12)]);
        let keys: Vec<_> = g.group("abies alba").iter().map(|n| n.key).collect();
        assert_eq!(keys, vec![Some(20), Some(11)]);

        let variants: Vec<_> = g.variants(10).unwrap().iter().map(|n| n.key).collect();
        assert_eq!(variants, vec![Some(12)]);
        assert_eq!(g.variants(20).unwrap()[0].scientific_name, "Abies alba");

        // removal finds the record under its new group
        g.remove_one(11, "larus fuscus");
        assert_eq!(g.group("abies alba").len(), 1);
        assert!(g.variants(20).is_none());
    }

    #[test]
    fn test_remove_variant() {
        let mut g = sample();
        let removed = g.remove(11, &key_fn);
        assert_eq!(removed.len(), 1);
        assert_eq!(g.variants(10).unwrap().len(), 1);
        assert_eq!(g.group("larus fuscus").len(), 2);
    }

    #[test]
    fn test_remove_canonical_cascades() {
        let mut g = sample();
        let removed: Vec<_> = g.remove(10, &key_fn).iter().map(|n| n.key).collect();
        assert_eq!(removed, vec![Some(10), Some(11), Some(12)]);
        assert!(g.group("larus fuscus").is_empty());
        assert!(!g.contains_group("larus fuscus"));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_cascade_matches_remove() {
        let mut g = sample();
        let before = g.all();
        let doomed: Vec<_> = g.cascade(10).iter().map(|n| n.key).collect();
        assert_eq!(doomed, vec![Some(10), Some(11), Some(12)]);
        assert_eq!(g.all(), before);

        let variant: Vec<_> = g.cascade(12).iter().map(|n| n.key).collect();
        assert_eq!(variant, vec![Some(12)]);
        assert!(g.cascade(99).is_empty());

        let removed: Vec<_> = g.remove(10, &key_fn).iter().map(|n| n.key).collect();
        assert_eq!(removed, doomed);
    }

    #[test]
    fn test_remove_missing() {
        let mut g = sample();
        assert!(g.remove(99, &key_fn).is_empty());
        assert_eq!(g.len(), 4);
    }

    #[test]
    fn test_compact_is_idempotent() {
        let mut g = sample();
        g.groups.get_mut("abies alba").unwrap().extend([20, 20, 77]);
        g.compact();
        assert_eq!(g.groups["abies alba"], vec![20]);
        let before = g.entries();
        g.compact();
        assert_eq!(g.entries(), before);
    }

    #[test]
    fn test_all_and_entries_sorted() {
        let g = sample();
        let keys: Vec<_> = g.all().iter().map(|n| n.key).collect();
        assert_eq!(keys, vec![Some(10), Some(11), Some(12), Some(20)]);
        let entries = g.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[3].0, "abies alba");
        assert_eq!(g.max_key(), Some(20));
    }
}
