//! Store Persistence Tests
//!
//! Tests for the persistent store and its interplay with the mirror:
//! - content survives stop and restart
//! - a corrupt journal is wiped and the index reloads from the mirror
//! - a store disagreeing with the mirror is reloaded
//! - compaction is idempotent
//! - deleting a canonical name cascades to its variants

use std::fs;
use std::sync::Arc;

use nidx::authorship::BasicAuthorComparator;
use nidx::index::{persistent_index, NameIndex, NameIndexImpl};
use nidx::mirror::{FileMirror, MemoryMirror, NameMirror};
use nidx::model::{MatchType, Name, Rank};
use nidx::store::{MappedStore, NameIndexStore, JOURNAL_FILE};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn open(dir: &TempDir, mirror: Arc<dyn NameMirror>) -> NameIndexImpl {
    let index = persistent_index(
        dir.path().join("index"),
        false,
        mirror,
        Arc::new(BasicAuthorComparator::new()),
    );
    index.start().unwrap();
    index
}

fn queries() -> Vec<Name> {
    vec![
        Name::new("Abies alba", Some(Rank::Species)).with_authorship("Mill."),
        Name::new("Abies", Some(Rank::Genus)),
        Name::new("Larus fuscus", Some(Rank::Species)).with_authorship("Linnaeus, 1758"),
        Name::new("Picea", Some(Rank::Genus)).with_authorship("A.Dietr."),
    ]
}

fn fill(index: &NameIndexImpl) -> Vec<Option<u32>> {
    queries()
        .iter()
        .map(|q| index.match_name(q, true, false).unwrap().key())
        .collect()
}

fn assert_matches(index: &NameIndexImpl, keys: &[Option<u32>]) {
    for (query, key) in queries().iter().zip(keys) {
        let m = index.match_name(query, false, false).unwrap();
        assert_eq!(m.match_type, MatchType::Exact);
        assert_eq!(&m.key(), key);
    }
}

// =============================================================================
// Restart
// =============================================================================

#[test]
fn test_content_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let mirror: Arc<dyn NameMirror> = Arc::new(MemoryMirror::new());

    let (keys, before, created) = {
        let index = open(&temp_dir, mirror.clone());
        let keys = fill(&index);
        let before = index.all().unwrap();
        let created = index.created().unwrap();
        index.stop().unwrap();
        (keys, before, created)
    };

    let index = open(&temp_dir, mirror);
    assert_eq!(index.all().unwrap(), before);
    assert_eq!(index.created().unwrap(), created);
    assert_matches(&index, &keys);

    // the key sequence continues after the highest key
    let next = index
        .match_name(&Name::new("Pinus", Some(Rank::Genus)), true, false)
        .unwrap()
        .key()
        .unwrap();
    assert_eq!(next as usize, before.len() + 1);
}

#[test]
fn test_file_mirror_and_store_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let mirror_path = temp_dir.path().join("mirror.dat");

    let keys = {
        let index = open(&temp_dir, Arc::new(FileMirror::open(&mirror_path, true).unwrap()));
        let keys = fill(&index);
        index.stop().unwrap();
        keys
    };

    let mirror = Arc::new(FileMirror::open(&mirror_path, true).unwrap());
    assert_eq!(mirror.count().unwrap(), 7);
    let index = open(&temp_dir, mirror);
    assert_eq!(index.size().unwrap(), 7);
    assert_matches(&index, &keys);
}

#[test]
fn test_stopped_index_is_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let index = open(&temp_dir, Arc::new(MemoryMirror::new()));
    index.stop().unwrap();
    assert!(!index.has_started());
    let err = index.match_name(&queries()[0], true, false).unwrap_err();
    assert!(err.is_unavailable());
}

// =============================================================================
// Corruption And Mirror Reload
// =============================================================================

#[test]
fn test_corrupt_journal_reloads_from_mirror() {
    let temp_dir = TempDir::new().unwrap();
    let mirror: Arc<dyn NameMirror> = Arc::new(MemoryMirror::new());
    let keys = {
        let index = open(&temp_dir, mirror.clone());
        let keys = fill(&index);
        index.stop().unwrap();
        keys
    };

    let journal = temp_dir.path().join("index").join(JOURNAL_FILE);
    let mut contents = fs::read(&journal).unwrap();
    let mid = contents.len() / 2;
    contents[mid] ^= 0xFF;
    fs::write(&journal, contents).unwrap();

    let index = open(&temp_dir, mirror.clone());
    assert_eq!(index.size().unwrap(), mirror.count().unwrap());
    assert_matches(&index, &keys);
}

#[test]
fn test_corrupt_journal_is_wiped_by_store() {
    let temp_dir = TempDir::new().unwrap();
    {
        let index = open(&temp_dir, Arc::new(MemoryMirror::new()));
        fill(&index);
        index.stop().unwrap();
    }
    let journal = temp_dir.path().join("index").join(JOURNAL_FILE);
    let mut contents = fs::read(&journal).unwrap();
    contents.truncate(contents.len() - 3);
    fs::write(&journal, contents).unwrap();

    let store = MappedStore::new(temp_dir.path().join("index"), false);
    store.start().unwrap();
    assert_eq!(store.count().unwrap(), 0);
    assert!(store.has_started());
}

#[test]
fn test_store_disagreeing_with_mirror_is_reloaded() {
    let temp_dir = TempDir::new().unwrap();
    let mirror = Arc::new(MemoryMirror::new());
    {
        let index = open(&temp_dir, mirror.clone());
        fill(&index);
        index.stop().unwrap();
    }
    // names only known to the mirror
    let mut extra = nidx::model::IndexName::from_name(&Name::new("Taxus", Some(Rank::Genus)));
    extra.key = Some(100);
    extra.canonical_id = Some(100);
    mirror.create(&extra).unwrap();

    let index = open(&temp_dir, mirror);
    assert_eq!(index.size().unwrap(), 8);
    assert_eq!(index.get(100).unwrap().unwrap().scientific_name, "Taxus");
}

// =============================================================================
// Compaction
// =============================================================================

#[test]
fn test_compact_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let mirror: Arc<dyn NameMirror> = Arc::new(MemoryMirror::new());
    let (keys, before) = {
        let index = open(&temp_dir, mirror.clone());
        let keys = fill(&index);
        index.compact().unwrap();
        let before = index.all().unwrap();
        index.compact().unwrap();
        assert_eq!(index.all().unwrap(), before);
        index.stop().unwrap();
        (keys, before)
    };

    let index = open(&temp_dir, mirror);
    assert_eq!(index.all().unwrap(), before);
    assert_matches(&index, &keys);
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn test_delete_canonical_cascades() {
    let temp_dir = TempDir::new().unwrap();
    let mirror: Arc<dyn NameMirror> = Arc::new(MemoryMirror::new());
    let index = open(&temp_dir, mirror.clone());
    let mill = index
        .match_name(&Name::new("Abies alba", Some(Rank::Species)).with_authorship("Mill."), true, false)
        .unwrap()
        .name
        .unwrap();
    index
        .match_name(&Name::new("Abies alba", Some(Rank::Species)).with_authorship("DC."), true, false)
        .unwrap();
    index.match_name(&Name::new("Picea", Some(Rank::Genus)), true, false).unwrap();
    assert_eq!(index.size().unwrap(), 4);

    let removed = index.delete(mill.canonical_id.unwrap()).unwrap();
    assert_eq!(removed.len(), 3);
    assert_eq!(removed[0].key, mill.canonical_id);
    assert_eq!(index.size().unwrap(), 1);
    assert_eq!(mirror.count().unwrap(), 1);
    assert!(index.by_canonical(mill.canonical_id.unwrap()).unwrap().is_none());
    index.stop().unwrap();

    let index = open(&temp_dir, mirror);
    assert_eq!(index.size().unwrap(), 1);
    let m = index
        .match_name(&Name::new("Abies alba", Some(Rank::Species)).with_authorship("Mill."), false, false)
        .unwrap();
    assert_eq!(m.match_type, MatchType::None);
}

#[test]
fn test_delete_variant_keeps_canonical() {
    let temp_dir = TempDir::new().unwrap();
    let index = open(&temp_dir, Arc::new(MemoryMirror::new()));
    let mill = index
        .match_name(&Name::new("Abies alba", Some(Rank::Species)).with_authorship("Mill."), true, false)
        .unwrap()
        .name
        .unwrap();

    let removed = index.delete(mill.key.unwrap()).unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(index.size().unwrap(), 1);
    assert!(index.get(mill.canonical_id.unwrap()).unwrap().is_some());
    assert!(index.by_canonical(mill.canonical_id.unwrap()).unwrap().is_none());
}

#[test]
fn test_reset_empties_index_and_mirror() {
    let temp_dir = TempDir::new().unwrap();
    let mirror: Arc<dyn NameMirror> = Arc::new(MemoryMirror::new());
    let index = open(&temp_dir, mirror.clone());
    fill(&index);
    index.reset().unwrap();
    assert_eq!(index.size().unwrap(), 0);
    assert_eq!(mirror.count().unwrap(), 0);
    index.stop().unwrap();

    let index = open(&temp_dir, mirror);
    assert_eq!(index.size().unwrap(), 0);
}
