use std::fs;

use chrono::{Duration, Utc};
use tempfile::tempdir;

use kittentts_web::engines::coqui::CoquiEngine;
use kittentts_web::history::{HistoryEntry, HistoryStore};
use kittentts_web::registry::EngineRegistry;

fn wav_files(root: &std::path::Path) -> Vec<String> {
    fs::read_dir(root)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".wav"))
        .collect()
}

#[test]
fn overflow_keeps_only_the_most_recent_entries() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(dir.path(), 2, 7, 200).unwrap();

    let a = store.add("A", "v1", "kitten", b"aaa").unwrap();
    let b = store.add("B", "v1", "kitten", b"bbb").unwrap();
    let c = store.add("C", "v1", "kitten", b"ccc").unwrap();

    let listed: Vec<String> = store.list(None).into_iter().map(|e| e.text).collect();
    assert_eq!(listed, vec!["C", "B"]);
    assert!(!dir.path().join(&a.filename).exists());
    assert!(dir.path().join(&b.filename).exists());
    assert!(dir.path().join(&c.filename).exists());
}

#[test]
fn list_honors_limit() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
    for text in ["one", "two", "three"] {
        store.add(text, "v1", "kitten", b"x").unwrap();
    }
    assert_eq!(store.list(Some(2)).len(), 2);
    assert_eq!(store.list(Some(2))[0].text, "three");
    assert_eq!(store.list(None).len(), 3);
}

#[test]
fn delete_is_idempotent_false_on_second_call() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
    let entry = store.add("hello", "v1", "kitten", b"abc").unwrap();

    assert!(store.delete(&entry.id));
    assert!(!dir.path().join(&entry.filename).exists());
    assert!(store.list(None).is_empty());
    assert!(!store.delete(&entry.id));
}

#[test]
fn clear_all_leaves_no_payload_files() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
    for text in ["one", "two", "three"] {
        store.add(text, "v1", "kitten", b"xyz").unwrap();
    }

    assert_eq!(store.clear_all(), 3);
    assert!(store.list(None).is_empty());
    assert!(wav_files(dir.path()).is_empty());
}

#[test]
fn clear_all_counts_only_files_actually_deleted() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
    let a = store.add("one", "v1", "kitten", b"x").unwrap();
    store.add("two", "v1", "kitten", b"y").unwrap();

    fs::remove_file(dir.path().join(&a.filename)).unwrap();
    assert_eq!(store.clear_all(), 1);
}

#[test]
fn failed_payload_write_leaves_no_index_entry() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("store");
    let store = HistoryStore::open(&root, 10, 7, 200).unwrap();

    // Pull the storage root out from under the store so the payload write
    // itself fails. The payload is written before the index commits, so a
    // failed write must leave the index exactly as it was.
    fs::remove_dir_all(&root).unwrap();

    let err = store.add("hello", "v1", "kitten", b"abc").unwrap_err();
    assert!(matches!(err, kittentts_web::error::TtsError::Storage(_)));
    assert!(store.list(None).is_empty());
    assert!(!root.join("history.json").exists());
}

#[test]
fn missing_payload_file_is_self_healed() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
    let entry = store.add("hello", "v1", "kitten", b"abc").unwrap();

    // Sanity: the file exists for a healthy entry.
    assert_eq!(
        store.payload_path(&entry.id),
        Some(dir.path().join(&entry.filename))
    );

    fs::remove_file(dir.path().join(&entry.filename)).unwrap();
    assert_eq!(store.payload_path(&entry.id), None);
    // The dangling entry is gone from subsequent listings, durably.
    assert!(store.list(None).is_empty());
    let reopened = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
    assert!(reopened.list(None).is_empty());
}

#[test]
fn index_survives_reopen() {
    let dir = tempdir().unwrap();
    let ids: Vec<String> = {
        let store = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
        vec![
            store.add("one", "v1", "kitten", b"x").unwrap().id,
            store.add("two", "v2", "coqui", b"yy").unwrap().id,
        ]
    };

    let store = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
    let listed = store.list(None);
    assert_eq!(listed.len(), 2);
    // Newest first, same ids as before the restart.
    assert_eq!(listed[0].id, ids[1]);
    assert_eq!(listed[1].id, ids[0]);
    assert_eq!(listed[1].engine_id, "kitten");
}

/// Rewrite created_at fields in the on-disk index, then reopen. This is how
/// the eviction tests age entries without waiting.
fn backdate(dir: &std::path::Path, edit: impl Fn(&mut Vec<HistoryEntry>)) -> HistoryStore {
    let index = dir.join("history.json");
    let mut entries: Vec<HistoryEntry> =
        serde_json::from_str(&fs::read_to_string(&index).unwrap()).unwrap();
    edit(&mut entries);
    fs::write(&index, serde_json::to_vec_pretty(&entries).unwrap()).unwrap();
    HistoryStore::open(dir, 10, 7, 200).unwrap()
}

#[test]
fn eviction_removes_only_entries_older_than_max_age() {
    let dir = tempdir().unwrap();
    {
        let store = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
        store.add("old", "v1", "kitten", b"old").unwrap();
        store.add("boundary", "v1", "kitten", b"edge").unwrap();
        store.add("fresh", "v1", "kitten", b"new").unwrap();
    }

    let now = Utc::now();
    let store = backdate(dir.path(), |entries| {
        // list is newest-first: [fresh, boundary, old]
        entries[2].created_at = (now - Duration::days(10)).to_rfc3339();
        entries[1].created_at = (now - Duration::days(7)).to_rfc3339();
    });

    assert_eq!(store.evict_expired(now), 1);
    let remaining: Vec<String> = store.list(None).into_iter().map(|e| e.text).collect();
    // The entry aged exactly max_age_days sits on the boundary and is kept.
    assert_eq!(remaining, vec!["fresh", "boundary"]);
    assert_eq!(wav_files(dir.path()).len(), 2);
}

#[test]
fn eviction_keeps_entries_with_unparseable_timestamps() {
    let dir = tempdir().unwrap();
    {
        let store = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
        store.add("corrupt", "v1", "kitten", b"x").unwrap();
    }

    let store = backdate(dir.path(), |entries| {
        entries[0].created_at = "not-a-timestamp".to_string();
    });

    assert_eq!(store.evict_expired(Utc::now()), 0);
    assert_eq!(store.list(None).len(), 1);
}

#[test]
fn eviction_is_a_noop_when_disabled() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(dir.path(), 10, 0, 200).unwrap();
    store.add("kept forever", "v1", "kitten", b"x").unwrap();

    let far_future = Utc::now() + Duration::days(3650);
    assert_eq!(store.evict_expired(far_future), 0);
    assert_eq!(store.list(None).len(), 1);
}

#[test]
fn stats_aggregate_the_current_index() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
    store.add("one", "v1", "kitten", &vec![0u8; 1024 * 1024]).unwrap();
    store.add("two", "v1", "kitten", &vec![0u8; 512 * 1024]).unwrap();

    let stats = store.stats();
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.total_bytes, 1536 * 1024);
    assert!((stats.total_megabytes - 1.5).abs() < 1e-9);
    assert_eq!(stats.max_age_days, 7);
    assert_eq!(stats.storage_root, dir.path().display().to_string());
}

#[test]
fn placeholder_synthesis_archives_end_to_end() {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(dir.path(), 10, 7, 200).unwrap();
    let registry = EngineRegistry::register_all(vec![Box::new(CoquiEngine::new())], "coqui");

    let payload = registry.synthesize("hello", "ljspeech", None).unwrap();
    assert!(!payload.is_empty());

    let wav = payload.to_wav_bytes().unwrap();
    let entry = store
        .add("hello", "ljspeech", "coqui", &wav)
        .unwrap();
    assert_eq!(entry.text_preview, "hello");
    assert_eq!(entry.byte_size, wav.len() as u64);
    assert_eq!(store.stats().total_files, 1);

    let path = store.payload_path(&entry.id).unwrap();
    assert_eq!(fs::read(path).unwrap(), wav);
}
