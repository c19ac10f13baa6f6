// Tests for the persisted incremental state store

use modsync::sync::StateStore;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sync-state.txt");

    let store = StateStore::open(&path).unwrap();
    store.record_loaded("/modules/a.xqy", 1000);
    store.record_loaded("/modules/path with spaces/b.xqy", 2000);
    store.flush().unwrap();

    let reopened = StateStore::open(&path).unwrap();
    assert_eq!(reopened.len(), 2);
    assert!(!reopened.should_load("/modules/a.xqy", 1000));
    assert!(!reopened.should_load("/modules/path with spaces/b.xqy", 2000));
    assert!(reopened.should_load("/modules/a.xqy", 1001));
}

#[test]
fn test_flush_output_is_sorted_and_stable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sync-state.txt");

    let store = StateStore::open(&path).unwrap();
    store.record_loaded("/modules/z.xqy", 3);
    store.record_loaded("/modules/a.xqy", 1);
    store.flush().unwrap();
    let first = fs::read_to_string(&path).unwrap();

    store.flush().unwrap();
    let second = fs::read_to_string(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(first, "1  /modules/a.xqy\n3  /modules/z.xqy\n");
}

#[test]
fn test_reset_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sync-state.txt");

    let store = StateStore::open(&path).unwrap();
    store.record_loaded("/modules/a.xqy", 1000);
    store.flush().unwrap();
    assert!(path.exists());

    store.reset().unwrap();
    assert!(store.is_empty());
    assert!(!path.exists());

    // Second reset in a row, with no backing file left
    store.reset().unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_reset_on_never_flushed_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sync-state.txt");

    let store = StateStore::open(&path).unwrap();
    store.reset().unwrap();
    store.reset().unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_malformed_lines_force_reload_not_skip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sync-state.txt");
    fs::write(
        &path,
        "1000  /modules/good.xqy\ngarbage-line\nnot-a-number  /modules/bad.xqy\n",
    )
    .unwrap();

    let store = StateStore::open(&path).unwrap();
    assert_eq!(store.len(), 1);
    assert!(!store.should_load("/modules/good.xqy", 1000));
    // The unreadable record is discarded, so the file loads again
    assert!(store.should_load("/modules/bad.xqy", 500));
}

#[test]
fn test_upsert_overwrites_existing_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sync-state.txt");

    let store = StateStore::open(&path).unwrap();
    store.record_loaded("/modules/a.xqy", 1000);
    store.record_loaded("/modules/a.xqy", 2000);
    assert_eq!(store.len(), 1);
    assert!(!store.should_load("/modules/a.xqy", 2000));
    assert!(store.should_load("/modules/a.xqy", 2001));
}
