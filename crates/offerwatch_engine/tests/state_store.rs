use std::fs;

use chrono::{TimeZone, Utc};
use offerwatch_core::StateSnapshot;
use offerwatch_engine::{ensure_state_dir, AtomicSnapshotWriter, JsonStateStore, StateStore};
use tempfile::TempDir;

fn snapshot(ids: &[&str]) -> StateSnapshot {
    StateSnapshot {
        offer_ids: ids.iter().map(|s| (*s).to_owned()).collect(),
        last_run_at: Utc.with_ymd_and_hms(2026, 8, 29, 6, 0, 0).unwrap(),
    }
}

#[test]
fn missing_file_is_no_prior_state_not_an_error() {
    let temp = TempDir::new().unwrap();
    let store = JsonStateStore::new(temp.path().join("state.json"));
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn save_then_load_round_trips() {
    let temp = TempDir::new().unwrap();
    let store = JsonStateStore::new(temp.path().join("state.json"));
    let snap = snapshot(&["a", "b", "c"]);

    store.save(&snap).unwrap();
    assert_eq!(store.load().unwrap(), Some(snap));
}

#[test]
fn resaving_a_loaded_snapshot_is_a_no_op() {
    let temp = TempDir::new().unwrap();
    let store = JsonStateStore::new(temp.path().join("state.json"));
    store.save(&snapshot(&["x", "y"])).unwrap();

    let loaded = store.load().unwrap().unwrap();
    store.save(&loaded).unwrap();
    assert_eq!(store.load().unwrap(), Some(loaded));
}

#[test]
fn save_replaces_previous_snapshot_whole() {
    let temp = TempDir::new().unwrap();
    let store = JsonStateStore::new(temp.path().join("state.json"));
    store.save(&snapshot(&["old1", "old2"])).unwrap();
    store.save(&snapshot(&["new1"])).unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.offer_ids, ["new1".to_owned()].into());
}

#[test]
fn corrupt_snapshot_is_treated_as_no_prior_state() {
    offerwatch_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.json");
    fs::write(&path, "{ this is not json").unwrap();

    let store = JsonStateStore::new(path);
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn failed_save_leaves_previous_snapshot_intact() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.json");
    let store = JsonStateStore::new(path.clone());
    store.save(&snapshot(&["keep"])).unwrap();

    // Make the directory unusable for the temp-file step by pointing a
    // second store at a path whose parent is a regular file.
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "x").unwrap();
    let bad_store = JsonStateStore::new(blocker.join("state.json"));
    assert!(bad_store.save(&snapshot(&["lost"])).is_err());

    // Prior snapshot still readable and unchanged.
    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.offer_ids, ["keep".to_owned()].into());
}

#[test]
fn writer_creates_missing_state_dir() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("nested").join("state");
    assert!(!dir.exists());
    ensure_state_dir(&dir).unwrap();
    assert!(dir.is_dir());

    let writer = AtomicSnapshotWriter::new(dir.join("state.json"));
    writer.write("{}").unwrap();
    assert_eq!(fs::read_to_string(writer.target()).unwrap(), "{}");
}

#[test]
fn overwrite_renames_over_the_existing_snapshot() {
    // The commit must rename straight over the target; the previous
    // snapshot is never deleted ahead of the new one arriving.
    let temp = TempDir::new().unwrap();
    let writer = AtomicSnapshotWriter::new(temp.path().join("state.json"));

    writer.write("old").unwrap();
    assert!(writer.target().exists());
    writer.write("new").unwrap();
    assert!(writer.target().exists());
    assert_eq!(fs::read_to_string(writer.target()).unwrap(), "new");
}

#[test]
fn writer_rejects_a_path_without_a_filename() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicSnapshotWriter::new(temp.path().join(".."));
    assert!(writer.write("{}").is_err());
}
