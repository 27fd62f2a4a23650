use dupemover::duplicates::DuplicateFinder;
use dupemover::state::{SeenSet, StateStore};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_state_round_trip_through_scan() {
    let root = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    fs::write(root.path().join("a.txt"), "hello").unwrap();
    fs::write(root.path().join("b.txt"), "world").unwrap();

    let store = StateStore::new(state_dir.path().join("processed_files.json"));
    let outcome = DuplicateFinder::with_defaults()
        .find(root.path(), store.load().unwrap())
        .unwrap();
    store.save(&outcome.seen).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded, outcome.seen);
    assert_eq!(reloaded.len(), 2);

    let json: Vec<String> =
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(json.len(), 2);
    assert!(json.iter().any(|p| p.ends_with("a.txt")));
}

#[test]
fn test_second_run_is_idempotent() {
    let root = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    fs::write(root.path().join("a.txt"), "hello").unwrap();
    fs::write(root.path().join("b.txt"), "hello").unwrap();

    let store = StateStore::new(state_dir.path().join("state.json"));
    let first = DuplicateFinder::with_defaults()
        .find(root.path(), store.load().unwrap())
        .unwrap();
    assert_eq!(first.pairs.len(), 1);
    store.save(&first.seen).unwrap();

    // Nothing was moved, yet both files are remembered.
    let second = DuplicateFinder::with_defaults()
        .find(root.path(), store.load().unwrap())
        .unwrap();
    assert!(second.pairs.is_empty());
    assert_eq!(second.stats.already_seen, 2);
    assert_eq!(second.stats.comparisons, 0);
}

#[test]
fn test_prepopulated_state_suppresses_pair() {
    let root = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    fs::write(root.path().join("a.txt"), "hello").unwrap();
    fs::write(root.path().join("b.txt"), "hello").unwrap();
    fs::write(root.path().join("d.txt"), "hello").unwrap();

    let canonical = root.path().canonicalize().unwrap();
    let store = StateStore::new(state_dir.path().join("state.json"));
    let seen: SeenSet = [canonical.join("a.txt"), canonical.join("b.txt")]
        .into_iter()
        .collect();
    store.save(&seen).unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find(root.path(), store.load().unwrap())
        .unwrap();
    assert!(outcome.pairs.is_empty());
    assert!(outcome.seen.contains(&canonical.join("d.txt")));
}

#[test]
fn test_corrupt_state_is_reported() {
    let state_dir = tempdir().unwrap();
    let path = state_dir.path().join("state.json");
    fs::write(&path, "[\"/a\", ").unwrap();

    let store = StateStore::new(&path);
    let err = store.load().unwrap_err();
    assert!(err.is_corrupt());

    let seen = store.load_or_reset(true).unwrap();
    assert!(seen.is_empty());
    // The corrupt file stays until the next save replaces it.
    assert_eq!(fs::read_to_string(&path).unwrap(), "[\"/a\", ");
}

#[test]
fn test_missing_state_loads_empty() {
    let state_dir = tempdir().unwrap();
    let store = StateStore::new(state_dir.path().join("missing").join("state.json"));
    assert!(store.load().unwrap().is_empty());
}
