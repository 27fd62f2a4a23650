use dupemover::actions::{
    move_file, quarantine_dir, MoveConfig, MoveError, NoProgress, QuarantineMover, RetryPolicy,
};
use dupemover::duplicates::DuplicateFinder;
use dupemover::output::{RunReport, TextOutput};
use dupemover::state::SeenSet;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn no_retry() -> MoveConfig {
    MoveConfig::default().with_retry(RetryPolicy::none())
}

#[test]
fn test_hello_world_scenario() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::write(dir.path().join("c.txt"), "world").unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();
    assert_eq!(outcome.pairs.len(), 1);
    assert!(outcome.pairs[0].original.ends_with("a.txt"));
    assert!(outcome.pairs[0].duplicate.ends_with("b.txt"));

    let mover = QuarantineMover::new(&outcome.quarantine_dir, no_retry());
    let moves = mover
        .move_batch::<NoProgress>(&outcome.pairs, None)
        .unwrap();

    let moved = dir.path().join("duplicates").join("1_b.txt");
    assert_eq!(fs::read_to_string(&moved).unwrap(), "hello");
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
    assert!(dir.path().join("c.txt").exists());

    let report = RunReport::new(&outcome, moves);
    let text = TextOutput::new(&report).render();
    assert!(text.contains("1 set of identical files moved"));
}

#[test]
fn test_same_basename_duplicates_both_survive() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("clip.mp4"), "frames").unwrap();
    for sub in ["x", "y"] {
        fs::create_dir(dir.path().join(sub)).unwrap();
        fs::write(dir.path().join(sub).join("clip.mp4"), "frames").unwrap();
    }

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();
    assert_eq!(outcome.pairs.len(), 2);

    let mover = QuarantineMover::new(&outcome.quarantine_dir, no_retry());
    let moves = mover
        .move_batch::<NoProgress>(&outcome.pairs, None)
        .unwrap();
    assert!(moves.all_succeeded());

    let mut names: Vec<String> = fs::read_dir(quarantine_dir(dir.path()))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["1_clip.mp4", "2_clip.mp4"]);
}

#[test]
fn test_vanished_duplicate_does_not_stop_the_batch() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::write(dir.path().join("c.txt"), "hello").unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();
    fs::remove_file(dir.path().join("b.txt")).unwrap();

    let mover = QuarantineMover::new(&outcome.quarantine_dir, no_retry());
    let moves = mover
        .move_batch::<NoProgress>(&outcome.pairs, None)
        .unwrap();

    assert_eq!(moves.failure_count(), 1);
    assert_eq!(moves.success_count(), 1);
    assert!(dir.path().join("duplicates/2_c.txt").exists());
}

#[test]
fn test_missing_source_is_not_retried() {
    let dir = tempdir().unwrap();
    let policy = RetryPolicy {
        max_attempts: 5,
        backoff: Duration::from_secs(2),
    };

    let start = Instant::now();
    let err = move_file(
        &dir.path().join("gone.txt"),
        &dir.path().join("dest.txt"),
        &policy,
    )
    .unwrap_err();

    assert!(matches!(err, MoveError::NotFound(_)));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[cfg(unix)]
#[test]
fn test_retries_exhausted_on_read_only_folder() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let src_dir = dir.path().join("src");
    fs::create_dir(&src_dir).unwrap();
    let from = src_dir.join("b.txt");
    fs::write(&from, "hello").unwrap();

    let dest_dir = dir.path().join("dest");
    fs::create_dir(&dest_dir).unwrap();
    fs::set_permissions(&dest_dir, fs::Permissions::from_mode(0o555)).unwrap();

    // Root bypasses directory permissions.
    if fs::write(dest_dir.join("probe"), "x").is_ok() {
        fs::set_permissions(&dest_dir, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let policy = RetryPolicy {
        max_attempts: 2,
        backoff: Duration::from_millis(1),
    };
    let result = move_file(&from, &dest_dir.join("1_b.txt"), &policy);
    fs::set_permissions(&dest_dir, fs::Permissions::from_mode(0o755)).unwrap();

    match result {
        Err(MoveError::RetriesExhausted { path, attempts, .. }) => {
            assert_eq!(path, from);
            assert_eq!(attempts, 2);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(from.exists());
}

#[test]
fn test_second_run_numbers_after_first() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();
    QuarantineMover::new(&outcome.quarantine_dir, no_retry())
        .move_batch::<NoProgress>(&outcome.pairs, None)
        .unwrap();

    fs::write(dir.path().join("e.txt"), "later").unwrap();
    fs::write(dir.path().join("f.txt"), "later").unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), outcome.seen)
        .unwrap();
    assert_eq!(outcome.pairs.len(), 1);

    let moves = QuarantineMover::new(&outcome.quarantine_dir, no_retry())
        .move_batch::<NoProgress>(&outcome.pairs, None)
        .unwrap();
    assert_eq!(moves.successes[0].sequence, 2);
    assert!(Path::new(&dir.path().join("duplicates/2_f.txt")).exists());
    assert!(dir.path().join("duplicates/1_b.txt").exists());
}
