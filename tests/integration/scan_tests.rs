use dupemover::duplicates::{DuplicateFinder, FinderConfig};
use dupemover::scanner::{HashAlgorithm, Hasher, WalkerConfig};
use dupemover::state::SeenSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path.canonicalize().unwrap()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();

    assert!(outcome.pairs.is_empty());
    assert_eq!(outcome.stats.files_walked, 0);
    assert!(outcome.seen.is_empty());
}

#[test]
fn test_different_sizes_never_pair() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.bin", b"a");
    write(dir.path(), "b.bin", b"aa");
    write(dir.path(), "c.bin", b"aaa");

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();

    assert!(outcome.pairs.is_empty());
    assert_eq!(outcome.stats.size_buckets, 3);
    assert_eq!(outcome.stats.comparisons, 0);
    assert_eq!(outcome.seen.len(), 3);
}

#[test]
fn test_same_size_different_content() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"hello");
    write(dir.path(), "b.txt", b"world");

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();

    assert!(outcome.pairs.is_empty());
    assert_eq!(outcome.stats.comparisons, 1);
    assert_eq!(outcome.seen.len(), 2);
}

#[test]
fn test_identical_pair_in_walk_order() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"hello");
    let b = write(dir.path(), "b.txt", b"hello");
    write(dir.path(), "c.txt", b"world");

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();

    assert_eq!(outcome.pairs.len(), 1);
    assert_eq!(outcome.pairs[0].original, a);
    assert_eq!(outcome.pairs[0].duplicate, b);
    assert_eq!(outcome.pairs[0].size, 5);
}

#[test]
fn test_nested_directories() {
    let dir = tempdir().unwrap();
    let first = write(dir.path(), "album/2019/clip.mov", b"frame data");
    let second = write(dir.path(), "backup/clip.mov", b"frame data");

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();

    assert_eq!(outcome.pairs.len(), 1);
    assert_eq!(outcome.pairs[0].original, first);
    assert_eq!(outcome.pairs[0].duplicate, second);
}

#[test]
fn test_three_copies_all_compared_with_first() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"same");
    write(dir.path(), "b.txt", b"same");
    write(dir.path(), "c.txt", b"same");

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();

    assert_eq!(outcome.pairs.len(), 2);
    assert!(outcome.pairs.iter().all(|p| p.original == a));
}

#[test]
fn test_seen_paths_are_not_revisited() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", b"hello");
    let b = write(dir.path(), "b.txt", b"hello");
    write(dir.path(), "d.txt", b"hello");

    let seen: SeenSet = [a, b].into_iter().collect();
    let outcome = DuplicateFinder::with_defaults().find(dir.path(), seen).unwrap();

    // d.txt becomes the candidate for its size; the earlier runs' candidate
    // is not brought back.
    assert!(outcome.pairs.is_empty());
    assert_eq!(outcome.stats.already_seen, 2);
    assert_eq!(outcome.stats.new_files, 1);
    assert_eq!(outcome.seen.len(), 3);
}

#[test]
fn test_quarantine_contents_are_never_scanned() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"hello");
    write(dir.path(), "duplicates/1_b.txt", b"hello");

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();

    assert!(outcome.pairs.is_empty());
    assert_eq!(outcome.stats.files_walked, 1);
    assert!(outcome
        .seen
        .iter()
        .all(|p| !p.starts_with(&outcome.quarantine_dir)));
}

#[test]
fn test_nested_duplicates_folder_is_scanned() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"hello");
    let nested = write(dir.path(), "sub/duplicates/b.txt", b"hello");

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();

    assert_eq!(outcome.pairs.len(), 1);
    assert_eq!(outcome.pairs[0].duplicate, nested);
}

#[test]
fn test_sha256_finds_the_same_pairs() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.bin", &[7u8; 100_000]);
    write(dir.path(), "b.bin", &[7u8; 100_000]);
    let mut other = vec![7u8; 100_000];
    other[99_999] = 8;
    write(dir.path(), "c.bin", &other);

    let hasher = Hasher::new()
        .with_algorithm(HashAlgorithm::Sha256)
        .with_block_size(4096);
    let finder = DuplicateFinder::new(FinderConfig::default(), Arc::new(hasher));
    let outcome = finder.find(dir.path(), SeenSet::new()).unwrap();

    assert_eq!(outcome.pairs.len(), 1);
    assert!(outcome.pairs[0].duplicate.ends_with("b.bin"));
}

#[test]
fn test_ignore_patterns_and_hidden() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.mp4", b"video");
    write(dir.path(), "a.mp4.part", b"video");
    write(dir.path(), ".cache/a.mp4", b"video");

    let walker_config = WalkerConfig {
        skip_hidden: true,
        ignore_patterns: vec!["*.part".to_string()],
        ..Default::default()
    };
    let finder = DuplicateFinder::new(
        FinderConfig::default().with_walker_config(walker_config),
        Arc::new(Hasher::new()),
    );
    let outcome = finder.find(dir.path(), SeenSet::new()).unwrap();

    assert!(outcome.pairs.is_empty());
    assert_eq!(outcome.stats.files_walked, 1);
}

#[test]
fn test_empty_files_pair_unless_skipped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "empty1", b"");
    write(dir.path(), "empty2", b"");

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();
    assert_eq!(outcome.pairs.len(), 1);

    let walker_config = WalkerConfig {
        skip_empty: true,
        ..Default::default()
    };
    let finder = DuplicateFinder::new(
        FinderConfig::default().with_walker_config(walker_config),
        Arc::new(Hasher::new()),
    );
    let outcome = finder.find(dir.path(), SeenSet::new()).unwrap();
    assert!(outcome.pairs.is_empty());
    assert_eq!(outcome.stats.files_walked, 0);
}

#[test]
fn test_parallel_buckets_keep_discovery_order() {
    let dir = tempdir().unwrap();
    for i in 0..8 {
        let content = vec![b'x'; i + 1];
        write(dir.path(), &format!("{i}_a.bin"), &content);
        write(dir.path(), &format!("{i}_b.bin"), &content);
    }

    let sequential = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();
    let parallel = DuplicateFinder::new(
        FinderConfig::default().with_io_threads(4),
        Arc::new(Hasher::new()),
    )
    .find(dir.path(), SeenSet::new())
    .unwrap();

    assert_eq!(sequential.pairs.len(), 8);
    assert_eq!(sequential.pairs, parallel.pairs);
    assert_eq!(sequential.seen, parallel.seen);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped_and_remembered() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"hello");
    let locked = write(dir.path(), "b.txt", b"hello");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits; nothing to observe then.
    if fs::File::open(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let outcome = DuplicateFinder::with_defaults()
        .find(dir.path(), SeenSet::new())
        .unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert!(outcome.pairs.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].path(), locked.as_path());
    assert!(outcome.seen.contains(&locked));
    assert_eq!(outcome.seen.len(), 2);
}
