use clap::Parser;
use dupemover::cli::Cli;
use dupemover::error::ExitCode;
use dupemover::state::StateStore;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn run(root: &Path, state: &Path, extra: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec![
        "dupemover".to_string(),
        "-q".to_string(),
        "scan".to_string(),
        root.to_string_lossy().into_owned(),
        "--state".to_string(),
        state.to_string_lossy().into_owned(),
        "--retries".to_string(),
        "1".to_string(),
    ];
    argv.extend(extra.iter().map(|s| (*s).to_string()));
    dupemover::run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_scan_moves_and_remembers() {
    let root = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let state = state_dir.path().join("state.json");
    fs::write(root.path().join("a.txt"), "hello").unwrap();
    fs::write(root.path().join("b.txt"), "hello").unwrap();
    fs::write(root.path().join("c.txt"), "world").unwrap();

    assert_eq!(run(root.path(), &state, &[]).unwrap(), ExitCode::Success);
    assert_eq!(
        fs::read_to_string(root.path().join("duplicates/1_b.txt")).unwrap(),
        "hello"
    );
    assert_eq!(StateStore::new(&state).load().unwrap().len(), 3);

    assert_eq!(
        run(root.path(), &state, &[]).unwrap(),
        ExitCode::NoDuplicates
    );
    assert!(!root.path().join("duplicates/2_b.txt").exists());
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_file_name_does_not_abort_run() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let root = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let state = state_dir.path().join("state.json");
    fs::write(root.path().join("a.txt"), "hello").unwrap();
    fs::write(root.path().join("b.txt"), "hello").unwrap();
    fs::write(root.path().join(OsStr::from_bytes(b"odd\xff.txt")), "unique!").unwrap();

    assert_eq!(run(root.path(), &state, &[]).unwrap(), ExitCode::Success);
    assert!(root.path().join("duplicates/1_b.txt").exists());

    let seen = StateStore::new(&state).load().unwrap();
    assert_eq!(seen.len(), 2);

    // The file left out of the snapshot is examined again and is still unique.
    assert_eq!(
        run(root.path(), &state, &[]).unwrap(),
        ExitCode::NoDuplicates
    );
}

#[test]
fn test_new_duplicate_of_earlier_file_is_not_detected() {
    let root = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let state = state_dir.path().join("state.json");
    fs::write(root.path().join("a.txt"), "hello").unwrap();

    assert_eq!(
        run(root.path(), &state, &[]).unwrap(),
        ExitCode::NoDuplicates
    );

    fs::write(root.path().join("d.txt"), "hello").unwrap();
    assert_eq!(
        run(root.path(), &state, &[]).unwrap(),
        ExitCode::NoDuplicates
    );
    assert!(root.path().join("d.txt").exists());
}

#[test]
fn test_dry_run_changes_nothing() {
    let root = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let state = state_dir.path().join("state.json");
    fs::write(root.path().join("a.txt"), "hello").unwrap();
    fs::write(root.path().join("b.txt"), "hello").unwrap();

    assert_eq!(
        run(root.path(), &state, &["--dry-run"]).unwrap(),
        ExitCode::Success
    );
    assert!(root.path().join("b.txt").exists());
    assert!(!root.path().join("duplicates").exists());
    assert!(!state.exists());
}

#[test]
fn test_no_state_leaves_no_file() {
    let root = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let state = state_dir.path().join("state.json");
    fs::write(root.path().join("a.txt"), "x").unwrap();

    assert_eq!(
        run(root.path(), &state, &["--no-state"]).unwrap(),
        ExitCode::NoDuplicates
    );
    assert!(!state.exists());
}

#[test]
fn test_corrupt_state_is_fatal_without_reset() {
    let root = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let state = state_dir.path().join("state.json");
    fs::write(&state, "not json").unwrap();
    fs::write(root.path().join("a.txt"), "hello").unwrap();
    fs::write(root.path().join("b.txt"), "hello").unwrap();

    let err = run(root.path(), &state, &[]).unwrap_err();
    assert!(format!("{err:#}").contains("state"));
    assert!(root.path().join("b.txt").exists());
    assert_eq!(fs::read_to_string(&state).unwrap(), "not json");

    assert_eq!(
        run(root.path(), &state, &["--reset-state"]).unwrap(),
        ExitCode::Success
    );
    assert_eq!(StateStore::new(&state).load().unwrap().len(), 2);
}

#[test]
fn test_missing_root_is_fatal_and_saves_nothing() {
    let dir = tempdir().unwrap();
    let state = dir.path().join("state.json");

    let result = run(&dir.path().join("nope"), &state, &[]);
    assert!(result.is_err());
    assert!(!state.exists());
}

#[test]
fn test_json_output_and_sha256() {
    let root = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let state = state_dir.path().join("state.json");
    fs::write(root.path().join("a.bin"), [1u8; 2048]).unwrap();
    fs::write(root.path().join("b.bin"), [1u8; 2048]).unwrap();

    let code = run(
        root.path(),
        &state,
        &[
            "--output",
            "json",
            "--algorithm",
            "sha256",
            "--block-size",
            "512",
            "--io-threads",
            "2",
        ],
    )
    .unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(root.path().join("duplicates/1_b.bin").exists());
}

#[test]
fn test_state_show_and_clear() {
    let root = tempdir().unwrap();
    let state_dir = tempdir().unwrap();
    let state = state_dir.path().join("state.json");
    fs::write(root.path().join("a.txt"), "x").unwrap();
    run(root.path(), &state, &[]).unwrap();
    assert!(state.exists());

    let state_arg = state.to_string_lossy().into_owned();
    let show = Cli::try_parse_from(["dupemover", "state", "show", "--state", &state_arg]).unwrap();
    assert_eq!(dupemover::run_app(show).unwrap(), ExitCode::Success);

    let clear =
        Cli::try_parse_from(["dupemover", "state", "clear", "--state", &state_arg]).unwrap();
    assert_eq!(dupemover::run_app(clear).unwrap(), ExitCode::Success);
    assert!(!state.exists());
}

#[test]
fn test_invalid_config_file_is_fatal() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "retry = { max_attempts = 0 }").unwrap();
    let config_arg = config.to_string_lossy().into_owned();

    let cli = Cli::try_parse_from(["dupemover", "--config", &config_arg, "config"]).unwrap();
    let err = dupemover::run_app(cli).unwrap_err();
    assert!(format!("{err:#}").contains("max_attempts"));
}
