use dupemover::config::{Config, RetryConfig};
use dupemover::scanner::HashAlgorithm;
use figment::providers::Serialized;
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_defaults_extract() {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.algorithm, HashAlgorithm::Blake3);
    assert!(config.state_file.is_none());
}

#[test]
fn test_config_load_from_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
algorithm = "sha256"
block_size = 1048576
follow_symlinks = true
state_file = "/var/lib/dupemover/state.json"

[retry]
max_attempts = 10
backoff_ms = 50
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.algorithm, HashAlgorithm::Sha256);
    assert_eq!(config.block_size, 1_048_576);
    assert!(config.follow_symlinks);
    assert_eq!(
        config.state_file,
        Some(PathBuf::from("/var/lib/dupemover/state.json"))
    );
    assert_eq!(
        config.retry,
        RetryConfig {
            max_attempts: 10,
            backoff_ms: 50
        }
    );
}

#[test]
fn test_config_unknown_algorithm_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "algorithm = \"md5\"").unwrap();

    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn test_config_render_contains_sections() {
    let rendered = Config::default().to_toml().unwrap();
    assert!(rendered.contains("block_size = 65536"));
    assert!(rendered.contains("[retry]"));
    assert!(rendered.contains("max_attempts = 3"));
}
