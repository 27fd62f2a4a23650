//! Layered application configuration.
//!
//! Values are merged in this order, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`<config dir>/config.toml`, or `--config FILE`)
//! 3. `DUPEMOVER_*` environment variables (`__` separates nested keys,
//!    e.g. `DUPEMOVER_RETRY__MAX_ATTEMPTS=5`)
//! 4. Command-line flags, applied by [`Config::apply_scan_args`]
//!
//! Example file:
//!
//! ```toml
//! algorithm = "sha256"
//! block_size = 1048576
//! io_threads = 2
//! skip_hidden = true
//! ignore_patterns = ["*.part"]
//!
//! [retry]
//! max_attempts = 5
//! backoff_ms = 250
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::{MoveConfig, RetryPolicy};
use crate::cli::ScanArgs;
use crate::scanner::{HashAlgorithm, Hasher, WalkerConfig, DEFAULT_BLOCK_SIZE};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DUPEMOVER_";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or has the wrong shape.
    #[error("invalid configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// A value is out of range.
    #[error("invalid configuration value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },

    /// The effective configuration could not be rendered as TOML.
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Move retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per file, including the first.
    pub max_attempts: u32,
    /// Base delay between attempts in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            backoff_ms: u64::try_from(policy.backoff.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Effective configuration for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fingerprint algorithm.
    pub algorithm: HashAlgorithm,
    /// Read block size in bytes.
    pub block_size: usize,
    /// Size buckets compared in parallel.
    pub io_threads: usize,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Skip zero-byte files.
    pub skip_empty: bool,
    /// Gitignore-style exclusions.
    pub ignore_patterns: Vec<String>,
    /// State file location; platform default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
    /// Move retry settings.
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            io_threads: 1,
            follow_symlinks: false,
            skip_hidden: false,
            skip_empty: false,
            ignore_patterns: Vec::new(),
            state_file: None,
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Load defaults, the config file and environment overrides.
    ///
    /// `custom` replaces the default file location and must exist. The
    /// default file is optional.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if a layer cannot be parsed or a value is invalid.
    pub fn load(custom: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match custom {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound(path.to_path_buf()))
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };

        if let Some(ref path) = file {
            log::debug!("Reading configuration from {}", path.display());
        }
        Self::extract(Self::layered(file.as_deref(), ENV_PREFIX))
    }

    /// Load from a single TOML file over the defaults, ignoring the
    /// environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the file cannot be parsed or a value is invalid.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::extract(
            Figment::from(Serialized::defaults(Self::default())).merge(Toml::file(path)),
        )
    }

    /// Defaults, then the optional file, then variables with `env_prefix`.
    #[must_use]
    pub fn layered(file: Option<&Path>, env_prefix: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(env_prefix).split("__"))
    }

    /// Extract and validate a configuration from `figment`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Extract`] or [`ConfigError::Invalid`].
    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Platform config file location, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupemover", "dupemover")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Reject values that would make a run meaningless.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::Invalid {
                field: "block_size",
                reason: "must be at least 1 byte".to_string(),
            });
        }
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "io_threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "retry.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Apply `scan` flags on top of the loaded layers, then re-validate.
    ///
    /// Boolean flags can only switch a setting on. Ignore patterns are
    /// appended to the configured ones.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if a flag value is out of range.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) -> Result<(), ConfigError> {
        if let Some(algorithm) = args.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(block_size) = args.block_size {
            self.block_size = usize::try_from(block_size).map_err(|_| ConfigError::Invalid {
                field: "block_size",
                reason: format!("{block_size} does not fit in memory"),
            })?;
        }
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }
        if let Some(retries) = args.retries {
            self.retry.max_attempts = retries;
        }
        if let Some(backoff) = args.retry_backoff_ms {
            self.retry.backoff_ms = backoff;
        }
        if let Some(ref state) = args.state.path {
            self.state_file = Some(state.clone());
        }
        self.follow_symlinks |= args.follow_symlinks;
        self.skip_hidden |= args.skip_hidden;
        self.skip_empty |= args.skip_empty;
        self.ignore_patterns
            .extend(args.ignore_patterns.iter().cloned());

        self.validate()
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            follow_symlinks: self.follow_symlinks,
            skip_hidden: self.skip_hidden,
            skip_empty: self.skip_empty,
            ignore_patterns: self.ignore_patterns.clone(),
            excluded_dirs: Vec::new(),
        }
    }

    /// Hasher for content comparisons.
    #[must_use]
    pub fn hasher(&self) -> Hasher {
        Hasher::new()
            .with_algorithm(self.algorithm)
            .with_block_size(self.block_size)
    }

    /// Retry policy for quarantine moves.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            backoff: Duration::from_millis(self.retry.backoff_ms),
        }
    }

    /// Mover settings for a run.
    #[must_use]
    pub fn move_config(&self, dry_run: bool, shutdown: Arc<AtomicBool>) -> MoveConfig {
        MoveConfig::default()
            .with_retry(self.retry_policy())
            .with_dry_run(dry_run)
            .with_shutdown_flag(shutdown)
    }
}
