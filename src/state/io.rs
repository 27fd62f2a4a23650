//! Loading and saving the seen-set.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

use crate::state::data::SeenSet;

/// File name used when no state path is configured.
pub const DEFAULT_STATE_FILE: &str = "processed_files.json";

/// Errors from reading or writing the state file.
#[derive(Debug, Error)]
pub enum StateError {
    /// The file exists but is not a JSON list of paths.
    #[error("state file {path} is unreadable as a list of paths: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file exists but could not be read.
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot could not be written.
    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The set could not be serialized (e.g. a path that is not valid UTF-8).
    #[error("failed to serialize state")]
    Serialize(#[source] serde_json::Error),
}

impl StateError {
    /// Whether this is a parse failure of an existing file.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// JSON-file backed store for a [`SeenSet`].
///
/// Every save is a full snapshot; there is no append mode. The store assumes
/// it is the only writer of its file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store backed by `path`. Nothing is touched until load/save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the platform default location.
    #[must_use]
    pub fn at_default_location() -> Self {
        Self::new(Self::default_path())
    }

    /// Platform data directory location, or the working directory if none.
    #[must_use]
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("com", "dupemover", "dupemover")
            .map(|dirs| dirs.data_dir().join(DEFAULT_STATE_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted set. A missing file yields an empty set.
    ///
    /// # Errors
    ///
    /// [`StateError::Corrupt`] if the file does not parse, [`StateError::Read`]
    /// if it exists but cannot be read.
    pub fn load(&self) -> Result<SeenSet, StateError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!(
                    "No state file at {}, starting fresh",
                    self.path.display()
                );
                return Ok(SeenSet::new());
            }
            Err(e) => {
                return Err(StateError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let seen: SeenSet =
            serde_json::from_str(&content).map_err(|e| StateError::Corrupt {
                path: self.path.clone(),
                source: e,
            })?;

        log::debug!(
            "Loaded {} seen paths from {}",
            seen.len(),
            self.path.display()
        );
        Ok(seen)
    }

    /// Load the set, discarding a corrupt file when `reset_corrupt` is set.
    ///
    /// The discard is logged as a warning. The corrupt file itself is left in
    /// place until the next save overwrites it.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), except that `Corrupt` is swallowed when
    /// `reset_corrupt` is true.
    pub fn load_or_reset(&self, reset_corrupt: bool) -> Result<SeenSet, StateError> {
        match self.load() {
            Err(e) if reset_corrupt && e.is_corrupt() => {
                log::warn!("{}; discarding it and starting with an empty state", e);
                Ok(SeenSet::new())
            }
            other => other,
        }
    }

    /// Write `seen` as a full snapshot, replacing any previous content.
    ///
    /// The snapshot goes to a sibling temporary file first and is renamed
    /// over the target, so an interrupted save leaves the old file intact.
    ///
    /// # Errors
    ///
    /// [`StateError::Serialize`] or [`StateError::Write`].
    pub fn save(&self, seen: &SeenSet) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(seen).map_err(StateError::Serialize)?;
        let write_err = |source| StateError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp = self.temp_path();
        let mut file = fs::File::create(&tmp).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            write_err(e)
        })?;

        log::debug!("Saved {} seen paths to {}", seen.len(), self.path.display());
        Ok(())
    }

    /// Remove the state file. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// [`StateError::Write`] if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<bool, StateError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StateError::Write {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_STATE_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
