//! Moving confirmed duplicates into the quarantine folder.
//!
//! # Overview
//!
//! This module relocates the redundant member of each duplicate pair into
//! `<root>/duplicates/`:
//! - The folder is created on the first move, not before
//! - Every moved file is renamed `<seq>_<basename>` so two duplicates with
//!   the same name never collide
//! - Existing files in the quarantine are never overwritten
//! - Transient failures are retried according to a [`RetryPolicy`]
//! - A failed pair is recorded and the batch moves on
//!
//! # Safety
//!
//! Only `DuplicatePair::duplicate` is ever moved. A pair whose two members
//! are the same path is rejected outright.
//!
//! # Example
//!
//! ```no_run
//! use dupemover::actions::quarantine::{MoveConfig, NoProgress, QuarantineMover};
//! use dupemover::duplicates::DuplicatePair;
//! use std::path::Path;
//!
//! let pairs = vec![DuplicatePair::new("/v/a.mp4".into(), "/v/b.mp4".into(), 42)];
//! let mover = QuarantineMover::for_root(Path::new("/v"), MoveConfig::default());
//! let result = mover.move_batch::<NoProgress>(&pairs, None).unwrap();
//! println!("{}", result.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::DuplicatePair;

/// Name of the quarantine folder inside the scanned root.
pub const QUARANTINE_DIR_NAME: &str = "duplicates";

/// Quarantine folder for a given root.
#[must_use]
pub fn quarantine_dir(root: &Path) -> PathBuf {
    root.join(QUARANTINE_DIR_NAME)
}

/// Error type for quarantine moves.
#[derive(Debug, Error)]
pub enum MoveError {
    /// Source file was not found (already moved or deleted externally).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when moving the file.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The destination name is already taken.
    #[error("destination already exists: {to} (not moving {from})")]
    DestinationExists { from: PathBuf, to: PathBuf },

    /// The pair names the same file twice.
    #[error("refusing to move {0}: it is its own original")]
    SelfPair(PathBuf),

    /// Every allowed attempt failed.
    #[error("giving up on {path} after {attempts} attempts: {source}")]
    RetriesExhausted {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    /// The quarantine folder cannot be created or is not a directory.
    #[error("quarantine folder {path} is unavailable: {source}")]
    QuarantineUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MoveError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::SelfPair(p) => p,
            Self::DestinationExists { from, .. } => from,
            Self::RetriesExhausted { path, .. }
            | Self::QuarantineUnavailable { path, .. }
            | Self::Io { path, .. } => path,
        }
    }

    /// Whether this error should abort the whole run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::QuarantineUnavailable { .. })
    }

    fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

/// Bounded retry policy for moves that fail transiently (e.g. a file held
/// open by another process).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per file, including the first. At least 1.
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `n * backoff` before retrying.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Delay before the attempt following `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

/// Configuration for quarantine moves.
#[derive(Debug, Clone, Default)]
pub struct MoveConfig {
    /// Retry policy per file.
    pub retry: RetryPolicy,
    /// Plan destinations without touching the filesystem.
    pub dry_run: bool,
    /// Optional shutdown flag; remaining moves are skipped once set.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl MoveConfig {
    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enable/disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A duplicate that was (or, in dry-run, would be) moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    /// The retained copy
    #[serde(serialize_with = "crate::scanner::serialize_path_lossy")]
    pub original: PathBuf,
    /// Where the duplicate was
    #[serde(serialize_with = "crate::scanner::serialize_path_lossy")]
    pub from: PathBuf,
    /// Where it is now
    #[serde(serialize_with = "crate::scanner::serialize_path_lossy")]
    pub to: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Sequence number used as the name prefix
    pub sequence: usize,
}

/// A pair that could not be moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveFailure {
    /// The duplicate that stayed in place
    #[serde(serialize_with = "crate::scanner::serialize_path_lossy")]
    pub path: PathBuf,
    /// Human-readable reason
    pub error: String,
}

/// Results of a batch move.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchMoveResult {
    /// Successful moves in discovery order.
    pub successes: Vec<MoveResult>,
    /// Failed moves.
    pub failures: Vec<MoveFailure>,
    /// Total bytes moved into quarantine.
    pub bytes_moved: u64,
    /// Whether nothing was actually moved.
    pub dry_run: bool,
    /// Whether the batch stopped early on shutdown.
    pub interrupted: bool,
}

impl BatchMoveResult {
    /// Number of successful moves.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed moves.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all moves succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "Would move" } else { "Moved" };
        if self.all_succeeded() {
            format!("{} {} file(s), {} bytes", verb, self.success_count(), self.bytes_moved)
        } else {
            format!(
                "{} {} file(s), {} failed, {} bytes",
                verb,
                self.success_count(),
                self.failure_count(),
                self.bytes_moved
            )
        }
    }
}

/// Callback trait for move progress reporting.
pub trait MoveProgressCallback: Send + Sync {
    /// Called before each move.
    fn on_before_move(&self, path: &Path, index: usize, total: usize);

    /// Called after a successful move.
    fn on_move_success(&self, result: &MoveResult);

    /// Called after a failed move.
    fn on_move_failure(&self, path: &Path, error: &str);

    /// Called when the batch completes.
    fn on_complete(&self, result: &BatchMoveResult);
}

/// Callback that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl MoveProgressCallback for NoProgress {
    fn on_before_move(&self, _: &Path, _: usize, _: usize) {}
    fn on_move_success(&self, _: &MoveResult) {}
    fn on_move_failure(&self, _: &Path, _: &str) {}
    fn on_complete(&self, _: &BatchMoveResult) {}
}

/// Moves duplicates into a single quarantine folder.
#[derive(Debug, Clone)]
pub struct QuarantineMover {
    dir: PathBuf,
    config: MoveConfig,
}

impl QuarantineMover {
    /// Create a mover targeting `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, config: MoveConfig) -> Self {
        Self {
            dir: dir.into(),
            config,
        }
    }

    /// Create a mover targeting `<root>/duplicates`.
    #[must_use]
    pub fn for_root(root: &Path, config: MoveConfig) -> Self {
        Self::new(quarantine_dir(root), config)
    }

    /// Quarantine folder path.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the quarantine folder if it does not exist.
    ///
    /// # Errors
    ///
    /// [`MoveError::QuarantineUnavailable`] if it cannot be created or a
    /// non-directory occupies its path.
    pub fn ensure_dir(&self) -> Result<(), MoveError> {
        fs::create_dir_all(&self.dir).map_err(|e| MoveError::QuarantineUnavailable {
            path: self.dir.clone(),
            source: e,
        })?;
        if !self.dir.is_dir() {
            return Err(MoveError::QuarantineUnavailable {
                path: self.dir.clone(),
                source: io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
            });
        }
        Ok(())
    }

    /// First free sequence number: one past the highest `<n>_` prefix already
    /// present in the folder, or 1 if there is none.
    #[must_use]
    pub fn next_sequence(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 1;
        };

        entries
            .filter_map(Result::ok)
            .filter_map(|entry| sequence_prefix(&entry.file_name().to_string_lossy()))
            .max()
            .map_or(1, |highest| highest.saturating_add(1))
    }

    /// Destination for a duplicate with the given sequence number.
    ///
    /// # Errors
    ///
    /// [`MoveError::Io`] if `path` has no file name.
    pub fn destination_for(&self, sequence: usize, path: &Path) -> Result<PathBuf, MoveError> {
        let name = path.file_name().ok_or_else(|| MoveError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        })?;

        let mut prefixed = std::ffi::OsString::from(format!("{sequence}_"));
        prefixed.push(name);
        Ok(self.dir.join(prefixed))
    }

    /// Move the duplicate member of every pair into quarantine.
    ///
    /// Sequence numbers follow the order of `pairs`. A failed pair keeps its
    /// number, so the numbering of the remaining pairs does not shift.
    ///
    /// # Errors
    ///
    /// Only [`MoveError::QuarantineUnavailable`]; every per-pair problem is
    /// recorded in [`BatchMoveResult::failures`] instead.
    pub fn move_batch<C: MoveProgressCallback>(
        &self,
        pairs: &[DuplicatePair],
        callback: Option<&C>,
    ) -> Result<BatchMoveResult, MoveError> {
        let mut result = BatchMoveResult {
            dry_run: self.config.dry_run,
            ..Default::default()
        };

        if pairs.is_empty() {
            return Ok(result);
        }

        if !self.config.dry_run {
            self.ensure_dir()?;
        }

        let first_sequence = self.next_sequence();
        let total = pairs.len();

        for (index, pair) in pairs.iter().enumerate() {
            if self.config.is_shutdown_requested() {
                log::info!("Shutdown requested, {} move(s) skipped", total - index);
                result.interrupted = true;
                break;
            }

            if let Some(cb) = callback {
                cb.on_before_move(&pair.duplicate, index, total);
            }

            match self.move_pair(pair, first_sequence.saturating_add(index)) {
                Ok(moved) => {
                    result.bytes_moved += moved.size;
                    if let Some(cb) = callback {
                        cb.on_move_success(&moved);
                    }
                    result.successes.push(moved);
                }
                Err(e) => {
                    let error = e.to_string();
                    log::warn!("Unable to move {}: {}", pair.duplicate.display(), error);
                    if let Some(cb) = callback {
                        cb.on_move_failure(&pair.duplicate, &error);
                    }
                    result.failures.push(MoveFailure {
                        path: pair.duplicate.clone(),
                        error,
                    });
                }
            }
        }

        if let Some(cb) = callback {
            cb.on_complete(&result);
        }

        log::info!("{}", result.summary());

        Ok(result)
    }

    fn move_pair(&self, pair: &DuplicatePair, sequence: usize) -> Result<MoveResult, MoveError> {
        if pair.original == pair.duplicate {
            return Err(MoveError::SelfPair(pair.duplicate.clone()));
        }

        let to = self.destination_for(sequence, &pair.duplicate)?;

        let size = if self.config.dry_run {
            log::info!(
                "Would move {} -> {}",
                pair.duplicate.display(),
                to.display()
            );
            pair.size
        } else {
            let size = move_file(&pair.duplicate, &to, &self.config.retry)?;
            log::info!("Moved {} -> {}", pair.duplicate.display(), to.display());
            size
        };

        Ok(MoveResult {
            original: pair.original.clone(),
            from: pair.duplicate.clone(),
            to,
            size,
            sequence,
        })
    }
}

/// Move a single file, retrying transient failures.
///
/// Never overwrites `to`. A missing source fails immediately without retry.
///
/// # Errors
///
/// - `NotFound` if `from` does not exist
/// - `DestinationExists` if `to` is taken
/// - `RetriesExhausted` if every attempt failed (only with more than one
///   attempt configured; otherwise the classified first error)
pub fn move_file(from: &Path, to: &Path, retry: &RetryPolicy) -> Result<u64, MoveError> {
    let size = fs::symlink_metadata(from)
        .map_err(|e| MoveError::from_io(from, e))?
        .len();

    if fs::symlink_metadata(to).is_ok() {
        return Err(MoveError::DestinationExists {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
    }

    let attempts = retry.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match relocate(from, to) {
            Ok(()) => return Ok(size),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MoveError::NotFound(from.to_path_buf()));
            }
            Err(e) if attempt >= attempts => {
                return Err(if attempts == 1 {
                    MoveError::from_io(from, e)
                } else {
                    MoveError::RetriesExhausted {
                        path: from.to_path_buf(),
                        attempts,
                        source: e,
                    }
                });
            }
            Err(e) => {
                let delay = retry.delay_after(attempt);
                log::debug!(
                    "Move of {} failed (attempt {}/{}): {}; retrying in {:?}",
                    from.display(),
                    attempt,
                    attempts,
                    e,
                    delay
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}

/// Rename, falling back to copy-and-remove when the rename itself is
/// refused (e.g. the quarantine sits on another mount).
fn relocate(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if matches!(
            e.kind(),
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
        ) =>
        {
            Err(e)
        }
        Err(e) => {
            log::debug!("rename failed ({}), copying {} instead", e, from.display());
            copy_then_remove(from, to)
        }
    }
}

/// Copy `from` to `to` and remove `from`. On any failure `to` is removed
/// again, so a partial copy never occupies a sequence number.
fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    let result = fs::copy(from, to).and_then(|_| fs::remove_file(from));
    if result.is_err() {
        let _ = fs::remove_file(to);
    }
    result
}

/// Numeric prefix of a quarantined file name such as `12_clip.mp4`.
fn sequence_prefix(name: &str) -> Option<usize> {
    let (digits, _) = name.split_once('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
