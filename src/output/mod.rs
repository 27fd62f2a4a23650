//! Run reports and their renderers.
//!
//! A [`RunReport`] gathers everything one `scan` produced: the pairs found,
//! what the mover did with them, per-file problems and counters. It decides
//! the process exit code and is rendered either as a short human summary
//! ([`text::TextOutput`]) or as a JSON document ([`json::JsonOutput`]).
//!
//! # Example
//!
//! ```no_run
//! use dupemover::actions::{MoveConfig, NoProgress, QuarantineMover};
//! use dupemover::duplicates::DuplicateFinder;
//! use dupemover::output::{text::TextOutput, RunReport};
//! use dupemover::state::SeenSet;
//! use std::path::Path;
//!
//! let outcome = DuplicateFinder::with_defaults()
//!     .find(Path::new("/media/videos"), SeenSet::new())
//!     .unwrap();
//! let mover = QuarantineMover::new(&outcome.quarantine_dir, MoveConfig::default());
//! let moves = mover.move_batch::<NoProgress>(&outcome.pairs, None).unwrap();
//!
//! let report = RunReport::new(&outcome, moves);
//! print!("{}", TextOutput::new(&report).render());
//! ```

pub mod json;
pub mod text;

use std::path::PathBuf;

use serde::Serialize;

use crate::actions::BatchMoveResult;
use crate::duplicates::{DuplicatePair, ScanOutcome, ScanStats};
use crate::error::ExitCode;

pub use json::JsonOutput;
pub use text::TextOutput;

/// A file the scan had to skip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    /// Path of the file
    #[serde(serialize_with = "crate::scanner::serialize_path_lossy")]
    pub path: PathBuf,
    /// Why it was skipped
    pub error: String,
}

/// Result of one scan-and-move run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Scanned root
    #[serde(serialize_with = "crate::scanner::serialize_path_lossy")]
    pub root: PathBuf,
    /// Quarantine folder
    #[serde(serialize_with = "crate::scanner::serialize_path_lossy")]
    pub quarantine_dir: PathBuf,
    /// Pairs found, in discovery order
    pub pairs: Vec<DuplicatePair>,
    /// What the mover did with them
    pub moves: BatchMoveResult,
    /// Files skipped during the scan
    pub skipped: Vec<SkippedFile>,
    /// Scan counters
    pub stats: ScanStats,
    /// Whether Ctrl+C cut the run short
    pub interrupted: bool,
}

impl RunReport {
    /// Combine a scan outcome with the mover's result.
    #[must_use]
    pub fn new(outcome: &ScanOutcome, moves: BatchMoveResult) -> Self {
        Self {
            root: outcome.root.clone(),
            quarantine_dir: outcome.quarantine_dir.clone(),
            pairs: outcome.pairs.clone(),
            interrupted: outcome.interrupted || moves.interrupted,
            moves,
            skipped: outcome
                .errors
                .iter()
                .map(|e| SkippedFile {
                    path: e.path().to_path_buf(),
                    error: e.to_string(),
                })
                .collect(),
            stats: outcome.stats.clone(),
        }
    }

    /// Number of duplicate sets moved (or planned, in dry-run).
    #[must_use]
    pub fn sets_moved(&self) -> usize {
        self.moves.success_count()
    }

    /// Whether any file or move failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.skipped.is_empty() || !self.moves.all_succeeded()
    }

    /// Process exit code for this run.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.interrupted {
            ExitCode::Interrupted
        } else if self.has_failures() {
            ExitCode::PartialSuccess
        } else if self.pairs.is_empty() {
            ExitCode::NoDuplicates
        } else {
            ExitCode::Success
        }
    }
}
