//! JSON report for scripting.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2024-05-01T10:00:00Z",
//!   "root": "/media/videos",
//!   "quarantine_dir": "/media/videos/duplicates",
//!   "dry_run": false,
//!   "interrupted": false,
//!   "exit_code": 0,
//!   "exit_code_name": "DM000",
//!   "sets_moved": 1,
//!   "pairs": [{ "original": "...", "duplicate": "...", "size": 5 }],
//!   "moved": [{ "original": "...", "from": "...", "to": "...", "size": 5, "sequence": 1 }],
//!   "failures": [],
//!   "skipped": [],
//!   "stats": { "files_walked": 3, "...": 0 }
//! }
//! ```

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{RunReport, SkippedFile};
use crate::actions::{MoveFailure, MoveResult};
use crate::duplicates::{DuplicatePair, ScanStats};

/// Serializable view of a [`RunReport`].
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// When the report was produced
    pub generated_at: DateTime<Utc>,
    /// Scanned root
    #[serde(serialize_with = "crate::scanner::serialize_path_lossy")]
    pub root: &'a Path,
    /// Quarantine folder
    #[serde(serialize_with = "crate::scanner::serialize_path_lossy")]
    pub quarantine_dir: &'a Path,
    /// Whether moves were only planned
    pub dry_run: bool,
    /// Whether the run was cut short
    pub interrupted: bool,
    /// Numeric exit code
    pub exit_code: i32,
    /// Machine-readable exit code (e.g. "DM000")
    pub exit_code_name: &'static str,
    /// Number of sets moved
    pub sets_moved: usize,
    /// Pairs found
    pub pairs: &'a [DuplicatePair],
    /// Completed (or planned) moves
    pub moved: &'a [MoveResult],
    /// Moves that failed
    pub failures: &'a [MoveFailure],
    /// Files skipped during the scan
    pub skipped: &'a [SkippedFile],
    /// Scan counters
    pub stats: &'a ScanStats,
}

impl<'a> JsonOutput<'a> {
    /// Build the JSON view of `report`.
    #[must_use]
    pub fn new(report: &'a RunReport) -> Self {
        let exit_code = report.exit_code();
        Self {
            generated_at: Utc::now(),
            root: &report.root,
            quarantine_dir: &report.quarantine_dir,
            dry_run: report.moves.dry_run,
            interrupted: report.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
            sets_moved: report.sets_moved(),
            pairs: &report.pairs,
            moved: &report.moves.successes,
            failures: &report.moves.failures,
            skipped: &report.skipped,
            stats: &report.stats,
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        let json = self.to_json_pretty()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error while writing JSON report: {0}")]
    Io(#[from] std::io::Error),
}
