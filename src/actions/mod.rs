//! File actions module.
//!
//! This module provides the one filesystem mutation the tool performs:
//! moving confirmed duplicates into the quarantine folder.
//!
//! # Quarantine
//!
//! - Duplicates go to `<root>/duplicates/<seq>_<basename>`
//! - The original copy is never touched
//! - Existing quarantine entries are never overwritten
//! - Transient failures are retried with a linear backoff
//! - Dry-run mode plans destinations without moving anything
//!
//! ```no_run
//! use dupemover::actions::{quarantine_dir, MoveConfig, NoProgress, QuarantineMover};
//! use std::path::Path;
//!
//! let root = Path::new("/media/videos");
//! let mover = QuarantineMover::new(quarantine_dir(root), MoveConfig::default());
//! let result = mover.move_batch::<NoProgress>(&[], None).unwrap();
//! assert_eq!(result.success_count(), 0);
//! ```

pub mod quarantine;

pub use quarantine::{
    move_file, quarantine_dir, BatchMoveResult, MoveConfig, MoveError, MoveFailure,
    MoveProgressCallback, MoveResult, NoProgress, QuarantineMover, RetryPolicy,
    QUARANTINE_DIR_NAME,
};
