//! Resumable state for incremental scans.
//!
//! A run remembers every path it has classified in a [`SeenSet`]. The set is
//! loaded at start, grown in memory while scanning, and written back as a full
//! snapshot once the run completes, so the next run of the same tree only
//! examines files it has never seen.
//!
//! # Architecture
//!
//! * [`data`]: The [`SeenSet`] value itself.
//! * [`io`]: [`StateStore`], which loads and saves a set from a JSON file.
//!
//! # Concurrency
//!
//! A state file has a single writer. Two processes pointed at the same file
//! will overwrite each other's snapshot; nothing locks against that.

pub mod data;
pub mod io;

pub use data::SeenSet;
pub use io::{StateError, StateStore, DEFAULT_STATE_FILE};
