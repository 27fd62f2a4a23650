//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - The per-run size index (one retained candidate per byte size)
//! - Duplicate pair discovery driven by a tree walk
//!
//! Files are first partitioned by exact size. A size seen for the first time
//! only records its path as the candidate for that size; later arrivals of the
//! same size are compared against that single candidate.

pub mod finder;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::scanner::FileRecord;

pub use finder::{
    DuplicateFinder, FileError, FinderConfig, FinderError, ScanOutcome, ScanStats,
};

/// A file proven byte-identical to an earlier file of the same size.
///
/// `original` is the first path observed with this size and is never moved;
/// only `duplicate` is relocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicatePair {
    /// Retained copy
    #[serde(serialize_with = "crate::scanner::serialize_path_lossy")]
    pub original: PathBuf,
    /// Redundant copy
    #[serde(serialize_with = "crate::scanner::serialize_path_lossy")]
    pub duplicate: PathBuf,
    /// Shared size in bytes
    pub size: u64,
}

impl DuplicatePair {
    /// Create a new pair.
    #[must_use]
    pub fn new(original: PathBuf, duplicate: PathBuf, size: u64) -> Self {
        Self {
            original,
            duplicate,
            size,
        }
    }
}

/// Size bucket index for a single scan.
///
/// Holds at most one path per size. Rebuilt on every run and never persisted.
#[derive(Debug, Default)]
pub struct SizeIndex {
    candidates: HashMap<u64, PathBuf>,
}

impl SizeIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly walked file.
    ///
    /// Returns the existing candidate for the file's size, or `None` after
    /// making this file the candidate. The candidate never changes once set.
    pub fn observe(&mut self, record: &FileRecord) -> Option<&PathBuf> {
        use std::collections::hash_map::Entry;

        match self.candidates.entry(record.size) {
            Entry::Occupied(entry) => Some(entry.into_mut()),
            Entry::Vacant(entry) => {
                entry.insert(record.path.clone());
                None
            }
        }
    }

    /// Number of distinct sizes seen.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.candidates.len()
    }
}
