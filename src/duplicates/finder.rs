//! Size-bucketed duplicate finder.
//!
//! # Overview
//!
//! The finder walks a root directory once and classifies every file it has
//! not seen in an earlier run:
//!
//! 1. **Walk** - Enumerate regular files in sorted order, with the
//!    quarantine folder pruned from the traversal.
//! 2. **Index** - The first file of each byte size becomes that size's
//!    candidate. Any later file of the same size is queued for comparison
//!    against the candidate.
//! 3. **Compare** - Queued comparisons run through a [`ContentComparator`].
//!    Comparisons within one size bucket always run one after another; with
//!    more than one I/O thread, different buckets run in parallel.
//!
//! Results come back in walk order no matter how comparisons were scheduled.
//!
//! # Example
//!
//! ```no_run
//! use dupemover::duplicates::DuplicateFinder;
//! use dupemover::state::SeenSet;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let outcome = finder.find(Path::new("/media/videos"), SeenSet::new()).unwrap();
//!
//! for pair in &outcome.pairs {
//!     println!("{} duplicates {}", pair.duplicate.display(), pair.original.display());
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use super::{DuplicatePair, SizeIndex};
use crate::actions::quarantine_dir;
use crate::progress::ProgressCallback;
use crate::scanner::{ContentComparator, HashError, Hasher, ScanError, Walker, WalkerConfig};
use crate::state::SeenSet;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of size buckets compared concurrently. 1 means fully sequential.
    pub io_threads: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 1,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set how many size buckets may be compared at once.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Counters collected during one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Regular files yielded by the walk
    pub files_walked: usize,
    /// Files skipped because an earlier run already classified them
    pub already_seen: usize,
    /// Files examined for the first time
    pub new_files: usize,
    /// Distinct sizes among new files
    pub size_buckets: usize,
    /// Content comparisons actually performed
    pub comparisons: usize,
    /// Bytes read while comparing
    pub bytes_compared: u64,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// A per-file problem that was recorded and skipped.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// The file could not be listed or stat'ed.
    #[error(transparent)]
    Walk(#[from] ScanError),

    /// The file could not be read for comparison.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl FileError {
    /// Path of the skipped file.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Walk(e) => e.path(),
            Self::Hash(e) => e.path(),
        }
    }
}

/// Everything a scan produced.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Canonical root that was scanned
    pub root: PathBuf,
    /// Quarantine folder excluded from the walk
    pub quarantine_dir: PathBuf,
    /// Duplicate pairs in discovery order
    pub pairs: Vec<DuplicatePair>,
    /// Input seen-set plus every path visited by this scan
    pub seen: SeenSet,
    /// Files that were skipped because of errors
    pub errors: Vec<FileError>,
    /// Scan counters
    pub stats: ScanStats,
    /// Whether the scan stopped early on a shutdown request
    pub interrupted: bool,
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The provided root does not exist.
    #[error("Path not found: {0}")]
    RootNotFound(PathBuf),

    /// The provided root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root exists but cannot be read.
    #[error("Cannot access {path}: {source}")]
    RootInaccessible {
        /// Root path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The comparison thread pool could not be created.
    #[error("Failed to build comparison thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A scheduled candidate/newcomer comparison.
#[derive(Debug)]
struct Comparison {
    order: usize,
    size: u64,
    candidate: PathBuf,
    current: PathBuf,
}

#[derive(Debug)]
enum Verdict {
    Identical,
    Different,
    Failed(HashError),
    Skipped,
}

/// Duplicate finder driving walk, size index and comparisons.
pub struct DuplicateFinder {
    config: FinderConfig,
    comparator: Arc<dyn ContentComparator>,
}

impl DuplicateFinder {
    /// Create a finder using `comparator` to confirm equal content.
    #[must_use]
    pub fn new(config: FinderConfig, comparator: Arc<dyn ContentComparator>) -> Self {
        Self { config, comparator }
    }

    /// Create a finder with default configuration and a BLAKE3 hasher.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default(), Arc::new(Hasher::new()))
    }

    /// Scan `root`, skipping every path already in `seen`.
    ///
    /// The returned outcome owns the updated seen-set. Every newly visited
    /// file is added to it as soon as the walk reaches it, including a file
    /// whose comparison then fails.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if the root is missing, not a directory or not
    /// readable. Per-file problems never abort the scan; they are collected
    /// in [`ScanOutcome::errors`].
    pub fn find(&self, root: &Path, seen: SeenSet) -> Result<ScanOutcome, FinderError> {
        let start = Instant::now();
        let root = resolve_root(root)?;
        let quarantine = quarantine_dir(&root);

        log::info!("Scanning {}", root.display());

        let walker_config = self
            .config
            .walker_config
            .clone()
            .with_excluded_dir(quarantine.clone());
        let mut walker = Walker::new(&root, walker_config);
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut seen = seen;
        let mut stats = ScanStats::default();
        let mut errors = Vec::new();
        let mut index = SizeIndex::new();
        let mut comparisons = Vec::new();

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
        }

        for result in walker.walk() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("Skipping: {}", e);
                    errors.push(FileError::Walk(e));
                    continue;
                }
            };

            stats.files_walked += 1;
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(stats.files_walked, &record.path.to_string_lossy());
            }

            if seen.contains(&record.path) {
                log::trace!("Already classified: {}", record.path.display());
                stats.already_seen += 1;
                continue;
            }
            stats.new_files += 1;
            seen.insert(record.path.clone());

            if let Some(candidate) = index.observe(&record) {
                comparisons.push(Comparison {
                    order: comparisons.len(),
                    size: record.size,
                    candidate: candidate.clone(),
                    current: record.path,
                });
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        stats.size_buckets = index.len();
        log::debug!(
            "Walk: {} files, {} already seen, {} sizes, {} comparisons queued",
            stats.files_walked,
            stats.already_seen,
            stats.size_buckets,
            comparisons.len()
        );

        let verdicts = self.run_comparisons(&comparisons)?;

        let mut pairs = Vec::new();
        for (cmp, verdict) in comparisons.into_iter().zip(verdicts) {
            match verdict {
                Verdict::Identical => {
                    stats.comparisons += 1;
                    stats.bytes_compared += cmp.size * 2;
                    log::debug!(
                        "Duplicate: {} == {}",
                        cmp.current.display(),
                        cmp.candidate.display()
                    );
                    pairs.push(DuplicatePair::new(cmp.candidate, cmp.current, cmp.size));
                }
                Verdict::Different => {
                    stats.comparisons += 1;
                    stats.bytes_compared += cmp.size * 2;
                }
                Verdict::Failed(e) => {
                    log::warn!("Could not compare {}: {}", cmp.current.display(), e);
                    errors.push(FileError::Hash(e));
                }
                Verdict::Skipped => {}
            }
        }

        let interrupted = self.config.is_shutdown_requested();
        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        log::info!(
            "Found {} duplicate(s) among {} new file(s)",
            pairs.len(),
            stats.new_files
        );

        Ok(ScanOutcome {
            root,
            quarantine_dir: quarantine,
            pairs,
            seen,
            errors,
            stats,
            interrupted,
        })
    }

    /// Execute queued comparisons, returning one verdict per comparison in
    /// the same order.
    fn run_comparisons(&self, comparisons: &[Comparison]) -> Result<Vec<Verdict>, FinderError> {
        if comparisons.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("comparing", comparisons.len());
        }

        let done = AtomicUsize::new(0);
        let compare = |cmp: &Comparison| -> Verdict {
            if self.config.is_shutdown_requested() {
                return Verdict::Skipped;
            }

            let verdict = match self.comparator.identical(&cmp.candidate, &cmp.current) {
                Ok(true) => Verdict::Identical,
                Ok(false) => Verdict::Different,
                Err(e) => Verdict::Failed(e),
            };

            let current = done.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(current, &cmp.current.to_string_lossy());
                callback.on_item_completed(cmp.size);
            }
            verdict
        };

        let verdicts: Vec<Verdict> = if self.config.io_threads <= 1 {
            comparisons.iter().map(compare).collect()
        } else {
            // Each bucket keeps its walk order and is handled by one task, so
            // a candidate is never compared against two newcomers at once.
            let mut buckets: BTreeMap<u64, Vec<&Comparison>> = BTreeMap::new();
            for cmp in comparisons {
                buckets.entry(cmp.size).or_default().push(cmp);
            }
            let buckets: Vec<Vec<&Comparison>> = buckets.into_values().collect();

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.io_threads)
                .build()?;

            let mut ordered: Vec<(usize, Verdict)> = pool.install(|| {
                buckets
                    .into_par_iter()
                    .flat_map_iter(|bucket| {
                        bucket
                            .into_iter()
                            .map(|cmp| (cmp.order, compare(cmp)))
                            .collect::<Vec<_>>()
                    })
                    .collect()
            });
            ordered.sort_by_key(|(order, _)| *order);
            ordered.into_iter().map(|(_, verdict)| verdict).collect()
        };

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("comparing");
        }

        Ok(verdicts)
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf, FinderError> {
    let canonical = root.canonicalize().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FinderError::RootNotFound(root.to_path_buf()),
        _ => FinderError::RootInaccessible {
            path: root.to_path_buf(),
            source: e,
        },
    })?;

    if !canonical.is_dir() {
        return Err(FinderError::NotADirectory(root.to_path_buf()));
    }

    fs::read_dir(&canonical).map_err(|e| FinderError::RootInaccessible {
        path: canonical.clone(),
        source: e,
    })?;

    Ok(canonical)
}
