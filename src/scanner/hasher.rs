//! Streaming content hasher.
//!
//! # Overview
//!
//! [`Hasher`] decides whether two files hold the same bytes without loading
//! either into memory. Both files are read in lockstep, one fixed-size block
//! at a time, and each block is fed into an independent running digest. The
//! two digests are finalized once both streams are exhausted and compared as
//! whole values, so short reads on one side never cause a false mismatch.
//!
//! Peak memory is two blocks regardless of file size.
//!
//! # Example
//!
//! ```no_run
//! use dupemover::scanner::{ContentComparator, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let same = hasher.identical(Path::new("a.mkv"), Path::new("b.mkv")).unwrap();
//! println!("identical: {same}");
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::HashError;

/// Default block size for streaming reads (64 KiB).
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// A 256-bit content digest.
pub type Hash = [u8; 32];

/// Format a digest as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Digest algorithm used for content fingerprints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 (fast, cryptographically secure)
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blake3 => write!(f, "blake3"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Decides whether two files have identical content.
///
/// The scanner only depends on this trait, so tests can substitute a
/// comparator that counts calls or injects failures.
pub trait ContentComparator: Send + Sync {
    /// Compare the full contents of `a` and `b`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if either file cannot be opened or read.
    fn identical(&self, a: &Path, b: &Path) -> Result<bool, HashError>;
}

enum RunningDigest {
    Blake3(Box<blake3::Hasher>),
    Sha256(Sha256),
}

impl RunningDigest {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Blake3(h) => {
                h.update(data);
            }
            Self::Sha256(h) => h.update(data),
        }
    }

    fn finalize(self) -> Hash {
        match self {
            Self::Blake3(h) => *h.finalize().as_bytes(),
            Self::Sha256(h) => h.finalize().into(),
        }
    }
}

/// Streaming file hasher with a configurable block size and algorithm.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    block_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a BLAKE3 hasher with 64 KiB blocks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Use a different digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Use a different block size. Zero is clamped to one byte.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Configured block size in bytes.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Hash two files in lockstep and return both digests.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] for whichever file fails first.
    pub fn fingerprint_pair(&self, a: &Path, b: &Path) -> Result<(Hash, Hash), HashError> {
        let mut file_a = open(a)?;
        let mut file_b = open(b)?;
        let mut digest_a = RunningDigest::new(self.algorithm);
        let mut digest_b = RunningDigest::new(self.algorithm);
        let mut buf_a = vec![0u8; self.block_size];
        let mut buf_b = vec![0u8; self.block_size];

        loop {
            let n_a = read_block(&mut file_a, &mut buf_a).map_err(|e| HashError::from_io(a, e))?;
            let n_b = read_block(&mut file_b, &mut buf_b).map_err(|e| HashError::from_io(b, e))?;

            if n_a == 0 && n_b == 0 {
                break;
            }

            digest_a.update(&buf_a[..n_a]);
            digest_b.update(&buf_b[..n_b]);
        }

        Ok((digest_a.finalize(), digest_b.finalize()))
    }
}

impl ContentComparator for Hasher {
    fn identical(&self, a: &Path, b: &Path) -> Result<bool, HashError> {
        let (hash_a, hash_b) = self.fingerprint_pair(a, b)?;
        log::trace!(
            "{} {} vs {} {}",
            hash_to_hex(&hash_a),
            a.display(),
            hash_to_hex(&hash_b),
            b.display()
        );
        Ok(hash_a == hash_b)
    }
}

fn open(path: &Path) -> Result<File, HashError> {
    File::open(path).map_err(|e| HashError::from_io(path, e))
}

/// Fill `buf` from `reader`, returning fewer bytes only at end of stream.
fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
