//! Command-line interface definitions.
//!
//! Global options (verbosity, error format, config file) come before the
//! subcommand.
//!
//! # Example
//!
//! ```bash
//! # Move duplicates under ~/Videos into ~/Videos/duplicates
//! dupemover scan ~/Videos
//!
//! # See what would happen without touching anything
//! dupemover scan ~/Videos --dry-run
//!
//! # Machine-readable report, SHA-256 fingerprints
//! dupemover scan ~/Videos --output json --algorithm sha256
//!
//! # Inspect or forget the remembered paths
//! dupemover state show
//! dupemover state clear
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::scanner::HashAlgorithm;

/// Find byte-identical files and move the redundant copies aside.
///
/// Files are grouped by size and compared by content fingerprint. The first
/// copy of every set stays where it is; later copies are moved into a
/// `duplicates` folder inside the scanned directory. Paths already handled
/// are remembered so repeat runs only look at new files.
#[derive(Debug, Parser)]
#[command(name = "dupemover")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON objects on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long = "config", global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find duplicates under a directory and move them to <DIR>/duplicates
    Scan(ScanArgs),
    /// Inspect or reset the remembered paths
    #[command(subcommand)]
    State(StateCommand),
    /// Print the effective configuration as TOML
    Config,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    #[command(flatten)]
    pub state: StateLocation,

    /// Discard an unreadable state file instead of failing
    #[arg(long, conflicts_with = "no_state")]
    pub reset_state: bool,

    /// Neither load nor save remembered paths
    #[arg(long)]
    pub no_state: bool,

    /// Report what would be moved without moving or saving anything
    #[arg(long)]
    pub dry_run: bool,

    /// Fingerprint algorithm
    #[arg(long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Read block size for hashing (e.g. 64KiB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub block_size: Option<u64>,

    /// Number of size buckets compared in parallel
    ///
    /// Keep at 1 on spinning disks.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Follow symbolic links during the walk
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Skip zero-byte files
    #[arg(long)]
    pub skip_empty: bool,

    /// Gitignore-style pattern to exclude (repeatable)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Attempts per move before giving up
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Base delay between move attempts, in milliseconds
    #[arg(long, value_name = "MS")]
    pub retry_backoff_ms: Option<u64>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Location of the state file.
#[derive(Debug, Clone, Default, Args)]
pub struct StateLocation {
    /// State file (default: platform data dir)
    #[arg(long = "state", value_name = "FILE")]
    pub path: Option<PathBuf>,
}

/// State maintenance subcommands.
#[derive(Debug, Subcommand)]
pub enum StateCommand {
    /// Print where the state lives and how many paths it holds
    Show(StateLocation),
    /// Delete the state file
    Clear(StateLocation),
}

/// Report format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON report for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupemover::cli::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("64KiB").unwrap(), 65_536);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number
/// or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
