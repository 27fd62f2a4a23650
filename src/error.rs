//! Exit codes and structured error reporting at the process boundary.

use serde::Serialize;

/// Process exit codes.
///
/// - 0: duplicates were found and moved (or planned, in dry-run)
/// - 1: fatal error, nothing was saved
/// - 2: scan completed without finding duplicates
/// - 3: completed, but some files or moves failed
/// - 130: interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates were moved.
    Success = 0,
    /// A fatal error aborted the run.
    GeneralError = 1,
    /// No duplicates were found.
    NoDuplicates = 2,
    /// Finished with per-file or per-pair failures.
    PartialSuccess = 3,
    /// Interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code used in error output.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DM000",
            Self::GeneralError => "DM001",
            Self::NoDuplicates => "DM002",
            Self::PartialSuccess => "DM003",
            Self::Interrupted => "DM130",
        }
    }
}

/// Fatal error as printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Code such as "DM001"
    pub code: String,
    /// Numeric exit code
    pub exit_code: i32,
    /// Message including the cause chain
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Build from an application error.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
