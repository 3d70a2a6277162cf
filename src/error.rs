//! Structured error handling, configuration errors and exit codes.

use std::path::PathBuf;

use serde::Serialize;

/// Exit codes for the dupsweep application.
///
/// - 0: Success (completed normally, duplicates found)
/// - 1: General error (unexpected failure, invalid configuration)
/// - 2: No duplicates found (completed normally, no duplicates)
/// - 3: Partial success (soft scan errors or failed deletions)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed and duplicates were found.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Partial success: Completed but some files could not be processed.
    PartialSuccess = 3,
    /// Interrupted: Run was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::NoDuplicates => "DS002",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
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

/// Invalid run parameters. Raised before any scanning starts.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Unsupported hash algorithm name.
    #[error("Unsupported hash algorithm '{name}'{}", did_you_mean(.suggestion))]
    UnknownAlgorithm {
        /// Name as given
        name: String,
        /// Closest supported name, if any is close
        suggestion: Option<String>,
    },

    /// Unsupported keep strategy name.
    #[error("Unknown keep strategy '{name}'{}", did_you_mean(.suggestion))]
    UnknownKeepStrategy {
        /// Name as given
        name: String,
        /// Closest supported name, if any is close
        suggestion: Option<String>,
    },

    /// Minimum size is larger than maximum size.
    #[error("Invalid size bounds: minimum {min} is larger than maximum {max}")]
    InvalidSizeBounds {
        /// Minimum size in bytes
        min: u64,
        /// Maximum size in bytes
        max: u64,
    },

    /// No root path was supplied.
    #[error("No paths to scan")]
    NoRoots,

    /// A root path does not exist.
    #[error("Path not found: {0}")]
    RootNotFound(PathBuf),

    /// Hashing pool size must be at least one.
    #[error("I/O thread count must be at least 1")]
    InvalidIoThreads,
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}

/// Closest candidate to `input` by Jaro-Winkler similarity, if reasonably close.
#[must_use]
pub fn suggest<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    candidates
        .into_iter()
        .map(|c| (strsim::jaro_winkler(input, c), c))
        .filter(|(score, _)| *score > 0.8)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.to_string())
}
