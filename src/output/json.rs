//! JSON output formatter.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "algorithm": "sha256",
//!   "duplicates": [
//!     {
//!       "hash": "2cf24dba...",
//!       "size": 1024,
//!       "files": ["/photos/a.jpg", "/backup/a.jpg"]
//!     }
//!   ],
//!   "errors": [{ "path": "/photos/locked", "message": "Permission denied: /photos/locked" }],
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "hashed_files": 12,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "error_count": 1,
//!     "scan_duration_ms": 1234,
//!     "exit_code": 3,
//!     "exit_code_name": "DS003"
//!   },
//!   "actions": [
//!     { "path": "/backup/a.jpg", "keep_path": "/photos/a.jpg", "size": 1024,
//!       "simulated": false, "outcome": "deleted" }
//!   ],
//!   "deletion": { "succeeded": 1, "failed": 0, "reclaimed_bytes": 1024, "interrupted": false }
//! }
//! ```
//!
//! `actions` appears only when deletion was requested; `deletion` only when
//! it actually ran.

use std::io::Write;

use serde::Serialize;

use super::{Resolution, RunReport};
use crate::actions::{ExecutionReport, ResolutionAction};
use crate::duplicates::{DuplicateGroup, ErrorRecord, ScanSummary};
use crate::error::ExitCode;
use crate::scanner::HashAlgorithm;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Fingerprint as lowercase hexadecimal
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Member paths in traversal order
    pub files: Vec<String>,
}

impl JsonDuplicateGroup {
    /// Create a JSON duplicate group from a [`DuplicateGroup`].
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size,
            files: group
                .files
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// A soft scan error in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonError {
    /// Path the error relates to
    pub path: String,
    /// Human-readable message
    pub message: String,
}

impl From<&ErrorRecord> for JsonError {
    fn from(record: &ErrorRecord) -> Self {
        Self {
            path: record.path.to_string_lossy().into_owned(),
            message: record.message.clone(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files that passed the walk filters
    pub total_files: usize,
    /// Their combined size in bytes
    pub total_size: u64,
    /// Files ruled out by a unique size
    pub eliminated_by_size: usize,
    /// Files fingerprinted
    pub hashed_files: usize,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies (all members but one per group)
    pub duplicate_files: usize,
    /// Bytes reclaimable by keeping one copy per group
    pub reclaimable_space: u64,
    /// Soft errors recorded
    pub error_count: usize,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Duration of the walking phase in milliseconds
    pub walk_duration_ms: u64,
    /// Duration of the hashing phase in milliseconds
    pub hash_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a [`ScanSummary`] and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            eliminated_by_size: summary.eliminated_by_size,
            hashed_files: summary.hashed_files,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            error_count: summary.error_count,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            walk_duration_ms: summary.walk_duration.as_millis() as u64,
            hash_duration_ms: summary.hash_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Totals of an executed deletion batch.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDeletion {
    /// Files removed
    pub succeeded: usize,
    /// Actions that failed
    pub failed: usize,
    /// Bytes freed
    pub reclaimed_bytes: u64,
    /// Whether shutdown stopped the batch early
    pub interrupted: bool,
}

impl From<&ExecutionReport> for JsonDeletion {
    fn from(report: &ExecutionReport) -> Self {
        Self {
            succeeded: report.succeeded,
            failed: report.failed,
            reclaimed_bytes: report.reclaimed_bytes,
            interrupted: report.interrupted,
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Fingerprint algorithm of the run
    pub algorithm: HashAlgorithm,
    /// Duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Soft errors
    pub errors: Vec<JsonError>,
    /// Scan summary statistics
    pub summary: JsonSummary,
    /// Planned or executed removals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ResolutionAction>>,
    /// Deletion totals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion: Option<JsonDeletion>,
}

impl JsonOutput {
    /// Build the JSON document for a run.
    ///
    /// # Example
    ///
    /// ```
    /// use dupsweep::duplicates::ScanReport;
    /// use dupsweep::error::ExitCode;
    /// use dupsweep::output::{JsonOutput, RunReport};
    ///
    /// let report = ScanReport::default();
    /// let output = JsonOutput::new(&RunReport::scan_only(&report), ExitCode::NoDuplicates);
    /// assert!(output.duplicates.is_empty());
    /// assert!(output.actions.is_none());
    /// ```
    #[must_use]
    pub fn new(run: &RunReport<'_>, exit_code: ExitCode) -> Self {
        let scan = run.scan;
        Self {
            algorithm: scan.summary.algorithm,
            duplicates: scan
                .groups
                .iter()
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
            errors: scan.errors.iter().map(JsonError::from).collect(),
            summary: JsonSummary::from_scan_summary(&scan.summary, exit_code),
            actions: run.resolution.map(|r| r.actions().to_vec()),
            deletion: match run.resolution {
                Some(Resolution::Executed(report)) => Some(JsonDeletion::from(report)),
                _ => None,
            },
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
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
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
