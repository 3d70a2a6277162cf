//! Report formatters for scan and resolution results.
//!
//! - [`TextOutput`] for people reading a terminal
//! - [`JsonOutput`] for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::DuplicateFinder;
//! use dupsweep::output::{JsonOutput, RunReport};
//! use std::path::PathBuf;
//!
//! let report = DuplicateFinder::with_defaults().scan(&[PathBuf::from(".")]).unwrap();
//! let output = JsonOutput::new(&RunReport::scan_only(&report), dupsweep::error::ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;

use crate::actions::{ExecutionReport, ResolutionAction};
use crate::duplicates::ScanReport;

/// What happened to the duplicates after the scan.
#[derive(Debug, Clone, Copy)]
pub enum Resolution<'a> {
    /// Planned actions that were only previewed
    DryRun(&'a [ResolutionAction]),
    /// Actions that went through the deleter
    Executed(&'a ExecutionReport),
}

impl<'a> Resolution<'a> {
    /// Actions in input order with their final state.
    #[must_use]
    pub fn actions(&self) -> &'a [ResolutionAction] {
        match self {
            Resolution::DryRun(actions) => actions,
            Resolution::Executed(report) => &report.actions,
        }
    }
}

/// Everything a formatter renders for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunReport<'a> {
    /// Scan results
    pub scan: &'a ScanReport,
    /// Deletion results, when deletion was requested
    pub resolution: Option<Resolution<'a>>,
}

impl<'a> RunReport<'a> {
    /// A run that only scanned.
    #[must_use]
    pub fn scan_only(scan: &'a ScanReport) -> Self {
        Self {
            scan,
            resolution: None,
        }
    }

    /// A run that scanned and then resolved.
    #[must_use]
    pub fn with_resolution(scan: &'a ScanReport, resolution: Resolution<'a>) -> Self {
        Self {
            scan,
            resolution: Some(resolution),
        }
    }
}
