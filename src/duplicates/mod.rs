//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based bucketing (phase 1)
//! - Content fingerprint comparison (phase 2)
//! - Duplicate group management and statistics

pub mod finder;
pub mod groups;

pub use finder::{
    first_missing_root, DuplicateFinder, ErrorRecord, FinderConfig, FinderError, ScanReport,
    ScanSummary,
};
pub use groups::{
    group_by_fingerprint, group_by_size, group_by_size_structured, sort_groups, DuplicateGroup,
    DuplicateStats, GroupingStats, SizeBucket,
};
