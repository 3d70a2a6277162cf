//! Resolution of duplicate groups.
//!
//! This module provides functionality for:
//! - Choosing which copy of each group survives ([`keep`])
//! - Planning removal actions, including dry runs ([`plan`])
//! - Executing them safely via the trash crate ([`delete`])
//!
//! ```no_run
//! use dupsweep::actions::{plan_resolution, preview, KeepStrategy};
//! # let groups = Vec::new();
//!
//! let actions = plan_resolution(&groups, KeepStrategy::ShortestName, true);
//! print!("{}", preview(&actions));
//! ```

pub mod delete;
pub mod keep;
pub mod plan;

// Re-export commonly used types
pub use delete::{
    pending_bytes, ActionError, Confirm, DeleteConfig, DeleteError, ExecutionReport, SafeDeleter,
    SystemTrash, Trash,
};
pub use keep::{select_keep, KeepDecision, KeepStrategy};
pub use plan::{plan_resolution, preview, total_bytes, ActionOutcome, ResolutionAction};
