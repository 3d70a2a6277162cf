//! Resolution planning: turning duplicate groups into removal actions.
//!
//! Planning is pure. It never touches the filesystem, so planning the
//! same groups twice yields identical action lists.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;

use super::keep::{select_keep, KeepStrategy};
use crate::duplicates::DuplicateGroup;

/// State of a resolution action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Not executed (yet, or ever for simulated actions)
    #[default]
    Pending,
    /// The file was removed
    Deleted,
    /// Removal was attempted and failed; see the action's error
    Failed,
}

/// Intent to remove one duplicate while keeping another copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionAction {
    /// File to remove
    pub path: PathBuf,
    /// Copy that stays; must exist when the action runs
    pub keep_path: PathBuf,
    /// Size recorded at scan time
    pub size: u64,
    /// Dry-run actions are never executed
    pub simulated: bool,
    /// Current state
    pub outcome: ActionOutcome,
    /// Failure description, set when `outcome` is `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolutionAction {
    /// Create a pending action.
    #[must_use]
    pub fn new(path: PathBuf, keep_path: PathBuf, size: u64, simulated: bool) -> Self {
        Self {
            path,
            keep_path,
            size,
            simulated,
            outcome: ActionOutcome::Pending,
            error: None,
        }
    }

    /// Whether the action has not run.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.outcome == ActionOutcome::Pending
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.outcome = ActionOutcome::Deleted;
        self.error = None;
    }

    pub(crate) fn mark_failed(&mut self, error: impl ToString) {
        self.outcome = ActionOutcome::Failed;
        self.error = Some(error.to_string());
    }
}

/// Plan one removal action per non-kept member of every group.
///
/// Actions follow group order, then member order. The kept file of a group
/// never appears as an action's `path`. With `dry_run` every action is
/// marked `simulated`.
///
/// # Example
///
/// ```
/// use dupsweep::actions::{plan_resolution, KeepStrategy};
/// use dupsweep::duplicates::DuplicateGroup;
/// use dupsweep::scanner::{FileRecord, HashAlgorithm, Hasher};
/// use std::path::PathBuf;
///
/// let fingerprint = Hasher::new(HashAlgorithm::Sha256).fingerprint_bytes(b"x");
/// let group = DuplicateGroup::new(fingerprint, 1, vec![
///     FileRecord::new(PathBuf::from("/a"), 1),
///     FileRecord::new(PathBuf::from("/b"), 1),
/// ]);
///
/// let actions = plan_resolution(&[group], KeepStrategy::First, true);
/// assert_eq!(actions.len(), 1);
/// assert_eq!(actions[0].path, PathBuf::from("/b"));
/// assert!(actions[0].simulated);
/// ```
#[must_use]
pub fn plan_resolution(
    groups: &[DuplicateGroup],
    strategy: KeepStrategy,
    dry_run: bool,
) -> Vec<ResolutionAction> {
    let actions: Vec<ResolutionAction> = groups
        .iter()
        .filter_map(|g| select_keep(g, strategy))
        .flat_map(|decision| {
            let keep_path = decision.kept.path.clone();
            decision.to_remove.into_iter().map(move |f| {
                ResolutionAction::new(f.path.clone(), keep_path.clone(), f.size, dry_run)
            })
        })
        .collect();

    log::info!(
        "Planned {} removal(s) across {} group(s) using '{}'{}",
        actions.len(),
        groups.len(),
        strategy,
        if dry_run { " (dry run)" } else { "" }
    );
    actions
}

/// Bytes the given actions would free.
#[must_use]
pub fn total_bytes(actions: &[ResolutionAction]) -> u64 {
    actions.iter().map(|a| a.size).sum()
}

/// Human-readable listing of what the actions would do.
#[must_use]
pub fn preview(actions: &[ResolutionAction]) -> String {
    let mut out = String::new();
    if actions.is_empty() {
        out.push_str("Nothing to delete.\n");
        return out;
    }

    for action in actions {
        let _ = writeln!(
            out,
            "Would delete: {} (keeping {})",
            action.path.display(),
            action.keep_path.display()
        );
    }
    let _ = writeln!(
        out,
        "{} file(s), {} reclaimable",
        actions.len(),
        bytesize::ByteSize::b(total_bytes(actions))
    );
    out
}
