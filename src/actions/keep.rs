//! Keep selection: which member of a duplicate group survives.
//!
//! Strategies form a closed set. Every strategy is total on non-empty
//! groups and breaks ties in favour of the earliest member in traversal
//! order, so the same group always yields the same decision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::duplicates::DuplicateGroup;
use crate::error::{suggest, ConfigError};
use crate::scanner::FileRecord;

/// Rule for choosing the survivor of a duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepStrategy {
    /// Keep the first member in traversal order.
    #[default]
    First,
    /// Keep the last member in traversal order.
    Last,
    /// Keep the member whose file name has the fewest characters.
    ShortestName,
    /// Keep the member whose file name has the most characters.
    LongestName,
}

impl KeepStrategy {
    /// Every strategy, in display order.
    pub const ALL: [Self; 4] = [
        Self::First,
        Self::Last,
        Self::ShortestName,
        Self::LongestName,
    ];

    /// Canonical name as accepted on the command line and in config files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
            Self::ShortestName => "shortest_name",
            Self::LongestName => "longest_name",
        }
    }

    /// Index of the member to keep. `None` only for an empty slice.
    #[must_use]
    pub fn select_index(self, files: &[FileRecord]) -> Option<usize> {
        if files.is_empty() {
            return None;
        }
        let name_len = |f: &FileRecord| f.file_name().chars().count();

        let index = match self {
            Self::First => 0,
            Self::Last => files.len() - 1,
            Self::ShortestName => earliest_best(files, |a, b| name_len(a) < name_len(b)),
            Self::LongestName => earliest_best(files, |a, b| name_len(a) > name_len(b)),
        };
        Some(index)
    }
}

/// Index of the first member that no later member strictly beats.
fn earliest_best(files: &[FileRecord], better: impl Fn(&FileRecord, &FileRecord) -> bool) -> usize {
    let mut best = 0;
    for (i, file) in files.iter().enumerate().skip(1) {
        if better(file, &files[best]) {
            best = i;
        }
    }
    best
}

impl fmt::Display for KeepStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeepStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|k| k.name() == normalized)
            .ok_or_else(|| ConfigError::UnknownKeepStrategy {
                name: s.to_string(),
                suggestion: suggest(&normalized, Self::ALL.iter().map(|k| k.name())),
            })
    }
}

/// Outcome of keep selection for one group.
///
/// Borrows from the group: `kept` plus `to_remove` is exactly the group's
/// membership, with `to_remove` in traversal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepDecision<'a> {
    /// The group the decision was made for
    pub group: &'a DuplicateGroup,
    /// The surviving member
    pub kept: &'a FileRecord,
    /// Members to remove
    pub to_remove: Vec<&'a FileRecord>,
}

impl KeepDecision<'_> {
    /// Bytes freed by removing every member of `to_remove`.
    #[must_use]
    pub fn reclaimable_bytes(&self) -> u64 {
        self.to_remove.iter().map(|f| f.size).sum()
    }
}

/// Choose the surviving member of `group`.
///
/// Returns `None` only for an empty group, which the finder never produces.
///
/// # Example
///
/// ```
/// use dupsweep::actions::{select_keep, KeepStrategy};
/// use dupsweep::duplicates::DuplicateGroup;
/// use dupsweep::scanner::{FileRecord, HashAlgorithm, Hasher};
/// use std::path::PathBuf;
///
/// let fingerprint = Hasher::new(HashAlgorithm::Md5).fingerprint_bytes(b"x");
/// let group = DuplicateGroup::new(fingerprint, 1, vec![
///     FileRecord::new(PathBuf::from("/a/long_name.txt"), 1),
///     FileRecord::new(PathBuf::from("/b/x.txt"), 1),
/// ]);
///
/// let decision = select_keep(&group, KeepStrategy::ShortestName).unwrap();
/// assert_eq!(decision.kept.path, PathBuf::from("/b/x.txt"));
/// assert_eq!(decision.to_remove.len(), 1);
/// ```
#[must_use]
pub fn select_keep(group: &DuplicateGroup, strategy: KeepStrategy) -> Option<KeepDecision<'_>> {
    let kept_index = strategy.select_index(&group.files)?;
    let kept = &group.files[kept_index];
    let to_remove = group
        .files
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != kept_index)
        .map(|(_, f)| f)
        .collect();

    log::trace!(
        "Keeping {} ({} strategy)",
        kept.path.display(),
        strategy
    );

    Some(KeepDecision {
        group,
        kept,
        to_remove,
    })
}
