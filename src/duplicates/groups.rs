//! Duplicate grouping and size-based file organization.
//!
//! # Overview
//!
//! Size bucketing is the first phase of duplicate detection. Files with
//! different sizes cannot be duplicates, so only buckets holding two or
//! more files are ever read. The second phase splits each surviving bucket
//! by content fingerprint into [`DuplicateGroup`]s.
//!
//! # Example
//!
//! ```
//! use dupsweep::scanner::FileRecord;
//! use dupsweep::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! // Only buckets with 2+ files survive
//! let (buckets, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(buckets.len(), 1);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::scanner::{FileRecord, Fingerprint};

/// Files sharing one exact size, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBucket {
    /// File size in bytes (shared by all files in this bucket)
    pub size: u64,
    /// Files with this exact size
    pub files: Vec<FileRecord>,
}

impl SizeBucket {
    /// Create a bucket with initial files.
    #[must_use]
    pub fn with_files(size: u64, files: Vec<FileRecord>) -> Self {
        Self { size, files }
    }

    /// Number of files in this bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check if this bucket has potential duplicates (2+ files).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.files.len() > 1
    }
}

/// Confirmed group of byte-identical files.
///
/// Members share size and fingerprint, there are always at least two of
/// them, and they stay in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Content fingerprint shared by every member
    pub fingerprint: Fingerprint,
    /// File size in bytes
    pub size: u64,
    /// Members in discovery order
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(fingerprint: Fingerprint, size: u64, files: Vec<FileRecord>) -> Self {
        Self {
            fingerprint,
            size,
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Fingerprint as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        self.fingerprint.to_hex()
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Statistics from the size bucketing phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in buckets of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton buckets)
    pub eliminated_unique: usize,
    /// Number of empty files seen (zero with `skip_empty`)
    pub empty_files: usize,
    /// Number of size buckets with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size bucketing.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size (phase 1 of duplicate detection).
///
/// Singleton buckets are dropped after every record has been seen; the
/// surviving buckets keep their members in input order.
///
/// # Performance
///
/// O(n) time and space. No file I/O is performed.
///
/// # Example
///
/// ```
/// use dupsweep::scanner::FileRecord;
/// use dupsweep::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileRecord::new(PathBuf::from("/a.txt"), 100),
///     FileRecord::new(PathBuf::from("/b.txt"), 100),
///     FileRecord::new(PathBuf::from("/c.txt"), 200),
/// ];
///
/// let (buckets, stats) = group_by_size(files);
///
/// assert_eq!(buckets.len(), 1);
/// assert_eq!(buckets[&100].len(), 2);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileRecord>,
) -> (HashMap<u64, Vec<FileRecord>>, GroupingStats) {
    let mut all_groups: HashMap<u64, Vec<FileRecord>> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        if file.size == 0 {
            stats.empty_files += 1;
        }
        all_groups.entry(file.size).or_default().push(file);
    }

    stats.unique_sizes = all_groups.len();

    let filtered_groups: HashMap<u64, Vec<FileRecord>> = all_groups
        .into_iter()
        .filter(|(size, files)| {
            if files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!(
                    "Eliminated unique size {}: {}",
                    size,
                    files[0].path.display()
                );
                false
            } else {
                stats.potential_duplicates += files.len();
                stats.duplicate_groups += 1;
                log::debug!(
                    "Size bucket {} bytes: {} potential duplicates",
                    size,
                    files.len()
                );
                true
            }
        })
        .collect();

    log::info!(
        "Size bucketing complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (filtered_groups, stats)
}

/// Group files by size, returning [`SizeBucket`]s sorted by size descending.
#[must_use]
pub fn group_by_size_structured(
    files: impl IntoIterator<Item = FileRecord>,
) -> (Vec<SizeBucket>, GroupingStats) {
    let (groups_map, stats) = group_by_size(files);

    let mut buckets: Vec<SizeBucket> = groups_map
        .into_iter()
        .map(|(size, files)| SizeBucket::with_files(size, files))
        .collect();

    // Sizes are unique keys, so this order is total
    buckets.sort_by(|a, b| b.size.cmp(&a.size));

    (buckets, stats)
}

/// Split one size bucket into duplicate groups by fingerprint.
///
/// `hashed` must be in discovery order; groups come out ordered by their
/// first member and keep that order internally. Fingerprints seen once are
/// near misses and are dropped.
#[must_use]
pub fn group_by_fingerprint(
    size: u64,
    hashed: impl IntoIterator<Item = (FileRecord, Fingerprint)>,
) -> Vec<DuplicateGroup> {
    let mut index: HashMap<Fingerprint, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for (record, fingerprint) in hashed {
        match index.get(&fingerprint) {
            Some(&i) => groups[i].files.push(record),
            None => {
                index.insert(fingerprint.clone(), groups.len());
                groups.push(DuplicateGroup::new(fingerprint, size, vec![record]));
            }
        }
    }

    groups.retain(|g| {
        if g.len() < 2 {
            log::trace!(
                "Near miss (same size, different content): {}",
                g.files[0].path.display()
            );
            false
        } else {
            true
        }
    });
    groups
}

/// Order groups by size descending, then by first member path.
pub fn sort_groups(groups: &mut [DuplicateGroup]) {
    groups.sort_by(|a, b| {
        b.size
            .cmp(&a.size)
            .then_with(|| a.files.first().map(|f| &f.path).cmp(&b.files.first().map(|f| &f.path)))
    });
}

/// Aggregate figures over a set of duplicate groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateStats {
    /// Number of duplicate groups
    pub group_count: usize,
    /// Files that are redundant copies (all members but one per group)
    pub duplicate_files: usize,
    /// Bytes reclaimable by keeping one copy per group
    pub wasted_bytes: u64,
    /// Member count of the largest group
    pub largest_group: usize,
}

impl DuplicateStats {
    /// Compute statistics for `groups`.
    #[must_use]
    pub fn from_groups(groups: &[DuplicateGroup]) -> Self {
        groups.iter().fold(Self::default(), |mut acc, g| {
            acc.group_count += 1;
            acc.duplicate_files += g.duplicate_count();
            acc.wasted_bytes += g.wasted_space();
            acc.largest_group = acc.largest_group.max(g.len());
            acc
        })
    }
}
