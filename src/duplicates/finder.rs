//! Duplicate finder: the walk → bucket → hash → group pipeline.
//!
//! # Overview
//!
//! 1. **Walk** every root, applying the metadata filters
//! 2. **Bucket** by size and drop singleton buckets (no I/O)
//! 3. **Hash** only members of multi-member buckets, on a bounded pool
//! 4. **Group** each bucket by fingerprint and drop near misses
//!
//! Hash results are collected in input order, so the output never depends
//! on which worker finished first. Equal size plus equal fingerprint is
//! treated as proof of identical content; files are not compared byte for
//! byte afterwards.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
//! use dupsweep::scanner::HashAlgorithm;
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default()
//!     .with_algorithm(HashAlgorithm::Sha256)
//!     .with_io_threads(4);
//! let finder = DuplicateFinder::new(config);
//!
//! let report = finder.scan(&[PathBuf::from(".")]).unwrap();
//! println!("Found {} duplicate groups", report.summary.duplicate_groups);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;

use super::groups::{group_by_fingerprint, group_by_size_structured, sort_groups, DuplicateGroup};
use crate::error::ConfigError;
use crate::progress::{Phase, ProgressCallback};
use crate::scanner::{
    FileRecord, Fingerprint, HashAlgorithm, HashError, Hasher, ScanError, Walker, WalkerConfig,
    DEFAULT_CHUNK_SIZE,
};

/// Files above this size are logged before hashing.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Digest used for content fingerprints.
    pub algorithm: HashAlgorithm,
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Read buffer size for hashing.
    pub chunk_size: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("algorithm", &self.algorithm)
            .field("io_threads", &self.io_threads)
            .field("chunk_size", &self.chunk_size)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            io_threads: 4,
            chunk_size: DEFAULT_CHUNK_SIZE,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the fingerprint algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the hashing pool size. Zero is rejected by [`validate`](Self::validate).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Set the hashing read buffer size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check the run parameters that do not depend on the roots.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidIoThreads`] for a zero-sized pool and
    /// [`ConfigError::InvalidSizeBounds`] when `min_size > max_size`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_threads == 0 {
            return Err(ConfigError::InvalidIoThreads);
        }
        if let (Some(min), Some(max)) = (self.walker_config.min_size, self.walker_config.max_size) {
            if min > max {
                return Err(ConfigError::InvalidSizeBounds { min, max });
            }
        }
        Ok(())
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A soft error recorded during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// Path the error relates to
    pub path: PathBuf,
    /// Human-readable message
    pub message: String,
}

impl From<&ScanError> for ErrorRecord {
    fn from(error: &ScanError) -> Self {
        Self {
            path: error.path().to_path_buf(),
            message: error.to_string(),
        }
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Algorithm used for fingerprints
    pub algorithm: HashAlgorithm,
    /// Total number of files that passed the walk filters
    pub total_files: usize,
    /// Total size of those files in bytes
    pub total_size: u64,
    /// Number of files eliminated by size bucketing (unique sizes)
    pub eliminated_by_size: usize,
    /// Number of files fingerprinted
    pub hashed_files: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding one kept copy per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Number of soft errors
    pub error_count: usize,
    /// Duration of the walking phase
    pub walk_duration: Duration,
    /// Duration of the hashing phase
    pub hash_duration: Duration,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        bytesize::ByteSize::b(self.total_size).to_string()
    }
}

/// Result of a completed scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Duplicate groups, largest size first, then by first member path
    pub groups: Vec<DuplicateGroup>,
    /// Soft errors in the order they were encountered
    pub errors: Vec<ErrorRecord>,
    /// Aggregate figures
    pub summary: ScanSummary,
}

impl ScanReport {
    /// Whether any duplicates were found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// Invalid run parameters, detected before any file was touched.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

type HashOutcome = (usize, FileRecord, Result<Fingerprint, HashError>);

/// Duplicate finder that runs the detection pipeline.
///
/// # Example
///
/// ```no_run
/// use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
/// use std::path::PathBuf;
///
/// let finder = DuplicateFinder::new(FinderConfig::default());
/// match finder.scan(&[PathBuf::from(".")]) {
///     Ok(report) => {
///         println!("Found {} duplicate groups", report.groups.len());
///         println!("Can reclaim {}", report.summary.reclaimable_display());
///     }
///     Err(e) => eprintln!("Scan failed: {}", e),
/// }
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new(config.algorithm).with_chunk_size(config.chunk_size);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self {
            config,
            hasher: Arc::new(hasher),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The hasher used by this finder. Its invocation count covers every
    /// scan this finder has run.
    #[must_use]
    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    /// The configuration this finder was built with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under `roots`.
    ///
    /// # Errors
    ///
    /// - [`FinderError::Config`] if the configuration is invalid, no root
    ///   was given, or a root does not exist. Nothing is walked in that case.
    /// - [`FinderError::Interrupted`] if shutdown was requested.
    ///
    /// Unreadable files and directories are not errors: they are recorded
    /// in [`ScanReport::errors`] and the scan continues.
    pub fn scan(&self, roots: &[PathBuf]) -> Result<ScanReport, FinderError> {
        self.config.validate()?;
        if roots.is_empty() {
            return Err(ConfigError::NoRoots.into());
        }
        if let Some(missing) = first_missing_root(roots) {
            return Err(ConfigError::RootNotFound(missing.to_path_buf()).into());
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let start_time = Instant::now();
        log::info!(
            "Starting duplicate scan of {} root(s) using {}",
            roots.len(),
            self.config.algorithm
        );

        let (records, errors) = self.walk(roots);
        let walk_duration = start_time.elapsed();

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut report = self.scan_records_inner(records, errors)?;
        report.summary.walk_duration = walk_duration;
        report.summary.scan_duration = start_time.elapsed();
        Ok(report)
    }

    /// Run bucketing, hashing and grouping over records that were already
    /// discovered.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if shutdown was requested, or
    /// [`FinderError::Config`] if the configuration is invalid.
    pub fn scan_records(&self, records: Vec<FileRecord>) -> Result<ScanReport, FinderError> {
        self.config.validate()?;
        let start_time = Instant::now();
        let mut report = self.scan_records_inner(records, Vec::new())?;
        report.summary.scan_duration = start_time.elapsed();
        Ok(report)
    }

    fn walk(&self, roots: &[PathBuf]) -> (Vec<FileRecord>, Vec<ErrorRecord>) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(Phase::Walking, 0);
        }

        let mut walker = Walker::new(roots.to_vec(), self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(callback.clone());
        }

        let mut records = Vec::new();
        let mut errors = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(record) => records.push(record),
                Err(e) => errors.push(ErrorRecord::from(&e)),
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(Phase::Walking);
        }

        log::info!(
            "Walk complete: {} files, {} errors",
            records.len(),
            errors.len()
        );
        (records, errors)
    }

    fn scan_records_inner(
        &self,
        records: Vec<FileRecord>,
        mut errors: Vec<ErrorRecord>,
    ) -> Result<ScanReport, FinderError> {
        let (buckets, size_stats) = group_by_size_structured(records);

        let mut summary = ScanSummary {
            algorithm: self.config.algorithm,
            total_files: size_stats.total_files,
            total_size: size_stats.total_size,
            eliminated_by_size: size_stats.eliminated_unique,
            ..Default::default()
        };

        let bucket_sizes: Vec<u64> = buckets.iter().map(|b| b.size).collect();
        let work: Vec<(usize, FileRecord)> = buckets
            .into_iter()
            .enumerate()
            .flat_map(|(i, b)| b.files.into_iter().map(move |f| (i, f)))
            .collect();

        let hash_start = Instant::now();
        let outcomes = self.hash_all(work);
        summary.hash_duration = hash_start.elapsed();

        if self.config.is_shutdown_requested() {
            log::info!("Scan interrupted during hashing");
            return Err(FinderError::Interrupted);
        }

        summary.hashed_files = outcomes.len();

        // Outcomes are in input order, so each bucket's members are contiguous
        let mut per_bucket: Vec<Vec<(FileRecord, Fingerprint)>> =
            bucket_sizes.iter().map(|_| Vec::new()).collect();
        for (bucket, record, result) in outcomes {
            match result {
                Ok(fingerprint) => per_bucket[bucket].push((record, fingerprint)),
                Err(e) => {
                    log::warn!("{}", e);
                    errors.push(ErrorRecord::from(&ScanError::Hash(e)));
                }
            }
        }

        let mut groups: Vec<DuplicateGroup> = per_bucket
            .into_iter()
            .zip(bucket_sizes)
            .flat_map(|(hashed, size)| group_by_fingerprint(size, hashed))
            .collect();
        sort_groups(&mut groups);

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.error_count = errors.len();

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok(ScanReport {
            groups,
            errors,
            summary,
        })
    }

    /// Fingerprint every candidate on the bounded pool, preserving input order.
    fn hash_all(&self, work: Vec<(usize, FileRecord)>) -> Vec<HashOutcome> {
        let total = work.len();
        if total == 0 {
            log::debug!("Hashing: no candidates");
            return Vec::new();
        }

        log::info!(
            "Hashing {} candidate files with {} thread(s)",
            total,
            self.config.io_threads
        );

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(Phase::Hashing, total);
        }

        let processed = AtomicUsize::new(0);
        let hash_one = |(bucket, record): (usize, FileRecord)| -> HashOutcome {
            if self.config.is_shutdown_requested() {
                let path = record.path.clone();
                return (bucket, record, Err(HashError::Interrupted(path)));
            }

            if record.size > LARGE_FILE_THRESHOLD {
                log::debug!(
                    "Hashing large file ({} MB): {}",
                    record.size / (1024 * 1024),
                    record.path.display()
                );
            }

            let result = self.hasher.fingerprint(&record);
            let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(done, total);
            }
            (bucket, record, result)
        };

        let outcomes = run_bounded(self.config.io_threads, || {
            work.into_par_iter().map(hash_one).collect::<Vec<_>>()
        });

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(Phase::Hashing);
        }
        outcomes
    }
}

/// Run `job` on a dedicated pool of `threads` workers.
///
/// If the pool cannot be created the job runs on the caller's pool instead.
fn run_bounded<R, F>(threads: usize, job: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(job),
        Err(e) => {
            log::warn!(
                "Failed to create hashing pool ({}), using global pool with {} threads",
                e,
                rayon::current_num_threads()
            );
            job()
        }
    }
}

/// First root that does not exist, if any.
#[must_use]
pub fn first_missing_root(roots: &[PathBuf]) -> Option<&Path> {
    roots.iter().map(PathBuf::as_path).find(|r| !r.exists())
}
