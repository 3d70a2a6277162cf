//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! [`Walker`] discovers candidate files under one or more roots and applies
//! every metadata filter (size bounds, extension lists, hidden entries,
//! empty files) before anything is read. Roots may be directories, which
//! are recursed, or regular files, which are emitted directly.
//!
//! Children of every directory are sorted by file name, so two walks over
//! an unchanged tree yield the same sequence. Roots are walked in the order
//! given, and a path reachable from several roots is emitted only once.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig {
//!     min_size: Some(1024),
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(vec![PathBuf::from("/home/user/Downloads")], config);
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::collections::HashSet;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{extension_of, FileRecord, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

type WalkItem = Result<FileRecord, ScanError>;

/// Directory walker for file discovery across several roots.
pub struct Walker {
    /// Roots to walk, in order
    roots: Vec<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional sink for the discovered-file count
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("roots", &self.roots)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("has_progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl Walker {
    /// Create a new walker over the given roots.
    ///
    /// Relative roots are resolved against the current directory so every
    /// emitted [`FileRecord`] carries an absolute path.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        let roots = roots.into_iter().map(|r| absolutize(&r)).collect();
        Self {
            roots,
            config,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Report the running count of discovered files to `callback`.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Roots this walker visits, after resolution to absolute paths.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk every root, yielding file records and soft errors.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Only regular files that pass every filter are yielded.
    pub fn walk(&self) -> impl Iterator<Item = WalkItem> + '_ {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut discovered = 0usize;

        self.roots
            .iter()
            .flat_map(move |root| self.walk_root(root))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    return false;
                }
                true
            })
            .filter_map(move |item| match item {
                Ok(record) => {
                    let key = self.identity_key(&record.path);
                    if !seen.insert(key) {
                        log::trace!("Skipping already discovered file: {}", record.path.display());
                        return None;
                    }
                    discovered += 1;
                    if let Some(ref cb) = self.progress_callback {
                        cb.on_progress(discovered, 0);
                    }
                    Some(Ok(record))
                }
                Err(e) => Some(Err(e)),
            })
    }

    /// Walk a single root. A file root is filtered and emitted directly.
    fn walk_root<'a>(&'a self, root: &'a Path) -> Box<dyn Iterator<Item = WalkItem> + 'a> {
        let metadata = match std::fs::metadata(root) {
            Ok(m) => m,
            Err(e) => return Box::new(std::iter::once(self.handle_io_error(root, e))),
        };

        if metadata.is_file() {
            log::debug!("Root is a file: {}", root.display());
            return Box::new(
                self.process_file_entry(root.to_path_buf(), &metadata)
                    .into_iter(),
            );
        }

        if !metadata.is_dir() {
            log::debug!("Skipping root that is neither file nor directory: {}", root.display());
            return Box::new(std::iter::empty());
        }

        let walk_dir = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        Box::new(
            walk_dir
                .into_iter()
                .filter_map(move |entry_result| match entry_result {
                    Ok(entry) => {
                        let path = entry.path();

                        // Skip the root directory itself
                        if path == root {
                            return None;
                        }

                        let file_type = entry.file_type();
                        if file_type.is_dir() {
                            return None;
                        }

                        let is_symlink = file_type.is_symlink();
                        if is_symlink && !self.config.follow_symlinks {
                            log::trace!("Skipping symlink: {}", path.display());
                            return None;
                        }

                        let metadata = if self.config.follow_symlinks {
                            std::fs::metadata(&path)
                        } else {
                            std::fs::symlink_metadata(&path)
                        };

                        let metadata = match metadata {
                            Ok(m) => m,
                            Err(e) => return Some(self.handle_io_error(&path, e)),
                        };

                        // Sockets, fifos, devices and dangling targets are not candidates
                        if !metadata.is_file() {
                            return None;
                        }

                        self.process_file_entry(path, &metadata)
                    }
                    Err(e) => {
                        let path = e
                            .path()
                            .map_or_else(|| root.to_path_buf(), std::borrow::ToOwned::to_owned);
                        Some(self.handle_jwalk_error(path, e))
                    }
                }),
        )
    }

    /// Apply the metadata filters and build a [`FileRecord`] if the file passes.
    fn process_file_entry(&self, path: PathBuf, metadata: &Metadata) -> Option<WalkItem> {
        let size = metadata.len();

        if size == 0 && self.config.skip_empty {
            log::debug!("Skipping empty file: {}", path.display());
            return None;
        }

        if !self.passes_size_filter(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                path.display()
            );
            return None;
        }

        if self.config.skip_hidden && is_hidden(&path) {
            log::trace!("Skipping hidden file: {}", path.display());
            return None;
        }

        let extension = extension_of(&path);
        if !self.passes_extension_filter(&extension) {
            log::trace!("Skipping file due to extension filter: {}", path.display());
            return None;
        }

        Some(Ok(FileRecord {
            path,
            size,
            extension,
        }))
    }

    /// Check if a file passes size filters. Both bounds are inclusive.
    fn passes_size_filter(&self, size: u64) -> bool {
        if let Some(min) = self.config.min_size {
            if size < min {
                return false;
            }
        }
        if let Some(max) = self.config.max_size {
            if size > max {
                return false;
            }
        }
        true
    }

    /// Allow-list first (empty allows everything), then the deny-list.
    fn passes_extension_filter(&self, extension: &str) -> bool {
        if !self.config.extensions.is_empty()
            && !self.config.extensions.iter().any(|e| e == extension)
        {
            return false;
        }
        !self.config.exclude_extensions.iter().any(|e| e == extension)
    }

    /// Key used to recognize the same file reached from two roots.
    ///
    /// Always the canonical path: a root that is itself a symlink or that
    /// contains `..` reaches files already seen under another root.
    fn identity_key(&self, path: &Path) -> PathBuf {
        std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> WalkItem {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
            }
            std::io::ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
            }
        }
        Err(ScanError::from_io(path, error))
    }

    /// Handle jwalk errors, keeping the permission/not-found classification.
    fn handle_jwalk_error(&self, path: PathBuf, error: jwalk::Error) -> WalkItem {
        log::warn!("Walker error for {}: {}", path.display(), error);
        let kind = error
            .io_error()
            .map_or(std::io::ErrorKind::Other, std::io::Error::kind);
        Err(ScanError::from_io(
            &path,
            std::io::Error::new(kind, error.to_string()),
        ))
    }
}

/// Whether the file name starts with a dot.
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
