//! Safe execution of resolution actions.
//!
//! # Overview
//!
//! [`SafeDeleter`] runs a batch of [`ResolutionAction`]s:
//! - Simulated (dry-run) actions are never executed
//! - Nothing is removed until the confirmation gate passes
//! - Files go to the system trash by default; permanent deletion happens
//!   only when chosen explicitly or allowed as a fallback
//! - Each file is re-checked right before removal (TOCTOU protection)
//! - A failing action is recorded and the batch moves on
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::actions::{plan_resolution, DeleteConfig, KeepStrategy, SafeDeleter};
//! # let groups = Vec::new();
//!
//! let actions = plan_resolution(&groups, KeepStrategy::First, false);
//! let deleter = SafeDeleter::new(DeleteConfig::trash())
//!     .with_confirm(|count: usize, bytes: u64| {
//!         println!("Delete {count} files ({bytes} bytes)?");
//!         true
//!     });
//!
//! match deleter.execute(actions) {
//!     Ok(report) => println!("{}", report.summary()),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use super::plan::ResolutionAction;
use crate::progress::{Phase, ProgressCallback};

/// Errors that stop a batch before anything is removed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeleteError {
    /// Real deletions were requested without `force` or a confirmer.
    #[error("confirmation required to delete {count} file(s) ({bytes} bytes)")]
    ConfirmationRequired {
        /// Number of files that would be removed
        count: usize,
        /// Bytes that would be freed
        bytes: u64,
    },

    /// The confirmer declined.
    #[error("deletion cancelled")]
    ConfirmationDeclined,

    /// Shutdown was requested before the confirmation gate.
    #[error("deletion interrupted before any file was removed")]
    Interrupted,
}

/// Failure of a single action. Recorded on the action; never aborts a batch.
#[derive(Debug, Error)]
pub enum ActionError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File size differs from the scan.
    #[error("file modified since scan: {path} (expected {expected} bytes, found {actual})")]
    Modified {
        /// Path of the file
        path: PathBuf,
        /// Size recorded at scan time
        expected: u64,
        /// Size found now
        actual: u64,
    },

    /// The copy meant to survive is gone.
    #[error("kept copy missing: {keep_path} (refusing to delete {path})")]
    KeptCopyMissing {
        /// File that would have been removed
        path: PathBuf,
        /// Copy that should have survived
        keep_path: PathBuf,
    },

    /// The file to remove and the kept copy are the same file.
    #[error("{path} is the kept copy {keep_path} under another name; refusing to delete")]
    SameFile {
        /// File that would have been removed
        path: PathBuf,
        /// Copy that should have survived
        keep_path: PathBuf,
    },

    /// Trash operation failed and permanent fallback is disabled.
    #[error("trash operation failed for {path}: {message}; removing it would require permanent delete")]
    TrashFailed {
        /// Path of the file
        path: PathBuf,
        /// Message from the trash backend
        message: String,
    },

    /// No trash is available and permanent fallback is disabled.
    #[error("trash unavailable; deleting {0} would require permanent delete")]
    PermanentDeleteRequired(PathBuf),

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed {
        /// Path of the file
        path: PathBuf,
        /// Underlying error message
        message: String,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path of the file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl ActionError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Recycle-bin capability.
///
/// Injected into [`SafeDeleter`] so callers (and tests) decide where
/// trashed files go.
pub trait Trash: Send + Sync {
    /// Whether the trash can be used at all on this system.
    fn is_available(&self) -> bool {
        true
    }

    /// Move `path` to the trash.
    ///
    /// # Errors
    ///
    /// Any failure of the backend.
    fn move_to_trash(&self, path: &Path) -> io::Result<()>;
}

/// The platform recycle bin, via the `trash` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTrash;

impl Trash for SystemTrash {
    fn move_to_trash(&self, path: &Path) -> io::Result<()> {
        trash::delete(path).map_err(|e| io::Error::other(e.to_string()))
    }
}

/// Confirmation gate consulted once per batch before any real deletion.
pub trait Confirm {
    /// Return `true` to allow removing `count` files totalling `bytes`.
    fn confirm(&self, count: usize, bytes: u64) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(usize, u64) -> bool,
{
    fn confirm(&self, count: usize, bytes: u64) -> bool {
        self(count, bytes)
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteConfig {
    /// Move files to the trash. `false` is an explicit choice of permanent deletion.
    pub use_trash: bool,
    /// Permanently delete when the trash is unavailable or fails.
    pub permanent_fallback: bool,
    /// Skip the confirmation gate.
    pub force: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            use_trash: true,
            permanent_fallback: false,
            force: false,
        }
    }
}

impl DeleteConfig {
    /// Create config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self::default()
    }

    /// Create config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self {
            use_trash: false,
            ..Self::default()
        }
    }

    /// Allow permanent deletion when trashing is not possible.
    #[must_use]
    pub fn with_permanent_fallback(mut self, allow: bool) -> Self {
        self.permanent_fallback = allow;
        self
    }

    /// Skip the confirmation gate.
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Outcome of [`SafeDeleter::execute`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Actions that removed their file
    pub succeeded: usize,
    /// Actions that failed
    pub failed: usize,
    /// Bytes freed by successful actions
    pub reclaimed_bytes: u64,
    /// Whether shutdown stopped the batch early
    pub interrupted: bool,
    /// Every action with its final state, in input order
    pub actions: Vec<ResolutionAction>,
}

impl ExecutionReport {
    /// Number of simulated actions (never executed).
    #[must_use]
    pub fn simulated(&self) -> usize {
        self.actions.iter().filter(|a| a.simulated).count()
    }

    /// Check if every executed action succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && !self.interrupted
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let freed = bytesize::ByteSize::b(self.reclaimed_bytes);
        let mut text = if self.failed == 0 {
            format!("Deleted {} file(s), freed {}", self.succeeded, freed)
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {}",
                self.succeeded, self.failed, freed
            )
        };
        if self.interrupted {
            text.push_str(" (interrupted)");
        }
        text
    }
}

enum Method {
    Trash,
    Permanent,
}

/// Executes resolution actions behind a confirmation gate.
pub struct SafeDeleter {
    config: DeleteConfig,
    trash: Option<Box<dyn Trash>>,
    confirm: Option<Box<dyn Confirm>>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for SafeDeleter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeDeleter")
            .field("config", &self.config)
            .field("trash", &self.trash.as_ref().map(|_| "<trash>"))
            .field("confirm", &self.confirm.as_ref().map(|_| "<confirm>"))
            .field("shutdown_flag", &self.shutdown_flag)
            .finish()
    }
}

impl SafeDeleter {
    /// Create a deleter using the system trash and no confirmer.
    #[must_use]
    pub fn new(config: DeleteConfig) -> Self {
        Self {
            config,
            trash: Some(Box::new(SystemTrash)),
            confirm: None,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Replace the trash backend.
    #[must_use]
    pub fn with_trash(mut self, trash: impl Trash + 'static) -> Self {
        self.trash = Some(Box::new(trash));
        self
    }

    /// Run without any trash backend.
    #[must_use]
    pub fn without_trash(mut self) -> Self {
        self.trash = None;
        self
    }

    /// Set the confirmation gate.
    #[must_use]
    pub fn with_confirm(mut self, confirm: impl Confirm + 'static) -> Self {
        self.confirm = Some(Box::new(confirm));
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

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Execute `actions`, returning them with their final state.
    ///
    /// # Errors
    ///
    /// Returned before any file is touched:
    /// - [`DeleteError::Interrupted`] if shutdown was already requested
    /// - [`DeleteError::ConfirmationRequired`] without `force` or a confirmer
    /// - [`DeleteError::ConfirmationDeclined`] if the confirmer says no
    ///
    /// A batch with no real actions needs no confirmation and succeeds.
    pub fn execute(
        &self,
        mut actions: Vec<ResolutionAction>,
    ) -> Result<ExecutionReport, DeleteError> {
        let pending: Vec<usize> = actions
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.simulated && a.is_pending())
            .map(|(i, _)| i)
            .collect();

        if pending.is_empty() {
            log::info!(
                "No deletions to perform ({} simulated action(s))",
                actions.iter().filter(|a| a.simulated).count()
            );
            return Ok(ExecutionReport {
                actions,
                ..Default::default()
            });
        }

        if self.is_shutdown_requested() {
            return Err(DeleteError::Interrupted);
        }

        let count = pending.len();
        let bytes = pending_bytes(&actions);
        if !self.config.force {
            match self.confirm {
                None => return Err(DeleteError::ConfirmationRequired { count, bytes }),
                Some(ref confirm) => {
                    if !confirm.confirm(count, bytes) {
                        log::info!("Deletion of {} file(s) declined", count);
                        return Err(DeleteError::ConfirmationDeclined);
                    }
                }
            }
        }

        log::info!(
            "Deleting {} file(s) ({} bytes) {}",
            count,
            bytes,
            if self.config.use_trash { "to trash" } else { "permanently" }
        );
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(Phase::Deleting, count);
        }

        let mut report = ExecutionReport::default();
        for (done, &index) in pending.iter().enumerate() {
            if self.is_shutdown_requested() {
                log::warn!(
                    "Shutdown requested, leaving {} action(s) pending",
                    count - done
                );
                report.interrupted = true;
                break;
            }

            let action = &mut actions[index];
            match self.execute_one(action) {
                Ok(method) => {
                    match method {
                        Method::Trash => log::info!("Moved to trash: {}", action.path.display()),
                        Method::Permanent => {
                            log::info!("Permanently deleted: {}", action.path.display());
                        }
                    }
                    action.mark_deleted();
                    report.succeeded += 1;
                    report.reclaimed_bytes += action.size;
                }
                Err(e) => {
                    log::warn!("Failed to delete {}: {}", action.path.display(), e);
                    action.mark_failed(&e);
                    report.failed += 1;
                }
            }

            if let Some(ref callback) = self.progress_callback {
                callback.on_progress(done + 1, count);
            }
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(Phase::Deleting);
        }

        report.actions = actions;
        log::info!("{}", report.summary());
        Ok(report)
    }

    fn execute_one(&self, action: &ResolutionAction) -> Result<Method, ActionError> {
        if fs::metadata(&action.keep_path).is_err() {
            return Err(ActionError::KeptCopyMissing {
                path: action.path.clone(),
                keep_path: action.keep_path.clone(),
            });
        }

        if same_file(&action.path, &action.keep_path) {
            return Err(ActionError::SameFile {
                path: action.path.clone(),
                keep_path: action.keep_path.clone(),
            });
        }

        let metadata =
            fs::symlink_metadata(&action.path).map_err(|e| ActionError::from_io(&action.path, e))?;
        if metadata.len() != action.size {
            return Err(ActionError::Modified {
                path: action.path.clone(),
                expected: action.size,
                actual: metadata.len(),
            });
        }

        if !self.config.use_trash {
            return permanent_delete(&action.path).map(|()| Method::Permanent);
        }

        match self.trash {
            Some(ref trash) if trash.is_available() => match trash.move_to_trash(&action.path) {
                Ok(()) => Ok(Method::Trash),
                Err(e) if self.config.permanent_fallback => {
                    log::warn!(
                        "Trash failed for {} ({}), deleting permanently",
                        action.path.display(),
                        e
                    );
                    permanent_delete(&action.path).map(|()| Method::Permanent)
                }
                Err(e) => Err(ActionError::TrashFailed {
                    path: action.path.clone(),
                    message: e.to_string(),
                }),
            },
            _ if self.config.permanent_fallback => {
                log::debug!("Trash unavailable, deleting permanently");
                permanent_delete(&action.path).map(|()| Method::Permanent)
            }
            _ => Err(ActionError::PermanentDeleteRequired(action.path.clone())),
        }
    }
}

/// Whether both paths resolve to the same file on disk.
fn same_file(path: &Path, keep_path: &Path) -> bool {
    match (fs::canonicalize(path), fs::canonicalize(keep_path)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Permanently delete a single file. Cannot be undone.
fn permanent_delete(path: &Path) -> Result<(), ActionError> {
    fs::remove_file(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ActionError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => ActionError::PermissionDenied(path.to_path_buf()),
        _ => ActionError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })
}

/// Bytes freed if every real, still pending action succeeded.
#[must_use]
pub fn pending_bytes(actions: &[ResolutionAction]) -> u64 {
    actions
        .iter()
        .filter(|a| !a.simulated && a.is_pending())
        .map(|a| a.size)
        .sum()
}
