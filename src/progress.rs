//! Progress reporting utilities using indicatif.
//!
//! The pipeline never renders anything itself. It reports to an injected
//! [`ProgressCallback`]; [`Progress`] is the terminal implementation used by
//! the CLI, and tests can substitute their own sink.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Pipeline phases that report progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Directory traversal; the total is unknown while walking.
    Walking,
    /// Fingerprinting candidates from multi-member size buckets.
    Hashing,
    /// Executing resolution actions.
    Deleting,
}

impl Phase {
    /// Short lowercase name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Hashing => "hashing",
            Self::Deleting => "deleting",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress sink for the duplicate detection pipeline.
///
/// Implementations must be cheap and thread-safe: hashing workers call
/// [`on_progress`](Self::on_progress) concurrently.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts. `total` is 0 when not known in advance.
    fn on_phase_start(&self, phase: Phase, total: usize);

    /// Called as items are processed.
    ///
    /// # Arguments
    ///
    /// * `processed` - Items processed so far in the current phase
    /// * `total` - Total items in the phase, or 0 when unknown
    fn on_progress(&self, processed: usize, total: usize);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: Phase);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress sink that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&self, _phase: Phase, _total: usize) {}
    fn on_progress(&self, _processed: usize, _total: usize) {}
    fn on_phase_end(&self, _phase: Phase) {}
}

/// Progress reporter using indicatif.
///
/// Keeps one bar per running phase inside a [`MultiProgress`].
pub struct Progress {
    multi: MultiProgress,
    active: Mutex<Option<(Phase, ProgressBar)>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupsweep::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            active: Mutex::new(None),
            quiet,
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn with_active(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.active.lock() {
            if let Some((_, ref pb)) = *guard {
                f(pb);
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: Phase, total: usize) {
        if self.quiet {
            return;
        }

        let pb = match phase {
            Phase::Walking => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::walking_style());
                pb.set_message("Walking directories");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            Phase::Hashing => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style());
                pb.set_message("Hashing");
                pb
            }
            Phase::Deleting => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style());
                pb.set_message("Deleting");
                pb
            }
        };

        if let Ok(mut guard) = self.active.lock() {
            if let Some((_, old)) = guard.replace((phase, pb)) {
                old.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, processed: usize, _total: usize) {
        if self.quiet {
            return;
        }
        self.with_active(|pb| pb.set_position(processed as u64));
    }

    fn on_phase_end(&self, phase: Phase) {
        if self.quiet {
            return;
        }

        if let Ok(mut guard) = self.active.lock() {
            if guard.as_ref().is_some_and(|(p, _)| *p == phase) {
                if let Some((_, pb)) = guard.take() {
                    let message = match phase {
                        Phase::Walking => "Walking complete",
                        Phase::Hashing => "Hashing complete",
                        Phase::Deleting => "Deletion complete",
                    };
                    pb.finish_with_message(message);
                }
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.with_active(|pb| pb.set_message(message.to_string()));
    }
}
