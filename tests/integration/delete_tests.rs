use dupsweep::actions::{
    plan_resolution, ActionOutcome, DeleteConfig, DeleteError, KeepStrategy, ResolutionAction,
    SafeDeleter, Trash,
};
use dupsweep::duplicates::DuplicateFinder;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};

/// Trash double that removes the file and remembers it.
#[derive(Clone, Default)]
struct RecordingTrash {
    trashed: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingTrash {
    fn trashed(&self) -> Vec<PathBuf> {
        self.trashed.lock().unwrap().clone()
    }
}

impl Trash for RecordingTrash {
    fn move_to_trash(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)?;
        self.trashed.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

struct UnavailableTrash;

impl Trash for UnavailableTrash {
    fn is_available(&self) -> bool {
        false
    }

    fn move_to_trash(&self, _path: &Path) -> io::Result<()> {
        Err(io::Error::other("no trash here"))
    }
}

fn write(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

/// Three copies of one file plus a unique file; returns the planned actions.
fn fixture(dry_run: bool) -> (TempDir, Vec<ResolutionAction>) {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"duplicate body");
    write(&dir.path().join("b.txt"), b"duplicate body");
    write(&dir.path().join("c.txt"), b"duplicate body");
    write(&dir.path().join("u.txt"), b"unique");

    let report = DuplicateFinder::with_defaults()
        .scan(&[dir.path().to_path_buf()])
        .unwrap();
    let actions = plan_resolution(&report.groups, KeepStrategy::First, dry_run);
    (dir, actions)
}

fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let path = e.unwrap().path();
            (
                path.file_name().unwrap().to_string_lossy().into_owned(),
                fs::read(&path).unwrap(),
            )
        })
        .collect();
    entries.sort();
    entries
}

#[test]
fn test_trash_deletion_keeps_first_copy() {
    let (dir, actions) = fixture(false);
    let trash = RecordingTrash::default();

    let report = SafeDeleter::new(DeleteConfig::trash().with_force(true))
        .with_trash(trash.clone())
        .execute(actions)
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.reclaimed_bytes, 28);
    assert!(report.all_succeeded());
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
    assert!(!dir.path().join("c.txt").exists());
    assert!(dir.path().join("u.txt").exists());
    assert_eq!(trash.trashed().len(), 2);
}

#[test]
fn test_dry_run_execute_leaves_filesystem_unchanged() {
    let (dir, actions) = fixture(true);
    let before = snapshot(dir.path());
    let trash = RecordingTrash::default();

    // No confirmer and no force: simulated batches need no confirmation.
    let report = SafeDeleter::new(DeleteConfig::trash())
        .with_trash(trash.clone())
        .execute(actions)
        .unwrap();

    assert_eq!(snapshot(dir.path()), before);
    assert!(trash.trashed().is_empty());
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.simulated(), 2);
    assert!(report
        .actions
        .iter()
        .all(|a| a.outcome == ActionOutcome::Pending));
}

#[test]
fn test_out_of_band_deletion_fails_only_that_action() {
    let (dir, actions) = fixture(false);
    fs::remove_file(dir.path().join("b.txt")).unwrap();

    let report = SafeDeleter::new(DeleteConfig::trash().with_force(true))
        .with_trash(RecordingTrash::default())
        .execute(actions)
        .unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded, 1);
    let failed = &report.actions[0];
    assert!(failed.path.ends_with("b.txt"));
    assert_eq!(failed.outcome, ActionOutcome::Failed);
    assert!(failed.error.is_some());
    assert_eq!(report.actions[1].outcome, ActionOutcome::Deleted);
    assert!(!dir.path().join("c.txt").exists());
    assert!(dir.path().join("a.txt").exists());
}

#[test]
fn test_modified_file_is_not_deleted() {
    let (dir, actions) = fixture(false);
    write(&dir.path().join("c.txt"), b"edited after the scan, now longer");

    let report = SafeDeleter::new(DeleteConfig::trash().with_force(true))
        .with_trash(RecordingTrash::default())
        .execute(actions)
        .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert!(dir.path().join("c.txt").exists());
}

#[test]
fn test_missing_kept_copy_blocks_removal() {
    let (dir, actions) = fixture(false);
    fs::remove_file(dir.path().join("a.txt")).unwrap();

    let report = SafeDeleter::new(DeleteConfig::trash().with_force(true))
        .with_trash(RecordingTrash::default())
        .execute(actions)
        .unwrap();

    assert_eq!(report.failed, 2);
    assert!(dir.path().join("b.txt").exists());
    assert!(dir.path().join("c.txt").exists());
}

#[test]
fn test_confirmation_required_without_force_or_prompt() {
    let (dir, actions) = fixture(false);
    let before = snapshot(dir.path());

    let err = SafeDeleter::new(DeleteConfig::trash())
        .with_trash(RecordingTrash::default())
        .execute(actions)
        .unwrap_err();

    assert!(matches!(
        err,
        DeleteError::ConfirmationRequired { count: 2, bytes: 28 }
    ));
    assert_eq!(snapshot(dir.path()), before);
}

#[test]
fn test_confirm_receives_count_and_bytes() {
    let (dir, actions) = fixture(false);
    let seen = Arc::new(Mutex::new(None));
    let seen_in_prompt = Arc::clone(&seen);

    let err = SafeDeleter::new(DeleteConfig::trash())
        .with_trash(RecordingTrash::default())
        .with_confirm(move |count: usize, bytes: u64| {
            *seen_in_prompt.lock().unwrap() = Some((count, bytes));
            false
        })
        .execute(actions)
        .unwrap_err();

    assert_eq!(err, DeleteError::ConfirmationDeclined);
    assert_eq!(*seen.lock().unwrap(), Some((2, 28)));
    assert!(dir.path().join("b.txt").exists());
}

#[test]
fn test_confirm_accepted_runs_batch() {
    let (dir, actions) = fixture(false);
    let prompts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&prompts);

    let report = SafeDeleter::new(DeleteConfig::trash())
        .with_trash(RecordingTrash::default())
        .with_confirm(move |_: usize, _: u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .execute(actions)
        .unwrap();

    assert_eq!(prompts.load(Ordering::SeqCst), 1);
    assert_eq!(report.succeeded, 2);
    assert!(!dir.path().join("b.txt").exists());
}

#[test]
fn test_shutdown_before_gate_deletes_nothing() {
    let (dir, actions) = fixture(false);
    let flag = Arc::new(AtomicBool::new(true));

    let err = SafeDeleter::new(DeleteConfig::trash().with_force(true))
        .with_trash(RecordingTrash::default())
        .with_shutdown_flag(flag)
        .execute(actions)
        .unwrap_err();

    assert_eq!(err, DeleteError::Interrupted);
    assert!(dir.path().join("b.txt").exists());
    assert!(dir.path().join("c.txt").exists());
}

#[test]
fn test_shutdown_during_batch_leaves_rest_pending() {
    let (dir, actions) = fixture(false);
    let flag = Arc::new(AtomicBool::new(false));
    let flag_in_trash = Arc::clone(&flag);

    struct StopAfterFirst(Arc<AtomicBool>);
    impl Trash for StopAfterFirst {
        fn move_to_trash(&self, path: &Path) -> io::Result<()> {
            fs::remove_file(path)?;
            self.0.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    let report = SafeDeleter::new(DeleteConfig::trash().with_force(true))
        .with_trash(StopAfterFirst(flag_in_trash))
        .with_shutdown_flag(flag)
        .execute(actions)
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.succeeded, 1);
    assert!(report.actions[1].is_pending());
    assert!(dir.path().join("c.txt").exists());
}

#[test]
fn test_unavailable_trash_requires_permanent_opt_in() {
    let (dir, actions) = fixture(false);

    let report = SafeDeleter::new(DeleteConfig::trash().with_force(true))
        .with_trash(UnavailableTrash)
        .execute(actions.clone())
        .unwrap();
    assert_eq!(report.failed, 2);
    assert!(report.actions[0]
        .error
        .as_deref()
        .unwrap()
        .contains("permanent"));
    assert!(dir.path().join("b.txt").exists());

    let report = SafeDeleter::new(
        DeleteConfig::trash()
            .with_force(true)
            .with_permanent_fallback(true),
    )
    .with_trash(UnavailableTrash)
    .execute(actions)
    .unwrap();
    assert_eq!(report.succeeded, 2);
    assert!(!dir.path().join("b.txt").exists());
}

#[test]
fn test_permanent_mode_never_touches_trash() {
    let (dir, actions) = fixture(false);
    let trash = RecordingTrash::default();

    let report = SafeDeleter::new(DeleteConfig::permanent().with_force(true))
        .with_trash(trash.clone())
        .execute(actions)
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert!(trash.trashed().is_empty());
    assert!(!dir.path().join("b.txt").exists());
}
