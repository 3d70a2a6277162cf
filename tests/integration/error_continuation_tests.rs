use dupsweep::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupsweep::error::ConfigError;
use dupsweep::scanner::{FileRecord, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_scan_records_continues_on_hash_errors() {
    let finder = DuplicateFinder::with_defaults();
    let dir = tempdir().unwrap();
    let missing1 = dir.path().join("nonexistent_1.txt");
    let missing2 = dir.path().join("nonexistent_2.txt");

    let report = finder
        .scan_records(vec![
            FileRecord::new(missing1.clone(), 100),
            FileRecord::new(missing2.clone(), 100),
        ])
        .unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.errors[0].path, missing1);
    assert_eq!(report.errors[1].path, missing2);
    assert_eq!(report.summary.error_count, 2);
}

#[test]
fn test_failed_member_is_excluded_but_group_survives() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"same").unwrap();
    fs::write(&b, b"same").unwrap();
    let gone = dir.path().join("gone");

    let report = DuplicateFinder::with_defaults()
        .scan_records(vec![
            FileRecord::new(a.clone(), 4),
            FileRecord::new(gone.clone(), 4),
            FileRecord::new(b.clone(), 4),
        ])
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].paths(), vec![a, b]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, gone);
}

#[test]
fn test_file_changed_after_walk_is_soft_error() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"1234").unwrap();
    fs::write(&b, b"1234 plus more bytes").unwrap();

    // b was 4 bytes when it was discovered
    let report = DuplicateFinder::with_defaults()
        .scan_records(vec![FileRecord::new(a, 4), FileRecord::new(b.clone(), 4)])
        .unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, b);
}

#[test]
fn test_missing_root_is_configuration_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    File::create(dir.path().join("present")).unwrap();

    let err = DuplicateFinder::with_defaults()
        .scan(&[dir.path().to_path_buf(), missing.clone()])
        .unwrap_err();

    match err {
        FinderError::Config(ConfigError::RootNotFound(path)) => assert_eq!(path, missing),
        other => panic!("expected RootNotFound, got {other:?}"),
    }
}

#[test]
fn test_no_roots_is_configuration_error() {
    let err = DuplicateFinder::with_defaults().scan(&[]).unwrap_err();
    assert!(matches!(err, FinderError::Config(ConfigError::NoRoots)));
}

#[test]
fn test_inverted_size_bounds_rejected_before_walking() {
    let dir = tempdir().unwrap();
    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_size_bounds(Some(10), Some(5)));

    let err = DuplicateFinder::new(config)
        .scan(&[dir.path().to_path_buf()])
        .unwrap_err();
    assert!(matches!(
        err,
        FinderError::Config(ConfigError::InvalidSizeBounds { min: 10, max: 5 })
    ));
}

#[test]
fn test_zero_io_threads_rejected() {
    let dir = tempdir().unwrap();
    let err = DuplicateFinder::new(FinderConfig::default().with_io_threads(0))
        .scan(&[dir.path().to_path_buf()])
        .unwrap_err();
    assert!(matches!(
        err,
        FinderError::Config(ConfigError::InvalidIoThreads)
    ));
}

#[test]
fn test_shutdown_before_scan_interrupts() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("a"))
        .unwrap()
        .write_all(b"x")
        .unwrap();

    let config =
        FinderConfig::default().with_shutdown_flag(Arc::new(AtomicBool::new(true)));
    let finder = DuplicateFinder::new(config);
    let err = finder.scan(&[dir.path().to_path_buf()]).unwrap_err();

    assert!(matches!(err, FinderError::Interrupted));
    assert_eq!(finder.hasher().invocation_count(), 0);
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_soft_error() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"dup").unwrap();
    fs::write(dir.path().join("b.txt"), b"dup").unwrap();

    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("inside.txt"), b"hidden content").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let result = DuplicateFinder::with_defaults().scan(&[dir.path().to_path_buf()]);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let report = result.unwrap();
    assert_eq!(report.groups.len(), 1);
    // Privileged users can still read the directory
    if report.summary.total_files == 2 {
        assert!(!report.errors.is_empty());
    }
}

#[test]
fn test_file_root_is_scanned_directly() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("single.bin");
    let copy = dir.path().join("sub").join("copy.bin");
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(&file, b"payload").unwrap();
    fs::write(&copy, b"payload").unwrap();

    let report = DuplicateFinder::with_defaults()
        .scan(&[file.clone(), dir.path().join("sub")])
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].paths(), vec![file, PathBuf::from(&copy)]);
}
