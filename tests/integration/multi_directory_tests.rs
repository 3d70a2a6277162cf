use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
use dupsweep::scanner::WalkerConfig;
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_scan_two_non_overlapping_directories() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();

    File::create(dir1.path().join("a.txt"))
        .unwrap()
        .write_all(b"dup")
        .unwrap();
    File::create(dir2.path().join("b.txt"))
        .unwrap()
        .write_all(b"dup")
        .unwrap();

    let report = DuplicateFinder::with_defaults()
        .scan(&[dir1.path().to_path_buf(), dir2.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    assert!(report.groups[0].files[0].path.starts_with(dir1.path()));
    assert!(report.groups[0].files[1].path.starts_with(dir2.path()));
    assert_eq!(report.summary.total_files, 2);
}

#[test]
fn test_scan_overlapping_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();

    fs::write(dir.path().join("a.txt"), b"content").unwrap();
    fs::write(sub.join("b.txt"), b"content").unwrap();

    let report = DuplicateFinder::with_defaults()
        .scan(&[dir.path().to_path_buf(), sub.clone()])
        .unwrap();

    // Each file is reported once even though `sub` is reachable twice
    assert_eq!(report.summary.total_files, 2);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
}

#[test]
fn test_scan_same_path_twice() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"dup").unwrap();
    fs::write(dir.path().join("b.txt"), b"dup").unwrap();

    let report = DuplicateFinder::with_defaults()
        .scan(&[dir.path().to_path_buf(), dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.summary.total_files, 2);
    assert_eq!(report.groups[0].len(), 2);
}

#[test]
fn test_cross_directory_triple() {
    let dirs: Vec<_> = (0..3).map(|_| tempdir().unwrap()).collect();
    for (i, dir) in dirs.iter().enumerate() {
        let mut f = File::create(dir.path().join(format!("{i}.txt"))).unwrap();
        f.write_all(b"triple").unwrap();
        f.sync_all().unwrap();
    }

    let roots: Vec<_> = dirs.iter().map(|d| d.path().to_path_buf()).collect();
    let report = DuplicateFinder::with_defaults().scan(&roots).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 3);
    assert_eq!(report.summary.duplicate_files, 2);
}

#[cfg(unix)]
#[test]
fn test_symlinks_between_directories() {
    let dir1 = tempdir().unwrap();
    let dir2 = tempdir().unwrap();
    fs::write(dir1.path().join("real.txt"), b"linked").unwrap();
    fs::write(dir1.path().join("copy.txt"), b"linked").unwrap();
    std::os::unix::fs::symlink(dir1.path(), dir2.path().join("link")).unwrap();

    let roots = vec![dir1.path().to_path_buf(), dir2.path().to_path_buf()];

    let report = DuplicateFinder::with_defaults().scan(&roots).unwrap();
    assert_eq!(report.summary.total_files, 2);

    // Following the link reaches the same files, which are not counted twice
    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_follow_symlinks(true));
    let report = DuplicateFinder::new(config).scan(&roots).unwrap();
    assert_eq!(report.summary.total_files, 2);
    assert_eq!(report.groups[0].len(), 2);
}

#[cfg(unix)]
#[test]
fn test_symlinked_root_does_not_group_file_with_itself() {
    use dupsweep::actions::{plan_resolution, DeleteConfig, KeepStrategy, SafeDeleter};

    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("only.txt"), b"the only copy").unwrap();
    let alias = dir.path().join("alias");
    std::os::unix::fs::symlink(&data, &alias).unwrap();

    let report = DuplicateFinder::with_defaults()
        .scan(&[data.clone(), alias])
        .unwrap();
    assert_eq!(report.summary.total_files, 1);
    assert!(report.groups.is_empty());

    let actions = plan_resolution(&report.groups, KeepStrategy::First, false);
    let executed = SafeDeleter::new(DeleteConfig::permanent().with_force(true))
        .execute(actions)
        .unwrap();
    assert_eq!(executed.succeeded, 0);
    assert!(data.join("only.txt").exists());
}

#[test]
fn test_dotdot_root_does_not_group_file_with_itself() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(data.join("sub")).unwrap();
    fs::write(data.join("only.txt"), b"the only copy").unwrap();

    let report = DuplicateFinder::with_defaults()
        .scan(&[data.clone(), data.join("sub").join("..")])
        .unwrap();
    assert_eq!(report.summary.total_files, 1);
    assert!(report.groups.is_empty());
}
