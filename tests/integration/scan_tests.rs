use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
use dupsweep::scanner::{HashAlgorithm, WalkerConfig};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

fn names(paths: &[PathBuf]) -> BTreeSet<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let report = DuplicateFinder::with_defaults()
        .scan(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(report.groups.is_empty());
    assert!(report.errors.is_empty());
    assert_eq!(report.summary.total_files, 0);
    assert_eq!(report.summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"content a");
    write(&dir.path().join("b.txt"), b"content b");
    write(&dir.path().join("c.txt"), b"content c");

    let report = DuplicateFinder::with_defaults()
        .scan(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.total_files, 3);
    assert_eq!(report.summary.hashed_files, 3);
}

#[test]
fn test_one_byte_scenario() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"x");
    write(&dir.path().join("b.txt"), b"x");
    write(&dir.path().join("c.txt"), b"y");

    let report = DuplicateFinder::with_defaults()
        .scan(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.size, 1);
    assert_eq!(
        names(&group.paths()),
        ["a.txt", "b.txt"].iter().map(|s| s.to_string()).collect()
    );
    assert!(report
        .groups
        .iter()
        .flat_map(|g| g.files.iter())
        .all(|f| !f.path.ends_with("c.txt")));
    assert_eq!(report.summary.duplicate_files, 1);
    assert_eq!(report.summary.reclaimable_space, 1);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("subdir").join("deeper");
    fs::create_dir_all(&sub).unwrap();

    write(&dir.path().join("top.bin"), b"nested duplicate");
    write(&sub.join("bottom.bin"), b"nested duplicate");

    let report = DuplicateFinder::with_defaults()
        .scan(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
}

#[test]
fn test_members_in_traversal_order() {
    let dir = tempdir().unwrap();
    for name in ["c.dat", "a.dat", "b.dat"] {
        write(&dir.path().join(name), b"same bytes");
    }

    let report = DuplicateFinder::with_defaults()
        .scan(&[dir.path().to_path_buf()])
        .unwrap();

    let order: Vec<String> = report.groups[0]
        .files
        .iter()
        .map(|f| f.file_name())
        .collect();
    assert_eq!(order, vec!["a.dat", "b.dat", "c.dat"]);
}

#[test]
fn test_groups_sorted_by_size_descending() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("s1"), b"ab");
    write(&dir.path().join("s2"), b"ab");
    write(&dir.path().join("l1"), b"abcdefgh");
    write(&dir.path().join("l2"), b"abcdefgh");

    let report = DuplicateFinder::with_defaults()
        .scan(&[dir.path().to_path_buf()])
        .unwrap();

    let sizes: Vec<u64> = report.groups.iter().map(|g| g.size).collect();
    assert_eq!(sizes, vec![8, 2]);
}

#[test]
fn test_same_size_different_content_in_separate_groups() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a1"), b"AAAA");
    write(&dir.path().join("a2"), b"AAAA");
    write(&dir.path().join("b1"), b"BBBB");
    write(&dir.path().join("b2"), b"BBBB");
    write(&dir.path().join("c"), b"CCCC");

    let report = DuplicateFinder::with_defaults()
        .scan(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.groups.len(), 2);
    for group in &report.groups {
        assert_eq!(group.len(), 2);
        assert!(group.files.iter().all(|f| !f.path.ends_with("c")));
    }
    assert_eq!(report.summary.hashed_files, 5);
}

#[test]
fn test_min_size_above_everything_hashes_nothing() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"dup");
    write(&dir.path().join("b"), b"dup");

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_size_bounds(Some(1_000_000), None));
    let finder = DuplicateFinder::new(config);
    let report = finder.scan(&[dir.path().to_path_buf()]).unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.total_files, 0);
    assert_eq!(finder.hasher().invocation_count(), 0);
}

#[test]
fn test_hash_invocations_match_multi_member_buckets() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("pair1"), b"12345");
    write(&dir.path().join("pair2"), b"54321");
    write(&dir.path().join("single"), b"1234567");
    write(&dir.path().join("other"), b"123456789");

    let finder = DuplicateFinder::with_defaults();
    finder.scan(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(finder.hasher().invocation_count(), 2);
}

#[test]
fn test_algorithms_agree_on_membership() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"first content");
    write(&dir.path().join("b"), b"first content");
    write(&dir.path().join("c"), b"other content");
    write(&dir.path().join("d"), b"other content");
    write(&dir.path().join("e"), b"third content");

    let membership = |algorithm: HashAlgorithm| {
        let finder = DuplicateFinder::new(FinderConfig::default().with_algorithm(algorithm));
        let report = finder.scan(&[dir.path().to_path_buf()]).unwrap();
        report
            .groups
            .iter()
            .map(|g| names(&g.paths()))
            .collect::<Vec<_>>()
    };

    let md5 = membership(HashAlgorithm::Md5);
    assert_eq!(md5.len(), 2);
    for algorithm in [HashAlgorithm::Sha1, HashAlgorithm::Sha256, HashAlgorithm::Sha512] {
        assert_eq!(membership(algorithm), md5);
    }
}

#[test]
fn test_fingerprint_records_algorithm() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"same");
    write(&dir.path().join("b"), b"same");

    let finder = DuplicateFinder::new(FinderConfig::default().with_algorithm(HashAlgorithm::Sha1));
    let report = finder.scan(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(report.summary.algorithm, HashAlgorithm::Sha1);
    assert_eq!(report.groups[0].fingerprint.algorithm(), HashAlgorithm::Sha1);
    assert_eq!(report.groups[0].hash_hex().len(), 40);
}

#[test]
fn test_extension_filters() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("one.jpg"), b"pixels");
    write(&dir.path().join("two.JPG"), b"pixels");
    write(&dir.path().join("three.png"), b"pixels");
    write(&dir.path().join("four.tmp"), b"pixels");

    let allow = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_extensions(["jpg"]));
    let report = DuplicateFinder::new(allow)
        .scan(&[dir.path().to_path_buf()])
        .unwrap();
    assert_eq!(report.summary.total_files, 2);
    assert_eq!(report.groups[0].len(), 2);

    let deny = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_exclude_extensions([".tmp"]));
    let report = DuplicateFinder::new(deny)
        .scan(&[dir.path().to_path_buf()])
        .unwrap();
    assert_eq!(report.summary.total_files, 3);
    assert!(report
        .groups
        .iter()
        .flat_map(|g| g.files.iter())
        .all(|f| f.extension != "tmp"));
}

#[test]
fn test_empty_files_grouped_unless_skipped() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty1")).unwrap();
    File::create(dir.path().join("empty2")).unwrap();

    let report = DuplicateFinder::with_defaults()
        .scan(&[dir.path().to_path_buf()])
        .unwrap();
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].size, 0);

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        skip_empty: true,
        ..WalkerConfig::default()
    });
    let report = DuplicateFinder::new(config)
        .scan(&[dir.path().to_path_buf()])
        .unwrap();
    assert!(report.groups.is_empty());
    assert_eq!(report.summary.total_files, 0);
}

#[test]
fn test_single_io_thread_gives_same_result() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        write(&dir.path().join(format!("f{i}")), format!("{}", i % 3).as_bytes());
    }

    let scan = |threads: usize| {
        DuplicateFinder::new(FinderConfig::default().with_io_threads(threads))
            .scan(&[dir.path().to_path_buf()])
            .unwrap()
            .groups
            .iter()
            .map(|g| g.paths())
            .collect::<Vec<_>>()
    };

    assert_eq!(scan(1), scan(8));
}
