// Finding the files repair works from.

mod common;

use std::fs;

use lsm_repair::repair::{Repairer, discover, repair_db};
use lsm_repair::{Error, Options};

// =============================================================================
// Test 1: engine files are classified, everything else ignored
// =============================================================================
#[test]
fn classifies_a_real_directory() {
    let dir = tempfile::tempdir().unwrap();
    common::write_log(dir.path(), 12, &[]);
    common::write_log(dir.path(), 3, &[]);
    common::write_table(dir.path(), 7, &[("k", 1, "v")]);
    fs::write(dir.path().join("MANIFEST-000002"), b"").unwrap();
    fs::write(dir.path().join("CURRENT"), b"MANIFEST-000002\n").unwrap();
    fs::write(dir.path().join("notes.txt"), b"").unwrap();
    fs::create_dir(dir.path().join("lost")).unwrap();

    let found = discover(dir.path()).unwrap();
    assert_eq!(found.logs, vec![3, 12]);
    assert_eq!(found.tables, vec![7]);
    assert_eq!(found.manifests, vec!["MANIFEST-000002".to_string()]);
    assert_eq!(found.allocator.next_file_number(), 13);
}

// =============================================================================
// Test 2: nothing recognizable aborts the run before anything is written
// =============================================================================
#[test]
fn empty_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("README"), b"not a database").unwrap();

    let err = Repairer::new(dir.path(), Options::default()).run().unwrap_err();
    assert!(matches!(err, Error::NoFiles(_)));
    assert!(!dir.path().join("CURRENT").exists());
    assert!(!dir.path().join("lost").exists());
}

// =============================================================================
// Test 3: the grouped layout needs a root log or an existing group directory
// =============================================================================
#[test]
fn grouped_root_needs_some_input() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("db");

    // created, but still empty
    let err = repair_db(&root, Options::default()).unwrap_err();
    assert!(matches!(err, Error::NoFiles(_)));
    assert!(root.is_dir());

    fs::create_dir(root.join("0")).unwrap();
    let report = repair_db(&root, Options::default()).unwrap();
    assert_eq!(report.tables(), 0);
    assert!(root.join("0").join("CURRENT").exists());
}

// =============================================================================
// Test 4: an unreadable path is an IO error
// =============================================================================
#[test]
fn missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Repairer::new(dir.path().join("nope"), Options::default()).run().unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

// =============================================================================
// Test 5: bad options are rejected up front
// =============================================================================
#[test]
fn invalid_options_rejected() {
    let dir = tempfile::tempdir().unwrap();
    common::write_log(dir.path(), 1, &[]);
    let options = Options::default().with_block_size(0);
    let err = Repairer::new(dir.path(), options).run().unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}
