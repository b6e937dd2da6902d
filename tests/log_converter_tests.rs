// Replaying logs into tables in a plain (single group) directory.

mod common;

use std::collections::BTreeMap;
use std::fs;

use lsm_repair::Options;
use lsm_repair::filename::log_file_name;
use lsm_repair::repair::Repairer;

fn state(pairs: &[(&str, Option<&str>)]) -> BTreeMap<String, Option<String>> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
        .collect()
}

// =============================================================================
// Test 1: newest write wins, last_sequence is the last sequence in the log
// =============================================================================
#[test]
fn newest_write_wins() {
    let dir = tempfile::tempdir().unwrap();
    common::write_log(
        dir.path(),
        1,
        &[
            common::batch(10, &[("a", Some("1")), ("b", Some("1"))]),
            common::batch(12, &[("a", Some("2"))]),
            common::batch(13, &[("c", Some("1")), ("b", None), ("a", Some("3"))]),
        ],
    );

    Repairer::new(dir.path(), Options::default()).run().unwrap();

    let edit = common::manifest(dir.path());
    assert_eq!(edit.last_sequence, Some(15));
    assert_eq!(edit.new_files.len(), 1);
    assert_eq!(
        common::visible_state(dir.path()),
        state(&[("a", Some("3")), ("b", None), ("c", Some("1"))])
    );
}

// =============================================================================
// Test 2: a record too short for a batch header is dropped, later ones kept
// =============================================================================
#[test]
fn short_record_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    common::write_log_records(
        dir.path(),
        1,
        &[
            common::put(1, "x", "1").contents().to_vec(),
            vec![0u8; 7],
            common::put(2, "y", "2").contents().to_vec(),
        ],
    );

    Repairer::new(dir.path(), Options::default()).run().unwrap();
    assert_eq!(
        common::visible_state(dir.path()),
        state(&[("x", Some("1")), ("y", Some("2"))])
    );
}

// =============================================================================
// Test 3: a record failing its checksum costs only that batch
// =============================================================================
#[test]
fn checksum_failure_costs_one_batch() {
    let dir = tempfile::tempdir().unwrap();
    let first = common::put(1, "first", "1");
    common::write_log(
        dir.path(),
        4,
        &[first.clone(), common::put(2, "second", "2"), common::put(3, "third", "3")],
    );
    // inside the second record's payload
    let offset = 8 + first.byte_size() + 8 + 14;
    common::corrupt_byte(&log_file_name(dir.path(), 4), offset);

    Repairer::new(dir.path(), Options::default()).run().unwrap();
    assert_eq!(
        common::visible_state(dir.path()),
        state(&[("first", Some("1")), ("third", Some("3"))])
    );
    assert_eq!(common::manifest(dir.path()).last_sequence, Some(3));
}

// =============================================================================
// Test 4: a batch with a damaged record keeps the mutations before it
// =============================================================================
#[test]
fn damaged_batch_keeps_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let whole = common::batch(5, &[("p", Some("1")), ("q", Some("2"))]);
    let cut = whole.contents()[..whole.byte_size() - 1].to_vec();
    common::write_log_records(dir.path(), 1, &[cut, common::put(7, "r", "3").contents().to_vec()]);

    Repairer::new(dir.path(), Options::default()).run().unwrap();
    assert_eq!(
        common::visible_state(dir.path()),
        state(&[("p", Some("1")), ("r", Some("3"))])
    );
}

// =============================================================================
// Test 5: several logs, replayed in file-number order, each into its own table
// =============================================================================
#[test]
fn logs_convert_in_order() {
    let dir = tempfile::tempdir().unwrap();
    common::write_log(dir.path(), 9, &[common::put(20, "k", "new")]);
    common::write_log(dir.path(), 2, &[common::put(1, "k", "old")]);

    let report = Repairer::new(dir.path(), Options::default()).run().unwrap();
    assert_eq!(report.tables(), 2);

    let edit = common::manifest(dir.path());
    let numbers: Vec<u64> = edit.new_files.iter().map(|(_, f)| f.number).collect();
    assert_eq!(numbers, vec![10, 11]);
    assert_eq!(edit.next_file_number, Some(12));
    assert_eq!(common::visible_state(dir.path()), state(&[("k", Some("new"))]));

    // the table built from log 2 got the first new number
    let first = common::table_entries(dir.path(), 10);
    assert_eq!(first[0].0.sequence, 1);
}

// =============================================================================
// Test 6: every log is archived, even one that yields nothing
// =============================================================================
#[test]
fn logs_are_archived_even_when_empty() {
    let dir = tempfile::tempdir().unwrap();
    common::write_log(dir.path(), 3, &[]);
    fs::write(log_file_name(dir.path(), 4), b"garbage").unwrap();

    let report = Repairer::new(dir.path(), Options::default()).run().unwrap();
    assert_eq!(report.tables(), 0);
    assert!(dir.path().join("lost").join("000003.log").exists());
    assert!(dir.path().join("lost").join("000004.log").exists());

    let edit = common::manifest(dir.path());
    assert!(edit.new_files.is_empty());
    assert_eq!(edit.last_sequence, Some(0));
    assert_eq!(edit.next_file_number, Some(5));
}

// =============================================================================
// Test 7: a damaged length field in the middle of a log loses one batch only
// =============================================================================
#[test]
fn damaged_length_loses_one_batch() {
    let dir = tempfile::tempdir().unwrap();
    let first = common::put(1, "a", "1");
    common::write_log(dir.path(), 1, &[first.clone(), common::put(2, "b", "2"), common::put(3, "c", "3")]);
    // high byte of the second record's length
    let offset = 8 + first.byte_size() + 4 + 2;
    common::corrupt_byte(&log_file_name(dir.path(), 1), offset);

    Repairer::new(dir.path(), Options::default()).run().unwrap();
    assert_eq!(
        common::visible_state(dir.path()),
        state(&[("a", Some("1")), ("c", Some("3"))])
    );
    assert_eq!(common::manifest(dir.path()).last_sequence, Some(3));
}

// =============================================================================
// Test 8: batches whose sequence numbers cannot be encoded are dropped
// =============================================================================
#[test]
fn out_of_range_sequences_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    common::write_log(
        dir.path(),
        1,
        &[
            common::put(5, "ok", "1"),
            common::batch(u64::MAX, &[("k", Some("x")), ("j", Some("y"))]),
            common::put(1 << 56, "big", "z"),
            common::put(6, "also", "2"),
        ],
    );

    Repairer::new(dir.path(), Options::default()).run().unwrap();
    assert_eq!(
        common::visible_state(dir.path()),
        state(&[("also", Some("2")), ("ok", Some("1"))])
    );
    assert_eq!(common::manifest(dir.path()).last_sequence, Some(6));
}
