// Log framing: writer, reader, and how damage is reported.

mod common;

use std::fs;

use lsm_repair::wal::record::{CRC_SIZE, HEADER_SIZE};
use lsm_repair::wal::{WALReader, WALWriter};

fn read_all(path: &std::path::Path, verify: bool) -> (Vec<Vec<u8>>, Vec<usize>) {
    let reader = WALReader::new(path, verify).unwrap();
    let mut dropped = Vec::new();
    let records = reader
        .records(|bytes, _| dropped.push(bytes))
        .map(|r| r.to_vec())
        .collect();
    (records, dropped)
}

// =============================================================================
// Test 1: records come back in the order they were appended
// =============================================================================
#[test]
fn records_read_back_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("000001.log");
    let mut writer = WALWriter::new(&path).unwrap();
    for i in 0..20u32 {
        writer.add_record(format!("record-{i}").as_bytes()).unwrap();
    }
    assert_eq!(writer.offset(), fs::metadata(&path).unwrap().len());

    let (records, dropped) = read_all(&path, true);
    assert_eq!(records.len(), 20);
    assert_eq!(records[7], b"record-7");
    assert!(dropped.is_empty());
}

// =============================================================================
// Test 2: a checksum failure drops that record only
// =============================================================================
#[test]
fn bad_checksum_drops_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("000001.log");
    common::write_log_records(dir.path(), 1, &[b"first".to_vec(), b"second".to_vec(), b"third".to_vec()]);

    let second_payload = (HEADER_SIZE + 5) + HEADER_SIZE;
    common::corrupt_byte(&path, second_payload + 2);

    let (records, dropped) = read_all(&path, true);
    assert_eq!(records, vec![b"first".to_vec(), b"third".to_vec()]);
    assert_eq!(dropped, vec![HEADER_SIZE + 6]);
}

// =============================================================================
// Test 3: without verification the damaged payload is returned as is
// =============================================================================
#[test]
fn unverified_read_keeps_damaged_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("000001.log");
    common::write_log_records(dir.path(), 1, &[b"aaaa".to_vec(), b"bbbb".to_vec()]);
    common::corrupt_byte(&path, HEADER_SIZE);

    let (records, dropped) = read_all(&path, false);
    assert_eq!(records.len(), 2);
    assert_ne!(records[0], b"aaaa");
    assert!(dropped.is_empty());
}

// =============================================================================
// Test 4: a record cut off by a crash drops the tail and ends the stream
// =============================================================================
#[test]
fn truncated_tail_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("000001.log");
    common::write_log_records(dir.path(), 1, &[b"kept".to_vec(), b"lost-in-crash".to_vec()]);
    let len = fs::metadata(&path).unwrap().len();
    fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_len(len - 3)
        .unwrap();

    let (records, dropped) = read_all(&path, true);
    assert_eq!(records, vec![b"kept".to_vec()]);
    assert_eq!(dropped, vec![HEADER_SIZE + 13 - 3]);
}

// =============================================================================
// Test 5: new() appends, create() starts over
// =============================================================================
#[test]
fn append_versus_create() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("MANIFEST-000001");

    WALWriter::new(&path).unwrap().add_record(b"one").unwrap();
    WALWriter::new(&path).unwrap().add_record(b"two").unwrap();
    assert_eq!(read_all(&path, true).0.len(), 2);

    let mut writer = WALWriter::create(&path).unwrap();
    assert_eq!(writer.offset(), 0);
    writer.add_record(b"three").unwrap();
    assert_eq!(read_all(&path, true).0, vec![b"three".to_vec()]);
}

// =============================================================================
// Test 6: a damaged length field costs one record, reading resumes after it
// =============================================================================
#[test]
fn bad_length_resyncs_at_next_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("000002.log");
    let mut writer = WALWriter::new(&path).unwrap();
    writer.add_record(b"alpha").unwrap();
    let second = writer.add_record(b"bravo").unwrap() as usize;
    let third = vec![b'c'; 300];
    writer.add_record(&third).unwrap();
    writer.finish().unwrap();

    // length now points far past end of file
    common::corrupt_byte(&path, second + CRC_SIZE + 2);
    let (records, dropped) = read_all(&path, true);
    assert_eq!(records, vec![b"alpha".to_vec(), third.clone()]);
    assert_eq!(dropped, vec![HEADER_SIZE + 5]);

    // length 250, still inside the file: the checksum catches it
    common::corrupt_byte(&path, second + CRC_SIZE + 2);
    common::corrupt_byte(&path, second + CRC_SIZE);
    let (records, dropped) = read_all(&path, true);
    assert_eq!(records, vec![b"alpha".to_vec(), third.clone()]);
    assert_eq!(dropped, vec![HEADER_SIZE + 5]);
}

// =============================================================================
// Test 7: records are durable and counted once the writer finishes
// =============================================================================
#[test]
fn finish_returns_file_length() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("000003.log");
    let mut writer = WALWriter::new(&path).unwrap();

    assert_eq!(writer.add_record(b"a").unwrap(), 0);
    let start = writer.add_record(b"bc").unwrap();
    assert_eq!(start, (HEADER_SIZE + 1) as u64);
    writer.sync().unwrap();
    assert_eq!(writer.finish().unwrap(), fs::metadata(&path).unwrap().len());
    assert_eq!(read_all(&path, true).0, vec![b"a".to_vec(), b"bc".to_vec()]);
}
