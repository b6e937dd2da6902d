// Helpers for building damaged databases on disk.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use lsm_repair::batch::WriteBatch;
use lsm_repair::filename::{log_file_name, table_file_name};
use lsm_repair::iterator::StorageIterator;
use lsm_repair::manifest::{VersionEdit, read_current};
use lsm_repair::sstable::builder::SSTableBuilder;
use lsm_repair::sstable::reader::SSTable;
use lsm_repair::types::{InternalKey, ValueType};

/// One mutation: `Some(value)` is a put, `None` a delete.
pub type Op<'a> = (&'a str, Option<&'a str>);

pub fn batch(sequence: u64, ops: &[Op]) -> WriteBatch {
    let mut batch = WriteBatch::new();
    batch.set_sequence(sequence);
    for (key, value) in ops {
        match value {
            Some(v) => batch.put(key.as_bytes(), v.as_bytes()),
            None => batch.delete(key.as_bytes()),
        }
    }
    batch
}

pub fn put(sequence: u64, key: &str, value: &str) -> WriteBatch {
    batch(sequence, &[(key, Some(value))])
}

/// Frame raw payloads into log `number`, as the WAL writer would.
pub fn write_log_records(dir: &Path, number: u64, records: &[Vec<u8>]) {
    let mut data = Vec::new();
    for record in records {
        data.extend_from_slice(&lsm_repair::wal::encode_record(record));
    }
    fs::write(log_file_name(dir, number), data).unwrap();
}

pub fn write_log(dir: &Path, number: u64, batches: &[WriteBatch]) {
    let records: Vec<Vec<u8>> = batches.iter().map(|b| b.contents().to_vec()).collect();
    write_log_records(dir, number, &records);
}

/// Write table `number` holding `(user_key, sequence, value)` puts.
pub fn write_table(dir: &Path, number: u64, entries: &[(&str, u64, &str)]) -> u64 {
    write_table_with_block_size(dir, number, entries, 4096)
}

pub fn write_table_with_block_size(
    dir: &Path,
    number: u64,
    entries: &[(&str, u64, &str)],
    block_size: usize,
) -> u64 {
    let mut sorted: Vec<(InternalKey, &str)> = entries
        .iter()
        .map(|(k, seq, v)| (InternalKey::new(k.as_bytes().to_vec(), *seq, ValueType::Put), *v))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let path = table_file_name(dir, number);
    let mut builder = SSTableBuilder::new(&path, number, block_size, 0.01).unwrap();
    for (key, value) in &sorted {
        builder.add(&key.encode(), value.as_bytes()).unwrap();
    }
    builder.finish().unwrap().file_size
}

/// Every entry of a table, decoded.
pub fn table_entries(dir: &Path, number: u64) -> Vec<(InternalKey, Vec<u8>)> {
    let path = table_file_name(dir, number);
    let size = fs::metadata(&path).unwrap().len();
    let table = Rc::new(SSTable::open(&path, size).unwrap());
    let mut iter = table.iter();
    iter.seek_to_first().unwrap();
    let mut out = Vec::new();
    while iter.is_valid() {
        out.push((InternalKey::decode(iter.key()).unwrap(), iter.value().to_vec()));
        iter.next().unwrap();
    }
    assert!(iter.status().is_none());
    out
}

/// The single edit of the manifest CURRENT points at.
pub fn manifest(dir: &Path) -> VersionEdit {
    let mut edits = read_current(dir).unwrap();
    assert_eq!(edits.len(), 1, "repair writes exactly one edit");
    edits.remove(0)
}

/// Newest visible value of every user key in the manifest's tables.
/// Deleted keys map to None.
pub fn visible_state(dir: &Path) -> BTreeMap<String, Option<String>> {
    let mut newest: BTreeMap<String, (u64, Option<String>)> = BTreeMap::new();
    for (_, file) in manifest(dir).new_files {
        for (key, value) in table_entries(dir, file.number) {
            let user_key = String::from_utf8(key.user_key.clone()).unwrap();
            let value = match key.value_type {
                ValueType::Put => Some(String::from_utf8(value).unwrap()),
                ValueType::Delete => None,
            };
            let newer = newest.get(&user_key).is_none_or(|(seq, _)| key.sequence > *seq);
            if newer {
                newest.insert(user_key, (key.sequence, value));
            }
        }
    }
    newest.into_iter().map(|(k, (_, v))| (k, v)).collect()
}

/// Flip one byte of a file in place.
pub fn corrupt_byte(path: &Path, offset: usize) {
    let mut data = fs::read(path).unwrap();
    data[offset] ^= 0xff;
    fs::write(path, data).unwrap();
}
