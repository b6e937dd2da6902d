pub mod skiplist;

use skiplist::{SkipList, SkipListIterator};

use crate::error::Result;
use crate::iterator::StorageIterator;
use crate::types::{InternalKey, SequenceNumber, ValueType};

/// In-memory sorted buffer for replayed writes. Wraps a SkipList.
///
/// Every mutation is stored under its full internal key, so two writes to
/// the same user key at different sequence numbers are both kept and the
/// newest sorts first. Deletes are stored as tombstones.
///
/// The buffer is owned by exactly one repairer at a time and is dropped as
/// soon as its contents have been written to a table.
#[derive(Default)]
pub struct MemTable {
    data: SkipList,
}

impl MemTable {
    /// Create a new empty memtable.
    pub fn new() -> Self {
        MemTable {
            data: SkipList::new(),
        }
    }

    /// Record one mutation at `sequence`.
    pub fn add(&mut self, sequence: SequenceNumber, value_type: ValueType, key: &[u8], value: &[u8]) {
        let internal = InternalKey::new(key.to_vec(), sequence, value_type);
        let value = match value_type {
            ValueType::Put => value.to_vec(),
            ValueType::Delete => Vec::new(),
        };
        self.data.insert(internal, value);
    }

    /// Sorted iterator over all entries (including tombstones).
    pub fn iter(&self) -> MemTableIterator<'_> {
        MemTableIterator {
            inner: self.data.iter(),
        }
    }

    /// Decoded entries in internal key order.
    pub fn entries(&self) -> impl Iterator<Item = (&InternalKey, &[u8])> + '_ {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current memory usage in bytes.
    pub fn approximate_memory_usage(&self) -> usize {
        self.data.size_bytes()
    }
}

/// Encoded-key view of a memtable, consumed by the table builder.
pub struct MemTableIterator<'a> {
    inner: SkipListIterator<'a>,
}

impl StorageIterator for MemTableIterator<'_> {
    fn key(&self) -> &[u8] {
        self.inner.peek().unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.inner.peek_value().unwrap_or_default()
    }

    fn is_valid(&self) -> bool {
        self.inner.peek().is_some()
    }

    fn next(&mut self) -> Result<()> {
        Iterator::next(&mut self.inner);
        Ok(())
    }

    fn seek_to_first(&mut self) -> Result<()> {
        self.inner.restart();
        Ok(())
    }
}
