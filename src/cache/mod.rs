//! Table handle cache.
//!
//! Repair touches each table about once (build, then scan), so a small LRU
//! bounded by entry count is enough. Eviction order does not affect
//! correctness; it only saves re-reading footers and index blocks.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use lru::LruCache;

use crate::error::Result;
use crate::filename::table_file_name;
use crate::sstable::iterator::SSTableIterator;
use crate::sstable::reader::SSTable;

pub struct TableCache {
    dir: PathBuf,
    tables: LruCache<u64, Rc<SSTable>>,
}

impl TableCache {
    pub fn new(dir: &Path, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        TableCache {
            dir: dir.to_path_buf(),
            tables: LruCache::new(capacity),
        }
    }

    /// Open table `number`, reusing a cached handle of the same size.
    pub fn find_table(&mut self, number: u64, file_size: u64) -> Result<Rc<SSTable>> {
        if let Some(table) = self.tables.get(&number) {
            if table.file_size() == file_size {
                return Ok(Rc::clone(table));
            }
        }
        let table = Rc::new(SSTable::open(&table_file_name(&self.dir, number), file_size)?);
        self.tables.put(number, Rc::clone(&table));
        Ok(table)
    }

    pub fn new_iterator(&mut self, number: u64, file_size: u64) -> Result<SSTableIterator> {
        Ok(self.find_table(number, file_size)?.iter())
    }

    /// Drop the handle for a table that is being moved or deleted.
    pub fn evict(&mut self, number: u64) {
        self.tables.pop(&number);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
