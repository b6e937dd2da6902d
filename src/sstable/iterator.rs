use std::rc::Rc;

use crate::error::{Error, Result};
use crate::iterator::StorageIterator;
use crate::sstable::block::reader::Block;
use crate::sstable::reader::SSTable;

/// Walks a table block by block.
///
/// A block that cannot be read, fails its checksum, or does not decode is
/// skipped; the first such error is kept and reported by `status()`, so a
/// scan sees every readable entry and still learns the file is damaged.
pub struct SSTableIterator {
    table: Rc<SSTable>,
    block_idx: usize,
    block: Option<Block>,
    entry_idx: usize,
    status: Option<Error>,
}

impl SSTableIterator {
    pub(crate) fn new(table: Rc<SSTable>) -> Self {
        let mut iter = SSTableIterator {
            table,
            block_idx: 0,
            block: None,
            entry_idx: 0,
            status: None,
        };
        iter.load_from(0);
        iter
    }

    /// Position on the first entry of the first readable block at or after `idx`.
    fn load_from(&mut self, mut idx: usize) {
        self.block = None;
        self.entry_idx = 0;
        while idx < self.table.num_blocks() {
            match self.table.data_block(idx) {
                Ok(block) if !block.is_empty() => {
                    self.block_idx = idx;
                    self.block = Some(block);
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    if self.status.is_none() {
                        self.status = Some(Error::Corruption(format!(
                            "{} block {idx}: {e}",
                            self.table.path().display()
                        )));
                    }
                }
            }
            idx += 1;
        }
        self.block_idx = idx;
    }

    fn current(&self) -> Option<(&[u8], &[u8])> {
        self.block.as_ref()?.entry(self.entry_idx)
    }
}

impl StorageIterator for SSTableIterator {
    fn key(&self) -> &[u8] {
        self.current().map(|(k, _)| k).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.current().map(|(_, v)| v).unwrap_or_default()
    }

    fn is_valid(&self) -> bool {
        self.current().is_some()
    }

    fn next(&mut self) -> Result<()> {
        let Some(block) = &self.block else {
            return Ok(());
        };
        self.entry_idx += 1;
        if self.entry_idx >= block.len() {
            self.load_from(self.block_idx + 1);
        }
        Ok(())
    }

    fn seek_to_first(&mut self) -> Result<()> {
        self.status = None;
        self.load_from(0);
        Ok(())
    }

    fn status(&self) -> Option<&Error> {
        self.status.as_ref()
    }
}
