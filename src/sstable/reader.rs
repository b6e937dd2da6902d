use std::cell::RefCell;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::sstable::block::reader::Block;
use crate::sstable::block::{BLOCK_TRAILER_SIZE, unseal_block};
use crate::sstable::footer::{BlockHandle, Footer, IndexEntry};
use crate::sstable::iterator::SSTableIterator;

/// An opened SSTable file.
///
/// On open:
/// 1. Read footer (last 40 bytes) → find the index block
/// 2. Read, verify and parse the index block → Vec<IndexEntry>
///
/// Data blocks are read on demand by the iterator. Repair only ever scans,
/// so the filter block is written but never loaded.
pub struct SSTable {
    path: PathBuf,
    /// Wrapped in RefCell to allow interior mutability for seeking/reading.
    file: RefCell<File>,
    index: Vec<IndexEntry>,
    file_size: u64,
}

impl SSTable {
    /// Open a table whose size the caller already knows.
    pub fn open(path: &Path, file_size: u64) -> Result<Self> {
        let file = File::open(path)?;
        if file_size < Footer::SIZE as u64 {
            return Err(Error::Corruption(format!(
                "{}: file too short to contain footer ({file_size} bytes)",
                path.display()
            )));
        }

        let mut table = SSTable {
            path: path.to_path_buf(),
            file: RefCell::new(file),
            index: Vec::new(),
            file_size,
        };

        let footer_buf = table.read_at(file_size - Footer::SIZE as u64, Footer::SIZE)?;
        let footer = Footer::decode(&footer_buf)?;

        table.index = IndexEntry::decode_all(&table.read_block(footer.index)?)?;

        Ok(table)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn num_blocks(&self) -> usize {
        self.index.len()
    }

    /// Read, verify and decode the `i`-th data block.
    pub fn data_block(&self, i: usize) -> Result<Block> {
        let entry = self
            .index
            .get(i)
            .ok_or_else(|| Error::Corruption(format!("block {i} out of range")))?;
        Block::decode(self.read_block(entry.handle)?)
    }

    /// Iterate every entry, in file order.
    pub fn iter(self: &Rc<Self>) -> SSTableIterator {
        SSTableIterator::new(Rc::clone(self))
    }

    fn read_block(&self, handle: BlockHandle) -> Result<Vec<u8>> {
        let end = handle
            .end(BLOCK_TRAILER_SIZE)
            .filter(|end| *end <= self.file_size)
            .ok_or_else(|| {
                Error::Corruption(format!(
                    "block at {}+{} lies outside the file",
                    handle.offset, handle.size
                ))
            })?;
        let raw = self.read_at(handle.offset, (end - handle.offset) as usize)?;
        unseal_block(raw)
    }

    fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}
