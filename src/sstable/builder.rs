use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::bloom::builder::BloomFilterBuilder;
use crate::error::Result;
use crate::sstable::block::builder::BlockBuilder;
use crate::sstable::block::{BLOCK_TRAILER_SIZE, seal_block};
use crate::sstable::footer::{BlockHandle, Footer, IndexEntry, SSTableMeta};
use crate::sstable::user_key;

/// Writes a table from entries supplied in internal key order.
///
/// ```text
/// [data block + crc]... [filter block + crc] [index block + crc] [footer]
/// ```
///
/// A data block is cut once its size estimate reaches `block_size`, so a
/// single oversized entry still gets a block of its own.
pub struct SSTableBuilder {
    out: BufWriter<File>,
    offset: u64,
    data_block: BlockBuilder,
    index: Vec<IndexEntry>,
    filter: BloomFilterBuilder,
    id: u64,
    block_size: usize,
    smallest: Option<Vec<u8>>,
    last_key: Vec<u8>,
    entry_count: u64,
}

impl SSTableBuilder {
    pub fn new(path: &Path, id: u64, block_size: usize, false_positive_rate: f64) -> Result<Self> {
        Ok(SSTableBuilder {
            out: BufWriter::new(File::create(path)?),
            offset: 0,
            data_block: BlockBuilder::new(),
            index: Vec::new(),
            filter: BloomFilterBuilder::new(false_positive_rate),
            id,
            block_size,
            smallest: None,
            last_key: Vec::new(),
            entry_count: 0,
        })
    }

    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.smallest.get_or_insert_with(|| key.to_vec());
        self.filter.add_key(user_key(key));
        self.data_block.add(key, value);
        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.entry_count += 1;

        if self.data_block.size_estimate() >= self.block_size {
            self.flush_data_block()?;
        }
        Ok(())
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    fn flush_data_block(&mut self) -> Result<()> {
        if self.data_block.is_empty() {
            return Ok(());
        }
        let contents = self.data_block.finish();
        let handle = self.write_block(contents)?;
        self.index.push(IndexEntry {
            last_key: self.last_key.clone(),
            handle,
        });
        Ok(())
    }

    fn write_block(&mut self, contents: Vec<u8>) -> Result<BlockHandle> {
        let handle = BlockHandle::new(self.offset, contents.len() as u64);
        self.out.write_all(&seal_block(contents))?;
        self.offset += handle.size + BLOCK_TRAILER_SIZE as u64;
        Ok(handle)
    }

    /// Write the remaining blocks and the footer, then fsync.
    pub fn finish(mut self) -> Result<SSTableMeta> {
        self.flush_data_block()?;

        let filter = self.filter.build().serialize();
        let filter = self.write_block(filter)?;

        let mut index_block = Vec::new();
        for entry in &self.index {
            entry.encode_to(&mut index_block);
        }
        let index = self.write_block(index_block)?;

        let footer = Footer { index, filter }.encode();
        self.out.write_all(&footer)?;
        self.offset += footer.len() as u64;
        self.out.flush()?;
        self.out.get_ref().sync_all()?;

        let largest = if self.entry_count == 0 { Vec::new() } else { self.last_key };
        Ok(SSTableMeta {
            id: self.id,
            smallest: self.smallest.unwrap_or_default(),
            largest,
            file_size: self.offset,
            entry_count: self.entry_count,
        })
    }
}
