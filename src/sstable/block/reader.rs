use crate::error::{Error, Result, read_u32};
use crate::iterator::StorageIterator;
use crate::sstable::block::builder::ENTRY_HEADER_SIZE;

/// A decoded data or index block.
///
/// `decode` validates the offset array and every entry's bounds up front,
/// so iteration afterwards cannot fail.
pub struct Block {
    data: Vec<u8>,
    /// (key range, value range) into `data`, one per entry.
    entries: Vec<(std::ops::Range<usize>, std::ops::Range<usize>)>,
}

impl Block {
    pub fn decode(data: Vec<u8>) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::Corruption("block too short".into()));
        }
        let count = read_u32(&data, data.len() - 4, "block entry count")? as usize;
        let offsets_start = count
            .checked_mul(4)
            .and_then(|n| (data.len() - 4).checked_sub(n))
            .ok_or_else(|| Error::Corruption(format!("bad block entry count: {count}")))?;

        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let offset = read_u32(&data, offsets_start + i * 4, "block offset")? as usize;
            let key_len = read_u32(&data, offset, "block key length")? as usize;
            let val_len = read_u32(&data, offset + 4, "block value length")? as usize;
            let key_start = offset + ENTRY_HEADER_SIZE;
            let val_start = key_start + key_len;
            let end = val_start + val_len;
            if end > offsets_start {
                return Err(Error::Corruption(format!("block entry {i} overruns data")));
            }
            entries.push((key_start..val_start, val_start..end));
        }
        Ok(Block { data, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, i: usize) -> Option<(&[u8], &[u8])> {
        self.entries
            .get(i)
            .map(|(k, v)| (&self.data[k.clone()], &self.data[v.clone()]))
    }

    pub fn iter(&self) -> BlockIterator<'_> {
        BlockIterator { block: self, pos: 0 }
    }
}

pub struct BlockIterator<'a> {
    block: &'a Block,
    pos: usize,
}

impl StorageIterator for BlockIterator<'_> {
    fn key(&self) -> &[u8] {
        self.block.entry(self.pos).map(|(k, _)| k).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.block.entry(self.pos).map(|(_, v)| v).unwrap_or_default()
    }

    fn is_valid(&self) -> bool {
        self.pos < self.block.len()
    }

    fn next(&mut self) -> Result<()> {
        self.pos += 1;
        Ok(())
    }

    fn seek_to_first(&mut self) -> Result<()> {
        self.pos = 0;
        Ok(())
    }
}
