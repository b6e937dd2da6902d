use crate::error::{Error, Result, read_u32, read_u64};

/// Last eight bytes of every table ("LSM_SST\0").
pub const SSTABLE_MAGIC: u64 = 0x4C534D5F53535400;

/// What the builder learned while writing a table.
#[derive(Debug, Clone)]
pub struct SSTableMeta {
    pub id: u64,
    /// Encoded internal keys; empty when nothing was added.
    pub smallest: Vec<u8>,
    pub largest: Vec<u8>,
    pub file_size: u64,
    /// Tombstones included.
    pub entry_count: u64,
}

/// Where a block lives in the file. `size` excludes the CRC trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHandle {
    pub offset: u64,
    pub size: u64,
}

impl BlockHandle {
    pub const ENCODED_LEN: usize = 16;

    pub fn new(offset: u64, size: u64) -> Self {
        BlockHandle { offset, size }
    }

    /// Offset of the byte after this block's trailer.
    pub fn end(&self, trailer: usize) -> Option<u64> {
        self.offset.checked_add(self.size)?.checked_add(trailer as u64)
    }

    fn encode_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.offset.to_le_bytes());
        buf.extend_from_slice(&self.size.to_le_bytes());
    }

    fn decode_at(data: &[u8], at: usize, what: &str) -> Result<Self> {
        Ok(BlockHandle {
            offset: read_u64(data, at, what)?,
            size: read_u64(data, at + 8, what)?,
        })
    }
}

/// One index record per data block: the block's last key and its handle.
///
/// Encoded as `key_len u32 | key | handle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub last_key: Vec<u8>,
    pub handle: BlockHandle,
}

impl IndexEntry {
    pub fn encode_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.last_key.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.last_key);
        self.handle.encode_to(buf);
    }

    /// Decode every entry of an index block.
    pub fn decode_all(mut data: &[u8]) -> Result<Vec<Self>> {
        let mut entries = Vec::new();
        while !data.is_empty() {
            let key_len = read_u32(data, 0, "index key length")? as usize;
            let key_end = 4 + key_len;
            let last_key = data
                .get(4..key_end)
                .ok_or_else(|| Error::Corruption("index entry truncated".into()))?
                .to_vec();
            let handle = BlockHandle::decode_at(data, key_end, "index block handle")?;
            entries.push(IndexEntry { last_key, handle });
            data = &data[key_end + BlockHandle::ENCODED_LEN..];
        }
        Ok(entries)
    }
}

/// Fixed-size tail of a table:
///
/// ```text
/// | index handle (16B) | filter handle (16B) | magic (8B) |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub index: BlockHandle,
    pub filter: BlockHandle,
}

impl Footer {
    pub const SIZE: usize = 2 * BlockHandle::ENCODED_LEN + 8;

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        self.index.encode_to(&mut buf);
        self.filter.encode_to(&mut buf);
        buf.extend_from_slice(&SSTABLE_MAGIC.to_le_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != Self::SIZE {
            return Err(Error::Corruption(format!("footer is {} bytes", data.len())));
        }
        let magic = read_u64(data, 2 * BlockHandle::ENCODED_LEN, "footer magic")?;
        if magic != SSTABLE_MAGIC {
            return Err(Error::Corruption(format!("not a table (magic {magic:#x})")));
        }
        Ok(Footer {
            index: BlockHandle::decode_at(data, 0, "footer index handle")?,
            filter: BlockHandle::decode_at(data, BlockHandle::ENCODED_LEN, "footer filter handle")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_layout() {
        let footer = Footer {
            index: BlockHandle::new(4096, 512),
            filter: BlockHandle::new(4000, 96),
        };
        let encoded = footer.encode();
        assert_eq!(encoded.len(), Footer::SIZE);
        assert_eq!(&encoded[32..], &SSTABLE_MAGIC.to_le_bytes());
        assert_eq!(Footer::decode(&encoded).unwrap(), footer);
    }

    #[test]
    fn footer_rejects_foreign_file() {
        let mut encoded = Footer {
            index: BlockHandle::default(),
            filter: BlockHandle::default(),
        }
        .encode();
        encoded[39] ^= 0xff;
        assert!(Footer::decode(&encoded).is_err());
        assert!(Footer::decode(&encoded[1..]).is_err());
    }

    #[test]
    fn index_block_decodes_every_entry() {
        let entries = vec![
            IndexEntry { last_key: b"apple".to_vec(), handle: BlockHandle::new(0, 100) },
            IndexEntry { last_key: b"zebra".to_vec(), handle: BlockHandle::new(104, 42) },
        ];
        let mut block = Vec::new();
        for e in &entries {
            e.encode_to(&mut block);
        }
        assert_eq!(IndexEntry::decode_all(&block).unwrap(), entries);
        assert!(IndexEntry::decode_all(&block[..block.len() - 1]).is_err());
    }

    #[test]
    fn handle_end_overflow() {
        assert_eq!(BlockHandle::new(10, 5).end(4), Some(19));
        assert_eq!(BlockHandle::new(u64::MAX, 1).end(4), None);
    }
}
