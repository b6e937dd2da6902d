pub mod builder;
pub mod reader;

use crate::error::{Error, Result, read_u32};

/// Every block on disk is followed by a CRC32 of its contents.
pub const BLOCK_TRAILER_SIZE: usize = 4;

/// Append the CRC trailer to a finished block.
pub fn seal_block(mut contents: Vec<u8>) -> Vec<u8> {
    let crc = crc32fast::hash(&contents);
    contents.extend_from_slice(&crc.to_le_bytes());
    contents
}

/// Strip and check the trailer of a block read from disk.
pub fn unseal_block(mut raw: Vec<u8>) -> Result<Vec<u8>> {
    if raw.len() < BLOCK_TRAILER_SIZE {
        return Err(Error::Corruption("block missing trailer".into()));
    }
    let split = raw.len() - BLOCK_TRAILER_SIZE;
    let stored = read_u32(&raw, split, "block trailer")?;
    if crc32fast::hash(&raw[..split]) != stored {
        return Err(Error::Corruption("block checksum mismatch".into()));
    }
    raw.truncate(split);
    Ok(raw)
}
