/// Serializes sorted entries into one block.
///
/// ```text
/// | key_len u32 | val_len u32 | key | value |   x N
/// | offset u32 |                               x N
/// | N u32 |
/// ```
///
/// The table builder decides when a block is full and seals it with a CRC
/// trailer (see `seal_block`).
#[derive(Default)]
pub struct BlockBuilder {
    buf: Vec<u8>,
    offsets: Vec<u32>,
}

pub(crate) const ENTRY_HEADER_SIZE: usize = 8;

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries must arrive in internal key order.
    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        self.offsets.push(self.buf.len() as u32);
        self.buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(key);
        self.buf.extend_from_slice(value);
    }

    /// Bytes `finish` would return right now.
    pub fn size_estimate(&self) -> usize {
        self.buf.len() + 4 * (self.offsets.len() + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Emit the block and reset the builder for the next one.
    pub fn finish(&mut self) -> Vec<u8> {
        let count = self.offsets.len() as u32;
        let mut block = std::mem::take(&mut self.buf);
        block.reserve(4 * (self.offsets.len() + 1));
        for offset in self.offsets.drain(..) {
            block.extend_from_slice(&offset.to_le_bytes());
        }
        block.extend_from_slice(&count.to_le_bytes());
        block
    }
}
