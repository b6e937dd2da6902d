pub mod builder;

use xxhash_rust::xxh3::xxh3_128;

use crate::error::{Error, Result, read_u32};

/// Per-table filter over user keys: "could this table hold the key?"
///
/// - If any bit is 0 → key is DEFINITELY NOT in the table
/// - If all bits are 1 → key is PROBABLY in the table
///
/// Sizing:
///   bits_per_key = -1.44 * log2(false_positive_rate)
///   num_hashes = bits_per_key * ln(2)
///
/// Double hashing: h_i(key) = h1(key) + i * h2(key) (mod m), with h1, h2
/// the two halves of one 128-bit xxh3 hash.
///
/// Serialized form (the table's meta block):
/// ```text
/// [num_hashes(4B)][num_bits(4B)][bit words, 8B each, little endian]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_hashes: u32,
    num_bits: u32,
}

impl BloomFilter {
    /// Create a filter sized for `expected_items` at the given FPR.
    ///
    /// Callers validate the FPR (see `Options::validate`); zero items still
    /// get the 64-bit minimum.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        let bits_per_key = -1.44 * false_positive_rate.log2();

        let num_bits = ((expected_items.max(1) as f64) * bits_per_key).ceil() as u32;
        let num_bits = num_bits.max(64);

        let num_hashes = (bits_per_key * 2.0f64.ln()).ceil() as u32;
        let num_hashes = num_hashes.clamp(1, 30);

        let num_u64s = (num_bits as usize).div_ceil(64);
        BloomFilter {
            bits: vec![0u64; num_u64s],
            num_hashes,
            num_bits,
        }
    }

    /// Add a key to the filter.
    pub fn insert(&mut self, key: &[u8]) {
        let (h1, h2) = hash_key(key);
        for i in 0..self.num_hashes {
            let pos = self.position(h1, h2, i);
            self.bits[(pos / 64) as usize] |= 1 << (pos % 64);
        }
    }

    /// false → definitely absent. true → probably present.
    pub fn may_contain(&self, key: &[u8]) -> bool {
        let (h1, h2) = hash_key(key);
        (0..self.num_hashes).all(|i| {
            let pos = self.position(h1, h2, i);
            (self.bits[(pos / 64) as usize] >> (pos % 64)) & 1 == 1
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + self.bits.len() * 8);
        buf.extend_from_slice(&self.num_hashes.to_le_bytes());
        buf.extend_from_slice(&self.num_bits.to_le_bytes());
        for word in &self.bits {
            buf.extend_from_slice(&word.to_le_bytes());
        }
        buf
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let num_hashes = read_u32(data, 0, "bloom num_hashes")?;
        let num_bits = read_u32(data, 4, "bloom num_bits")?;
        let words = &data[8..];
        let expected_words = (num_bits as usize).div_ceil(64);
        if num_bits == 0 || num_hashes == 0 || words.len() != expected_words * 8 {
            return Err(Error::Corruption(format!(
                "bad bloom filter: {num_bits} bits in {} bytes",
                words.len()
            )));
        }
        let bits = words
            .chunks_exact(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word.copy_from_slice(chunk);
                u64::from_le_bytes(word)
            })
            .collect();
        Ok(BloomFilter {
            bits,
            num_hashes,
            num_bits,
        })
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    /// h_i = (h1 + i * h2) mod num_bits
    fn position(&self, h1: u64, h2: u64, i: u32) -> u32 {
        let pos = h1.wrapping_add(u64::from(i).wrapping_mul(h2)) % u64::from(self.num_bits);
        pos as u32
    }
}

fn hash_key(key: &[u8]) -> (u64, u64) {
    let hash128 = xxh3_128(key);
    (hash128 as u64, (hash128 >> 64) as u64)
}
