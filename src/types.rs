use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result, read_u64};

/// Raw key bytes.
pub type Key = Vec<u8>;

/// Raw value bytes.
pub type Value = Vec<u8>;

/// Commit order of a mutation.
pub type SequenceNumber = u64;

/// Sequence numbers share a 64-bit word with the value type, leaving 56 bits.
pub const MAX_SEQUENCE_NUMBER: SequenceNumber = (1 << 56) - 1;

/// Size of the `(sequence << 8) | type` trailer on an encoded internal key.
pub const INTERNAL_KEY_TRAILER: usize = 8;

/// Distinguishes puts from deletes in the storage engine.
/// A Delete writes a tombstone — the key isn't removed, it's marked as deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueType {
    /// A normal put operation.
    Put = 0x01,
    /// A delete (tombstone marker).
    Delete = 0x02,
}

impl ValueType {
    pub fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(ValueType::Put),
            0x02 => Ok(ValueType::Delete),
            _ => Err(Error::Corruption(format!("invalid value type: {byte}"))),
        }
    }
}

/// Internal key format: user key + sequence number + value type.
///
/// Ordering: (user_key ASC, sequence DESC, type DESC).
/// This ensures the newest version of a key always comes first during merging.
///
/// On disk the key is `user_key ++ fixed64_le((sequence << 8) | type)`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InternalKey {
    pub user_key: Key,
    pub sequence: SequenceNumber,
    pub value_type: ValueType,
}

impl InternalKey {
    pub fn new(user_key: impl Into<Key>, sequence: SequenceNumber, value_type: ValueType) -> Self {
        InternalKey {
            user_key: user_key.into(),
            sequence,
            value_type,
        }
    }

    /// Serialize to the on-disk form stored in tables.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.user_key.len() + INTERNAL_KEY_TRAILER);
        buf.extend_from_slice(&self.user_key);
        let packed = (self.sequence << 8) | self.value_type as u64;
        buf.extend_from_slice(&packed.to_le_bytes());
        buf
    }

    /// Parse an encoded internal key. Every table entry must survive this,
    /// otherwise the entry is unusable.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < INTERNAL_KEY_TRAILER {
            return Err(Error::Corruption(format!(
                "internal key too short: {} bytes",
                data.len()
            )));
        }
        let split = data.len() - INTERNAL_KEY_TRAILER;
        let packed = read_u64(data, split, "internal key trailer")?;
        let value_type = ValueType::from_u8((packed & 0xff) as u8)?;
        Ok(InternalKey {
            user_key: data[..split].to_vec(),
            sequence: packed >> 8,
            value_type,
        })
    }
}

impl Ord for InternalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.user_key
            .cmp(&other.user_key)
            .then_with(|| other.sequence.cmp(&self.sequence))
            .then_with(|| other.value_type.cmp(&self.value_type))
    }
}

impl PartialOrd for InternalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for InternalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' @ {} : {:?}",
            escape_bytes(&self.user_key),
            self.sequence,
            self.value_type
        )
    }
}

/// Printable rendering of arbitrary key bytes for log lines.
pub fn escape_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .flat_map(|b| std::ascii::escape_default(*b))
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_sequence_sorts_first() {
        let old = InternalKey::new(b"k".to_vec(), 1, ValueType::Put);
        let new = InternalKey::new(b"k".to_vec(), 9, ValueType::Put);
        let other = InternalKey::new(b"a".to_vec(), 1, ValueType::Put);
        assert!(new < old);
        assert!(other < new);
    }

    #[test]
    fn user_key_prefix_sorts_before_longer_key() {
        let short = InternalKey::new(b"a".to_vec(), 1, ValueType::Put);
        let long = InternalKey::new(b"ab".to_vec(), 100, ValueType::Put);
        assert!(short < long);
    }

    #[test]
    fn encode_decode() {
        let key = InternalKey::new(b"user".to_vec(), 42, ValueType::Delete);
        let encoded = key.encode();
        assert_eq!(encoded.len(), 4 + INTERNAL_KEY_TRAILER);
        assert_eq!(InternalKey::decode(&encoded).unwrap(), key);
    }

    #[test]
    fn decode_rejects_short_and_bad_tag() {
        assert!(InternalKey::decode(b"short").is_err());

        let mut encoded = InternalKey::new(b"k".to_vec(), 3, ValueType::Put).encode();
        encoded[1] = 0x7f;
        assert!(InternalKey::decode(&encoded).is_err());
    }

    #[test]
    fn escape_non_printable() {
        assert_eq!(escape_bytes(b"a\x00b"), "a\\x00b");
    }
}
