//! WriteBatch: the unit of a WAL record.
//!
//! ```text
//! ┌───────────────┬─────────────┬──────────────────────────────────────────┐
//! │ sequence (8B) │ count (4B)  │ records...                               │
//! └───────────────┴─────────────┴──────────────────────────────────────────┘
//! record := tag(1B) key_len(4B) key [val_len(4B) value]    (value only for puts)
//! ```
//!
//! Mutations apply to successive sequence numbers starting at the batch's
//! base: `sequence, sequence + 1, ..., sequence + count - 1`.

use tracing::warn;

use crate::error::{Error, Result, read_u32};
use crate::locality::{GroupId, LocalityGroupRouter};
use crate::memtable::MemTable;
use crate::types::{MAX_SEQUENCE_NUMBER, SequenceNumber, ValueType, escape_bytes};

/// Minimum length of a decodable batch: sequence + count.
pub const HEADER_SIZE: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    rep: Vec<u8>,
}

/// One decoded mutation, borrowing from the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOp<'a> {
    Put { key: &'a [u8], value: &'a [u8] },
    Delete { key: &'a [u8] },
}

impl<'a> BatchOp<'a> {
    pub fn key(&self) -> &'a [u8] {
        match self {
            BatchOp::Put { key, .. } | BatchOp::Delete { key } => key,
        }
    }
}

impl Default for WriteBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch {
            rep: vec![0u8; HEADER_SIZE],
        }
    }

    /// Adopt the raw bytes of a WAL record.
    ///
    /// The header must fit a batch and every sequence number it claims must
    /// be encodable in an internal key.
    pub fn from_contents(contents: &[u8]) -> Result<Self> {
        if contents.len() < HEADER_SIZE {
            return Err(Error::Corruption(format!(
                "log record too small: {} bytes",
                contents.len()
            )));
        }
        let batch = WriteBatch {
            rep: contents.to_vec(),
        };
        batch.check_sequence_range()?;
        Ok(batch)
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.set_count(self.count() + 1);
        self.rep.push(ValueType::Put as u8);
        self.push_slice(key);
        self.push_slice(value);
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.set_count(self.count() + 1);
        self.rep.push(ValueType::Delete as u8);
        self.push_slice(key);
    }

    pub fn sequence(&self) -> SequenceNumber {
        u64::from_le_bytes(self.header::<8>(0))
    }

    pub fn set_sequence(&mut self, sequence: SequenceNumber) {
        self.rep[0..8].copy_from_slice(&sequence.to_le_bytes());
    }

    /// Number of mutations the header claims.
    pub fn count(&self) -> u32 {
        u32::from_le_bytes(self.header::<4>(8))
    }

    /// Last sequence number this batch occupies.
    pub fn last_sequence(&self) -> SequenceNumber {
        self.sequence()
            .saturating_add(u64::from(self.count()))
            .saturating_sub(1)
    }

    /// Fails unless `sequence ..= sequence + count - 1` stays within
    /// [`MAX_SEQUENCE_NUMBER`].
    pub fn check_sequence_range(&self) -> Result<()> {
        let last = self
            .sequence()
            .checked_add(u64::from(self.count().saturating_sub(1)));
        match last {
            Some(last) if self.sequence() <= MAX_SEQUENCE_NUMBER && last <= MAX_SEQUENCE_NUMBER => Ok(()),
            _ => Err(Error::Corruption(format!(
                "batch sequence {} with {} mutations exceeds {MAX_SEQUENCE_NUMBER}",
                self.sequence(),
                self.count()
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Raw bytes, as written to the WAL.
    pub fn contents(&self) -> &[u8] {
        &self.rep
    }

    pub fn byte_size(&self) -> usize {
        self.rep.len()
    }

    pub fn iter(&self) -> BatchIter<'_> {
        BatchIter {
            data: &self.rep,
            offset: HEADER_SIZE,
        }
    }

    /// Apply every mutation to `mem`, the i-th at `sequence() + i`.
    ///
    /// Mutations before a malformed record stay applied; the error names
    /// the record that stopped the insert. Returns the number applied.
    pub fn insert_into(&self, mem: &mut MemTable) -> Result<u32> {
        self.check_sequence_range()?;
        let mut sequence = self.sequence();
        let mut applied = 0u32;
        for op in self.iter() {
            let op = op?;
            if sequence > MAX_SEQUENCE_NUMBER {
                return Err(Error::Corruption(format!(
                    "WriteBatch holds more mutations than its header count {}",
                    self.count()
                )));
            }
            match op {
                BatchOp::Put { key, value } => mem.add(sequence, ValueType::Put, key, value),
                BatchOp::Delete { key } => mem.add(sequence, ValueType::Delete, key, &[]),
            }
            sequence += 1;
            applied += 1;
        }
        if applied != self.count() {
            return Err(Error::Corruption(format!(
                "WriteBatch has wrong count: header {} decoded {}",
                self.count(),
                applied
            )));
        }
        Ok(applied)
    }

    /// Split this batch into one sub-batch per group in `groups`.
    ///
    /// Slot `i` holds the mutations routed to `groups[i]`, or None when the
    /// group received nothing. Every sub-batch carries this batch's base
    /// sequence number. Keys routed outside `groups` are logged and dropped.
    /// A malformed record ends the split; what was routed before it is kept.
    pub fn separate_locality_groups(
        &self,
        router: &dyn LocalityGroupRouter,
        groups: &[GroupId],
    ) -> SplitBatch {
        let mut split = SplitBatch {
            batches: vec![None; groups.len()],
            error: None,
        };
        for op in self.iter() {
            let op = match op {
                Ok(op) => op,
                Err(e) => {
                    split.error = Some(e);
                    break;
                }
            };
            let group = router.route(op.key());
            let Some(slot) = groups.iter().position(|g| *g == group) else {
                warn!(
                    lg = group,
                    key = %escape_bytes(op.key()),
                    "mutation routed to unknown locality group, skipping"
                );
                continue;
            };
            let sub = split.batches[slot].get_or_insert_with(|| {
                let mut batch = WriteBatch::new();
                batch.set_sequence(self.sequence());
                batch
            });
            match op {
                BatchOp::Put { key, value } => sub.put(key, value),
                BatchOp::Delete { key } => sub.delete(key),
            }
        }
        split
    }

    fn set_count(&mut self, count: u32) {
        self.rep[8..12].copy_from_slice(&count.to_le_bytes());
    }

    fn push_slice(&mut self, bytes: &[u8]) {
        self.rep.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.rep.extend_from_slice(bytes);
    }

    fn header<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.rep[offset..offset + N]);
        out
    }
}

/// Result of routing a batch across locality groups.
#[derive(Debug)]
pub struct SplitBatch {
    /// One slot per requested group, in the order the groups were given.
    pub batches: Vec<Option<WriteBatch>>,
    /// The malformed record that cut the split short, if any.
    pub error: Option<Error>,
}

/// Decodes records one at a time; stops after the first malformed one.
pub struct BatchIter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BatchIter<'a> {
    fn slice(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = read_u32(self.data, self.offset, what)? as usize;
        let start = self.offset + 4;
        let bytes = self
            .data
            .get(start..start + len)
            .ok_or_else(|| Error::Corruption(format!("bad WriteBatch {what}")))?;
        self.offset = start + len;
        Ok(bytes)
    }

    fn decode_one(&mut self) -> Result<BatchOp<'a>> {
        let tag = self.data[self.offset];
        self.offset += 1;
        match ValueType::from_u8(tag) {
            Ok(ValueType::Put) => {
                let key = self.slice("Put key")?;
                let value = self.slice("Put value")?;
                Ok(BatchOp::Put { key, value })
            }
            Ok(ValueType::Delete) => {
                let key = self.slice("Delete key")?;
                Ok(BatchOp::Delete { key })
            }
            Err(_) => Err(Error::Corruption(format!("unknown WriteBatch tag: {tag}"))),
        }
    }
}

impl<'a> Iterator for BatchIter<'a> {
    type Item = Result<BatchOp<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }
        let op = self.decode_one();
        if op.is_err() {
            self.offset = self.data.len();
        }
        Some(op)
    }
}
