use crate::error::{Error, Result, read_u32};

/// Framing of a single record in the WAL.
///
/// On-disk format:
/// ```text
/// ┌──────────┬──────────┬─────────────────┐
/// │ CRC (4B) │ Len (4B) │ Payload (Len B) │
/// └──────────┴──────────┴─────────────────┘
/// ```
///
/// CRC covers everything after the CRC field itself. The payload is opaque
/// here: a serialized write batch in log files, a version edit in manifests.

pub const CRC_SIZE: usize = 4;
pub const LEN_SIZE: usize = 4;
pub const HEADER_SIZE: usize = CRC_SIZE + LEN_SIZE;

/// Serialize a payload into a framed record.
pub fn encode_record(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());

    // Reserve space for CRC (we'll fill it at the end)
    buf.extend_from_slice(&[0u8; CRC_SIZE]);
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);

    let crc = crc32fast::hash(&buf[CRC_SIZE..]);
    buf[0..CRC_SIZE].copy_from_slice(&crc.to_le_bytes());
    buf
}

/// Header of a framed record at the start of `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub crc: u32,
    pub payload_len: usize,
}

impl RecordHeader {
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Corruption("truncated record header".into()));
        }
        Ok(RecordHeader {
            crc: read_u32(data, 0, "record crc")?,
            payload_len: read_u32(data, CRC_SIZE, "record length")? as usize,
        })
    }

    pub fn record_len(&self) -> usize {
        HEADER_SIZE + self.payload_len
    }

    /// Check the stored CRC against `record` (header included).
    pub fn verify(&self, record: &[u8]) -> Result<()> {
        let computed = crc32fast::hash(&record[CRC_SIZE..self.record_len()]);
        if computed != self.crc {
            return Err(Error::Corruption("checksum mismatch".into()));
        }
        Ok(())
    }
}
