use std::io;
use std::path::PathBuf;

/// Unified error type for the repair engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error from disk operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Data corruption detected (CRC mismatch, bad format, etc).
    #[error("Corruption: {0}")]
    Corruption(String),
    /// A replayed batch does not advance past the sequence watermark.
    #[error("Duplicate sequence: batch {first}..={last} is not newer than {watermark}")]
    DuplicateSequence {
        first: u64,
        last: u64,
        watermark: u64,
    },
    /// The database directory holds nothing repair can work from.
    #[error("IO error: {}: repair found no files", .0.display())]
    NoFiles(PathBuf),
    /// Options that cannot describe a database.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Whether this error is scoped to a single unit (record, batch, file).
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }

    /// Restate a borrowed error as an owned `Corruption`.
    pub(crate) fn to_corruption(&self) -> Error {
        match self {
            Error::Corruption(msg) => Error::Corruption(msg.clone()),
            other => Error::Corruption(other.to_string()),
        }
    }
}

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Read a little-endian `u32` at `offset`, or report what was being read.
pub(crate) fn read_u32(data: &[u8], offset: usize, what: &str) -> Result<u32> {
    data.get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| Error::Corruption(format!("{what} truncated")))
}

/// Read a little-endian `u64` at `offset`, or report what was being read.
pub(crate) fn read_u64(data: &[u8], offset: usize, what: &str) -> Result<u64> {
    data.get(offset..offset + 8)
        .and_then(|b| b.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| Error::Corruption(format!("{what} truncated")))
}
