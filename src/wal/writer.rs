use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::wal::record::encode_record;

/// Appends framed records to a log file.
///
/// Records reach the OS on every append; they are only made durable by
/// [`WALWriter::sync`] or [`WALWriter::finish`].
pub struct WALWriter {
    writer: BufWriter<File>,
    offset: u64,
}

impl WALWriter {
    /// Open (or create) a log at `path` and append to its end.
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let offset = file.metadata()?.len();
        Ok(Self::from_file(file, offset))
    }

    /// Create a log at `path`, truncating whatever was there.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::from_file(File::create(path)?, 0))
    }

    fn from_file(file: File, offset: u64) -> Self {
        WALWriter {
            writer: BufWriter::new(file),
            offset,
        }
    }

    /// Append one record and return the offset it starts at.
    pub fn add_record(&mut self, payload: &[u8]) -> Result<u64> {
        let start = self.offset;
        let framed = encode_record(payload);
        self.writer.write_all(&framed)?;
        self.writer.flush()?;
        self.offset += framed.len() as u64;
        Ok(start)
    }

    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Bytes in the file, including records written before this writer.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Sync and close, returning the final file length.
    pub fn finish(mut self) -> Result<u64> {
        self.sync()?;
        Ok(self.offset)
    }
}
