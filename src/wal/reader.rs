use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::wal::record::{HEADER_SIZE, RecordHeader};

/// Reads WAL records from a file for recovery.
///
/// Loads the entire file into memory, then iterates record by record.
/// Damage never ends the read early. When the record at the current offset
/// fails its checksum, or its header or body runs past end of file, the
/// reader scans forward to the next offset that frames a record with a
/// valid checksum and resumes there. A damaged length field therefore
/// costs the bytes up to the next intact record, not the rest of the log.
///
/// Every drop is reported to the caller's corruption callback as
/// `(dropped_bytes, reason)`. With checksums off a record is accepted as
/// soon as its length fits the file; resyncing still requires a valid
/// checksum.
pub struct WALReader {
    data: Vec<u8>,
    verify_checksums: bool,
}

impl WALReader {
    /// Open a WAL file for reading.
    pub fn new(path: &Path, verify_checksums: bool) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(WALReader {
            data,
            verify_checksums,
        })
    }

    /// Total bytes in the file.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate record payloads, reporting skipped bytes to `on_corruption`.
    pub fn records<F>(&self, on_corruption: F) -> WALIterator<'_, F>
    where
        F: FnMut(usize, &Error),
    {
        WALIterator {
            data: &self.data,
            offset: 0,
            verify_checksums: self.verify_checksums,
            on_corruption,
        }
    }
}

/// Iterator over WAL record payloads.
pub struct WALIterator<'a, F> {
    data: &'a [u8],
    offset: usize,
    verify_checksums: bool,
    on_corruption: F,
}

/// The record framed at `at`, header included.
fn frame_at(data: &[u8], at: usize, verify: bool) -> Result<&[u8]> {
    let remaining = &data[at..];
    let header = RecordHeader::decode(remaining)?;
    let record = remaining
        .get(..header.record_len())
        .ok_or_else(|| Error::Corruption("record runs past end of log".into()))?;
    if verify {
        header.verify(record)?;
    }
    Ok(record)
}

impl<'a, F> Iterator for WALIterator<'a, F>
where
    F: FnMut(usize, &Error),
{
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let data: &'a [u8] = self.data;
        loop {
            let start = self.offset;
            if start >= data.len() {
                return None;
            }
            let reason = match frame_at(data, start, self.verify_checksums) {
                Ok(record) => {
                    self.offset = start + record.len();
                    return Some(&record[HEADER_SIZE..]);
                }
                Err(e) => e,
            };

            let resume = (start + 1..data.len())
                .find(|&at| frame_at(data, at, true).is_ok())
                .unwrap_or(data.len());
            self.offset = resume;
            (self.on_corruption)(resume - start, &reason);
        }
    }
}
