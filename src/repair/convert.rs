use std::path::Path;

use tracing::warn;

use crate::batch::WriteBatch;
use crate::error::{Error, Result};
use crate::wal::WALReader;

pub(crate) fn report_dropped(log: u64, bytes: usize, reason: &Error) {
    warn!(log, dropped_bytes = bytes, error = %reason, "dropping log bytes");
}

/// Feed every intact batch of log `log` to `apply`, in file order.
///
/// Checksum failures, damaged framing, records too short to hold a batch
/// header and batches whose sequence numbers cannot be encoded are reported
/// and skipped. Returns the number of batches applied.
pub(crate) fn replay_log<F>(path: &Path, log: u64, verify_checksums: bool, mut apply: F) -> Result<usize>
where
    F: FnMut(WriteBatch),
{
    let reader = WALReader::new(path, verify_checksums)?;
    let mut batches = 0;
    for record in reader.records(|bytes, reason| report_dropped(log, bytes, reason)) {
        match WriteBatch::from_contents(record) {
            Ok(batch) => {
                apply(batch);
                batches += 1;
            }
            Err(e) => report_dropped(log, record.len(), &e),
        }
    }
    Ok(batches)
}
