use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::cache::TableCache;
use crate::error::{Error, Result};
use crate::filename::table_file_name;
use crate::iterator::StorageIterator;
use crate::manifest::FileMetaData;
use crate::types::{InternalKey, SequenceNumber, escape_bytes};

/// A table that passed the scan, with what the descriptor needs from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub meta: FileMetaData,
    pub max_sequence: SequenceNumber,
}

/// Read every entry of table `number` to recover its key range and
/// largest sequence number.
///
/// Keys that do not decode are logged and skipped. The table is rejected
/// with `Corruption` if any block was unreadable or nothing decoded.
pub fn scan_table(dir: &Path, number: u64, cache: &mut TableCache) -> Result<TableInfo> {
    let file_size = fs::metadata(table_file_name(dir, number))?.len();
    let mut iter = cache.new_iterator(number, file_size)?;
    iter.seek_to_first()?;

    let mut bounds: Option<(InternalKey, InternalKey)> = None;
    let mut max_sequence: SequenceNumber = 0;
    let mut entries = 0usize;
    while iter.is_valid() {
        match InternalKey::decode(iter.key()) {
            Ok(key) => {
                entries += 1;
                max_sequence = max_sequence.max(key.sequence);
                bounds = Some(match bounds.take() {
                    Some((smallest, _)) => (smallest, key),
                    None => (key.clone(), key),
                });
            }
            Err(_) => {
                warn!(table = number, key = %escape_bytes(iter.key()), "unparsable key");
            }
        }
        iter.next()?;
    }

    let scanned = match (iter.status(), bounds) {
        (Some(e), _) => Err(e.to_corruption()),
        (None, None) => Err(Error::Corruption("sst is empty".into())),
        (None, Some((smallest, largest))) => Ok(TableInfo {
            meta: FileMetaData {
                number,
                file_size,
                smallest,
                largest,
            },
            max_sequence,
        }),
    };
    match &scanned {
        Ok(_) => info!(table = number, entries, "scanned table"),
        Err(e) => info!(table = number, entries, error = %e, "scanned table"),
    }
    scanned
}
