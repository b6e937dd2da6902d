pub mod block;
pub mod builder;
pub mod footer;
pub mod iterator;
pub mod reader;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::cache::TableCache;
use crate::error::Result;
use crate::filename::table_file_name;
use crate::iterator::StorageIterator;
use crate::manifest::FileMetaData;
use crate::options::Options;
use crate::sstable::builder::SSTableBuilder;
use crate::types::{INTERNAL_KEY_TRAILER, InternalKey};

/// User-key part of an encoded internal key.
pub fn user_key(internal_key: &[u8]) -> &[u8] {
    &internal_key[..internal_key.len().saturating_sub(INTERNAL_KEY_TRAILER)]
}

/// Write every entry of `iter` into table file `number` under `dir`.
///
/// Returns None (and leaves no file behind) when the iterator is empty.
/// The finished table is opened once through `cache` to prove it is
/// readable; on any failure the partial file is removed.
pub fn build_table(
    dir: &Path,
    number: u64,
    iter: &mut dyn StorageIterator,
    options: &Options,
    cache: &mut TableCache,
) -> Result<Option<FileMetaData>> {
    iter.seek_to_first()?;
    if !iter.is_valid() {
        return Ok(None);
    }

    let path = table_file_name(dir, number);
    let built = (|| -> Result<FileMetaData> {
        let mut builder =
            SSTableBuilder::new(&path, number, options.block_size, options.bloom_false_positive_rate)?;
        while iter.is_valid() {
            builder.add(iter.key(), iter.value())?;
            iter.next()?;
        }
        if let Some(e) = iter.status() {
            return Err(e.to_corruption());
        }
        let meta = builder.finish()?;
        cache.find_table(number, meta.file_size)?;
        debug!(table = number, entries = meta.entry_count, bytes = meta.file_size, "built table");

        Ok(FileMetaData {
            number,
            file_size: meta.file_size,
            smallest: InternalKey::decode(&meta.smallest)?,
            largest: InternalKey::decode(&meta.largest)?,
        })
    })();

    if built.is_err() {
        cache.evict(number);
        let _ = fs::remove_file(&path);
    }
    built.map(Some)
}
