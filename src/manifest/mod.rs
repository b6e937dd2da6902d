//! Manifest (descriptor) files.
//!
//! A manifest is a log of `VersionEdit` records framed exactly like WAL
//! records. `CURRENT` names the manifest that is authoritative. Repair
//! always writes a manifest holding a single edit.

pub mod edit;

use std::fs;
use std::path::Path;

use tracing::warn;

pub use edit::{FileMetaData, VersionEdit};

use crate::error::{Error, Result};
use crate::filename::{FileType, current_file_name, parse_file_name};
use crate::wal::WALReader;

/// Decode every edit in the manifest CURRENT points at.
///
/// Damaged records are logged and skipped, like any other log.
pub fn read_current(dir: &Path) -> Result<Vec<VersionEdit>> {
    let pointer = fs::read_to_string(current_file_name(dir))?;
    let name = pointer
        .strip_suffix('\n')
        .ok_or_else(|| Error::Corruption("CURRENT file does not end with newline".into()))?;
    if !matches!(parse_file_name(name), Some((_, FileType::Descriptor))) {
        return Err(Error::Corruption(format!("CURRENT names {name:?}, not a manifest")));
    }

    let reader = WALReader::new(&dir.join(name), true)?;
    let edits: Result<Vec<VersionEdit>> = reader
        .records(|dropped, reason| {
            warn!(manifest = name, dropped_bytes = dropped, error = %reason, "dropping manifest bytes");
        })
        .map(VersionEdit::decode)
        .collect();
    edits
}
