use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::filename::{descriptor_file_name, set_current_file, temp_file_name};
use crate::manifest::VersionEdit;
use crate::repair::archive_file;
use crate::repair::scan::TableInfo;
use crate::wal::WALWriter;

/// Descriptor number repair always installs.
const REPAIRED_DESCRIPTOR: u64 = 1;

/// The single edit a repaired descriptor holds.
///
/// Every table goes to level 0; `last_sequence` is the largest sequence
/// any of them contains.
pub fn repair_edit(comparator: &str, next_file_number: u64, tables: &[TableInfo]) -> VersionEdit {
    let mut edit = VersionEdit::default();
    edit.set_comparator_name(comparator);
    edit.set_log_number(0);
    edit.set_next_file(next_file_number);
    edit.set_last_sequence(tables.iter().map(|t| t.max_sequence).max().unwrap_or(0));
    for table in tables {
        edit.add_file(0, table.meta.clone());
    }
    edit
}

/// Write `edit` as a fresh descriptor and make it current.
///
/// The edit goes to a temp file first. Only once that is durable are the
/// `prior` manifests archived, the temp renamed to `MANIFEST-000001` and
/// CURRENT pointed at it. If writing or renaming fails the temp is removed.
pub fn install_descriptor(dir: &Path, edit: &VersionEdit, prior: &[String]) -> Result<()> {
    let tmp = temp_file_name(dir, REPAIRED_DESCRIPTOR);
    let written = (|| -> Result<()> {
        let mut writer = WALWriter::create(&tmp)?;
        writer.add_record(&edit.encode())?;
        writer.finish().map(drop)
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    for name in prior {
        archive_file(&dir.join(name));
    }

    let manifest = descriptor_file_name(dir, REPAIRED_DESCRIPTOR);
    if let Err(e) = fs::rename(&tmp, &manifest) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    set_current_file(dir, REPAIRED_DESCRIPTOR)?;
    debug!(manifest = %manifest.display(), files = edit.new_files.len(), "installed descriptor");
    Ok(())
}
