//! On-disk naming scheme.
//!
//! Every engine-owned file embeds a file number and a type tag:
//!
//! ```text
//! 000007.log        write-ahead log
//! 000012.sst        sorted table (000012.ldb accepted when parsing)
//! MANIFEST-000001   descriptor
//! CURRENT           names the authoritative descriptor
//! 000001.dbtmp      temporary file
//! LOCK, LOG, LOG.old
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Log,
    Table,
    Descriptor,
    Current,
    Temp,
    Lock,
    InfoLog,
}

pub const CURRENT: &str = "CURRENT";
pub const LOST_DIR: &str = "lost";

pub fn log_file_name(dir: &Path, number: u64) -> PathBuf {
    dir.join(format!("{number:06}.log"))
}

pub fn table_file_name(dir: &Path, number: u64) -> PathBuf {
    dir.join(format!("{number:06}.sst"))
}

pub fn descriptor_file_name(dir: &Path, number: u64) -> PathBuf {
    dir.join(format!("MANIFEST-{number:06}"))
}

pub fn temp_file_name(dir: &Path, number: u64) -> PathBuf {
    dir.join(format!("{number:06}.dbtmp"))
}

pub fn current_file_name(dir: &Path) -> PathBuf {
    dir.join(CURRENT)
}

/// Parse a bare file name into `(number, type)`.
/// Returns None for anything the engine does not own.
pub fn parse_file_name(name: &str) -> Option<(u64, FileType)> {
    match name {
        CURRENT => return Some((0, FileType::Current)),
        "LOCK" => return Some((0, FileType::Lock)),
        "LOG" | "LOG.old" => return Some((0, FileType::InfoLog)),
        _ => {}
    }

    if let Some(rest) = name.strip_prefix("MANIFEST-") {
        return parse_number(rest).map(|n| (n, FileType::Descriptor));
    }

    let (stem, ext) = name.split_once('.')?;
    let number = parse_number(stem)?;
    let file_type = match ext {
        "log" => FileType::Log,
        "sst" | "ldb" => FileType::Table,
        "dbtmp" => FileType::Temp,
        _ => return None,
    };
    Some((number, file_type))
}

fn parse_number(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Point CURRENT at `MANIFEST-<number>`.
///
/// Written to a temp file first and renamed over CURRENT, so readers see
/// either the old pointer or the new one.
pub fn set_current_file(dir: &Path, descriptor_number: u64) -> Result<()> {
    let manifest = format!("MANIFEST-{descriptor_number:06}\n");
    let tmp = temp_file_name(dir, descriptor_number);

    let written = (|| -> Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(manifest.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, current_file_name(dir))?;
        Ok(())
    })();

    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}
