//! Rebuilds manifests from whatever logs and tables survive on disk.
//!
//! ```text
//! <db>/000007.log            shared WAL (all groups interleaved)
//! <db>/<lg>/000012.sst       tables of locality group <lg>
//! <db>/<lg>/MANIFEST-000001  written by repair, CURRENT points at it
//! <dir>/lost/                anything repair rejected or superseded
//! ```
//!
//! Two drivers share the per-directory work in [`Repairer`]:
//! - `Repairer::new(dir, ..).run()` repairs a plain directory whose logs sit
//!   next to its tables: convert logs, scan tables, write the descriptor.
//! - [`repair_db`] repairs a root with one subdirectory per locality group:
//!   scan every group's tables, replay the root logs once while routing each
//!   mutation to its group, then write one descriptor per group.
//!
//! Nothing is ever deleted. Bad logs, bad tables and old manifests are moved
//! under `lost/`.

mod archive;
mod convert;
mod db;
mod descriptor;
mod files;
mod repairer;
mod scan;

use std::path::Path;

pub use archive::archive_file;
pub use db::DbRepairer;
pub use descriptor::{install_descriptor, repair_edit};
pub use files::{DiscoveredFiles, discover, list_dir};
pub use repairer::Repairer;
pub use scan::{TableInfo, scan_table};

use crate::error::Result;
use crate::locality::GroupId;
use crate::options::Options;
use crate::types::SequenceNumber;

/// Hands out file numbers for one directory.
///
/// Seeded past every number found on disk, so anything it returns is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileNumberAllocator {
    next: u64,
}

impl Default for FileNumberAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl FileNumberAllocator {
    pub fn new() -> Self {
        FileNumberAllocator { next: 1 }
    }

    /// Make sure `number` is never handed out.
    pub fn mark_used(&mut self, number: u64) {
        self.next = self.next.max(number.saturating_add(1));
    }

    pub fn allocate(&mut self) -> u64 {
        let number = self.next;
        self.next += 1;
        number
    }

    /// Value recorded as `next_file_number` in the descriptor.
    pub fn next_file_number(&self) -> u64 {
        self.next
    }
}

/// What repair left behind in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub group: GroupId,
    /// Tables listed in the new descriptor.
    pub tables: usize,
    pub bytes: u64,
    pub next_file_number: u64,
    pub last_sequence: SequenceNumber,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub groups: Vec<GroupReport>,
}

impl RepairReport {
    pub fn tables(&self) -> usize {
        self.groups.iter().map(|g| g.tables).sum()
    }

    pub fn bytes(&self) -> u64 {
        self.groups.iter().map(|g| g.bytes).sum()
    }

    pub fn group(&self, id: GroupId) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.group == id)
    }
}

/// Repair the database rooted at `path`, one descriptor per locality group.
///
/// Fails immediately if the root holds nothing to repair. Otherwise every
/// group is attempted; if some descriptors could not be written the last
/// such error is returned.
pub fn repair_db(path: impl AsRef<Path>, options: Options) -> Result<RepairReport> {
    DbRepairer::new(path.as_ref(), options)?.run()
}
