use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::locality::{DefaultGroupRouter, GroupId, LocalityGroupRouter};

pub const DEFAULT_COMPARATOR: &str = "leveldb.BytewiseComparator";

/// Repair configuration.
///
/// Defaults match a freshly created single-group database.
#[derive(Clone)]
pub struct Options {
    /// Recorded in every manifest written by repair.
    pub comparator_name: String,
    /// Target data block size for tables built from logs.
    pub block_size: usize,
    pub bloom_false_positive_rate: f64,
    /// Verify WAL record checksums while replaying.
    pub verify_checksums: bool,
    /// Number of open table handles kept per directory.
    pub table_cache_capacity: usize,
    /// Groups to repair; each lives in `<db>/<id>`.
    pub locality_groups: BTreeSet<GroupId>,
    pub router: Arc<dyn LocalityGroupRouter>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            comparator_name: DEFAULT_COMPARATOR.to_string(),
            block_size: 4096,
            bloom_false_positive_rate: 0.01,
            verify_checksums: true,
            table_cache_capacity: 100,
            locality_groups: BTreeSet::from([0]),
            router: Arc::new(DefaultGroupRouter(0)),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("comparator_name", &self.comparator_name)
            .field("block_size", &self.block_size)
            .field("bloom_false_positive_rate", &self.bloom_false_positive_rate)
            .field("verify_checksums", &self.verify_checksums)
            .field("table_cache_capacity", &self.table_cache_capacity)
            .field("locality_groups", &self.locality_groups)
            .finish_non_exhaustive()
    }
}

impl Options {
    /// Repair these groups. Unless a router is set afterwards, every key
    /// goes to the lowest id.
    pub fn with_locality_groups(mut self, groups: impl IntoIterator<Item = GroupId>) -> Self {
        self.locality_groups = groups.into_iter().collect();
        if let Some(first) = self.locality_groups.first() {
            self.router = Arc::new(DefaultGroupRouter(*first));
        }
        self
    }

    pub fn with_router(mut self, router: impl LocalityGroupRouter + 'static) -> Self {
        self.router = Arc::new(router);
        self
    }

    pub fn with_comparator_name(mut self, name: impl Into<String>) -> Self {
        self.comparator_name = name.into();
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    pub fn with_table_cache_capacity(mut self, capacity: usize) -> Self {
        self.table_cache_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.locality_groups.is_empty() {
            return Err(Error::InvalidArgument("no locality groups configured".into()));
        }
        if self.block_size == 0 {
            return Err(Error::InvalidArgument("block_size must be > 0".into()));
        }
        let fpr = self.bloom_false_positive_rate;
        if !(fpr > 0.0 && fpr < 1.0) {
            return Err(Error::InvalidArgument(format!(
                "bloom_false_positive_rate must be in (0, 1), got {fpr}"
            )));
        }
        Ok(())
    }
}
