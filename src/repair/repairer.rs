use std::mem;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::batch::WriteBatch;
use crate::cache::TableCache;
use crate::error::{Error, Result};
use crate::filename::{log_file_name, table_file_name};
use crate::locality::GroupId;
use crate::memtable::MemTable;
use crate::options::Options;
use crate::repair::convert::replay_log;
use crate::repair::descriptor::{install_descriptor, repair_edit};
use crate::repair::files::discover;
use crate::repair::scan::{TableInfo, scan_table};
use crate::repair::{FileNumberAllocator, GroupReport, RepairReport, archive_file};
use crate::sstable::build_table;
use crate::types::SequenceNumber;

/// Repairs one directory: one locality group, or a plain database.
///
/// Standalone, [`Repairer::run`] converts the directory's own logs, scans
/// every table and writes the descriptor. Under [`DbRepairer`] the same
/// steps are driven one at a time, with log batches fed in from outside
/// through [`Repairer::insert_batch`].
///
/// [`DbRepairer`]: crate::repair::DbRepairer
pub struct Repairer {
    dir: PathBuf,
    group: GroupId,
    options: Options,
    cache: TableCache,
    allocator: FileNumberAllocator,
    manifests: Vec<String>,
    logs: Vec<u64>,
    /// Tables waiting to be scanned.
    table_numbers: Vec<u64>,
    tables: Vec<TableInfo>,
    mem: Option<MemTable>,
    max_sequence: SequenceNumber,
}

impl Repairer {
    pub fn new(dir: impl AsRef<Path>, options: Options) -> Self {
        Self::for_group(dir, 0, options)
    }

    pub fn for_group(dir: impl AsRef<Path>, group: GroupId, options: Options) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let cache = TableCache::new(&dir, options.table_cache_capacity);
        Repairer {
            dir,
            group,
            options,
            cache,
            allocator: FileNumberAllocator::new(),
            manifests: Vec::new(),
            logs: Vec::new(),
            table_numbers: Vec::new(),
            tables: Vec::new(),
            mem: None,
            max_sequence: 0,
        }
    }

    /// Repair this directory on its own, logs included.
    pub fn run(&mut self) -> Result<RepairReport> {
        self.options.validate()?;
        self.find_files()?;
        self.convert_log_files_to_tables();
        self.extract_metadata();
        self.write_descriptor()?;

        let report = self.report();
        info!(
            "**** Repaired {}; recovered {} files; {} bytes. Some data may have been lost. ****",
            self.dir.display(),
            report.tables,
            report.bytes
        );
        Ok(RepairReport { groups: vec![report] })
    }

    /// Classify the directory and seed the file number allocator.
    pub fn find_files(&mut self) -> Result<()> {
        let found = discover(&self.dir)?;
        self.manifests = found.manifests;
        self.logs = found.logs;
        self.table_numbers = found.tables;
        self.allocator = found.allocator;
        Ok(())
    }

    /// Scan every table not yet scanned; bad ones are archived.
    pub fn extract_metadata(&mut self) {
        for number in mem::take(&mut self.table_numbers) {
            // failures are logged and archived by add_table_meta
            let _ = self.add_table_meta(number);
        }
    }

    /// Apply one batch, already routed to this group, to the buffer.
    ///
    /// Batches must arrive in increasing sequence order: one starting at or
    /// below [`Repairer::max_sequence`] is refused with `DuplicateSequence`
    /// and nothing is applied. Returns how many mutations were applied; on
    /// a malformed record the ones before it stay.
    pub fn insert_batch(&mut self, batch: &WriteBatch) -> Result<u32> {
        if batch.sequence() <= self.max_sequence {
            return Err(Error::DuplicateSequence {
                first: batch.sequence(),
                last: batch.last_sequence(),
                watermark: self.max_sequence,
            });
        }
        batch.check_sequence_range()?;
        self.max_sequence = self.max_sequence.max(batch.last_sequence());
        batch.insert_into(self.mem.get_or_insert_with(MemTable::new))
    }

    pub fn has_buffer(&self) -> bool {
        self.mem.is_some()
    }

    /// Write the buffer out as a new table and release it.
    ///
    /// A number is allocated only when there is something to write. The
    /// table is not registered; pass the number to `add_table_meta`.
    pub fn build_table_from_buffer(&mut self, log: u64) -> Result<Option<u64>> {
        let Some(mem) = self.mem.take() else {
            return Ok(None);
        };
        if mem.is_empty() {
            return Ok(None);
        }
        let number = self.allocator.allocate();
        let built = build_table(&self.dir, number, &mut mem.iter(), &self.options, &mut self.cache);
        match &built {
            Ok(_) => info!(
                lg = self.group,
                log,
                table = number,
                entries = mem.len(),
                buffered_bytes = mem.approximate_memory_usage(),
                "saved log to table"
            ),
            Err(e) => warn!(lg = self.group, log, table = number, error = %e, "building table failed"),
        }
        Ok(built?.map(|meta| meta.number))
    }

    /// Scan table `number` and keep it, or archive it if the scan fails.
    pub fn add_table_meta(&mut self, number: u64) -> Result<()> {
        match scan_table(&self.dir, number, &mut self.cache) {
            Ok(info) => {
                self.max_sequence = self.max_sequence.max(info.max_sequence);
                self.tables.push(info);
                Ok(())
            }
            Err(e) => {
                warn!(lg = self.group, table = number, error = %e, "ignoring table");
                self.cache.evict(number);
                archive_file(&table_file_name(&self.dir, number));
                Err(e)
            }
        }
    }

    /// Install a descriptor listing every kept table.
    pub fn write_descriptor(&mut self) -> Result<()> {
        let edit = repair_edit(
            &self.options.comparator_name,
            self.allocator.next_file_number(),
            &self.tables,
        );
        install_descriptor(&self.dir, &edit, &self.manifests)?;
        self.manifests.clear();
        Ok(())
    }

    pub fn report(&self) -> GroupReport {
        GroupReport {
            group: self.group,
            tables: self.tables.len(),
            bytes: self.tables.iter().map(|t| t.meta.file_size).sum(),
            next_file_number: self.allocator.next_file_number(),
            last_sequence: self.tables.iter().map(|t| t.max_sequence).max().unwrap_or(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Tables that passed their scan, in the order they were kept.
    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    pub fn logs(&self) -> &[u64] {
        &self.logs
    }

    pub fn next_file_number(&self) -> u64 {
        self.allocator.next_file_number()
    }

    /// Largest sequence seen in kept tables or inserted batches.
    pub fn max_sequence(&self) -> SequenceNumber {
        self.max_sequence
    }

    fn convert_log_files_to_tables(&mut self) {
        for log in self.logs.clone() {
            if let Err(e) = self.convert_log_to_table(log) {
                warn!(log, error = %e, "ignoring conversion error");
            }
            archive_file(&log_file_name(&self.dir, log));
        }
    }

    fn convert_log_to_table(&mut self, log: u64) -> Result<()> {
        let mut mem = MemTable::new();
        let mut ops = 0u64;
        replay_log(
            &log_file_name(&self.dir, log),
            log,
            self.options.verify_checksums,
            |batch| match batch.insert_into(&mut mem) {
                Ok(n) => ops += u64::from(n),
                Err(e) => warn!(log, error = %e, "ignoring batch"),
            },
        )?;
        info!(log, ops, "replayed log");

        self.mem = Some(mem);
        if let Some(number) = self.build_table_from_buffer(log)? {
            self.table_numbers.push(number);
        }
        Ok(())
    }
}
