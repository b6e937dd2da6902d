use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::batch::WriteBatch;
use crate::error::{Error, Result};
use crate::filename::log_file_name;
use crate::locality::GroupId;
use crate::options::Options;
use crate::repair::convert::replay_log;
use crate::repair::files::{DiscoveredFiles, list_dir};
use crate::repair::{RepairReport, Repairer, archive_file};
use crate::types::SequenceNumber;

/// Repairs a database whose locality groups share one WAL.
///
/// Each configured group gets a [`Repairer`] over `<root>/<id>`. The root
/// logs are replayed once: every batch is split by the router and each
/// piece goes to its group with the batch's sequence number unchanged.
pub struct DbRepairer {
    root: PathBuf,
    options: Options,
    groups: Vec<(GroupId, Repairer)>,
    logs: Vec<u64>,
    /// Newest sequence already recovered; replayed batches at or below it
    /// are dropped.
    last_sequence: SequenceNumber,
}

impl DbRepairer {
    pub fn new(root: &Path, options: Options) -> Result<Self> {
        options.validate()?;
        fs::create_dir_all(root)?;
        let groups = options
            .locality_groups
            .iter()
            .map(|&id| (id, Repairer::for_group(root.join(id.to_string()), id, options.clone())))
            .collect();
        Ok(DbRepairer {
            root: root.to_path_buf(),
            options,
            groups,
            logs: Vec::new(),
            last_sequence: 0,
        })
    }

    pub fn run(&mut self) -> Result<RepairReport> {
        self.find_files()?;
        self.extract_metadata();
        self.convert_log_files_to_tables();
        let written = self.write_descriptors();

        let report = RepairReport {
            groups: self.groups.iter().map(|(_, r)| r.report()).collect(),
        };
        info!(
            "**** Repaired {}; recovered {} files; {} bytes. Some data may have been lost. ****",
            self.root.display(),
            report.tables(),
            report.bytes()
        );
        written.map(|()| report)
    }

    pub fn group(&self, id: GroupId) -> Option<&Repairer> {
        self.groups.iter().find(|(g, _)| *g == id).map(|(_, r)| r)
    }

    /// Newest sequence recovered from tables or replayed from logs.
    pub fn last_sequence(&self) -> SequenceNumber {
        self.last_sequence
    }

    fn find_files(&mut self) -> Result<()> {
        let found = DiscoveredFiles::classify(&list_dir(&self.root)?);
        let existing_groups = self.groups.iter().filter(|(_, r)| r.dir().is_dir()).count();
        if found.recognized + existing_groups == 0 {
            return Err(Error::NoFiles(self.root.clone()));
        }
        self.logs = found.logs;

        for (id, repairer) in &mut self.groups {
            if let Err(e) = fs::create_dir_all(repairer.dir()) {
                warn!(lg = *id, error = %e, "cannot create group directory");
                continue;
            }
            if let Err(e) = repairer.find_files() {
                warn!(lg = *id, error = %e, "group has no files");
            }
        }
        Ok(())
    }

    fn extract_metadata(&mut self) {
        for (_, repairer) in &mut self.groups {
            repairer.extract_metadata();
            self.last_sequence = self.last_sequence.max(repairer.max_sequence());
        }
    }

    fn convert_log_files_to_tables(&mut self) {
        for log in self.logs.clone() {
            if let Err(e) = self.convert_log_to_table(log) {
                warn!(log, error = %e, "ignoring conversion error");
            }
            archive_file(&log_file_name(&self.root, log));
        }
    }

    fn convert_log_to_table(&mut self, log: u64) -> Result<()> {
        let ids: Vec<GroupId> = self.groups.iter().map(|(id, _)| *id).collect();
        let router = self.options.router.clone();
        let groups = &mut self.groups;
        let watermark = &mut self.last_sequence;
        let mut ops = 0u64;

        let replayed = replay_log(
            &log_file_name(&self.root, log),
            log,
            self.options.verify_checksums,
            |batch| {
                let (first, last) = (batch.sequence(), batch.last_sequence());
                if first <= *watermark {
                    let dup = Error::DuplicateSequence {
                        first,
                        last,
                        watermark: *watermark,
                    };
                    info!(log, error = %dup, "ignoring duplicate batch");
                    return;
                }

                if groups.len() == 1 {
                    ops += insert_routed(log, &mut groups[0], &batch);
                } else {
                    let split = batch.separate_locality_groups(router.as_ref(), &ids);
                    if let Some(e) = &split.error {
                        warn!(log, error = %e, "batch cut short while routing");
                    }
                    for (slot, sub) in split.batches.iter().enumerate() {
                        if let Some(sub) = sub {
                            ops += insert_routed(log, &mut groups[slot], sub);
                        }
                    }
                }
                *watermark = last;
            },
        );

        for (id, repairer) in &mut self.groups {
            if !repairer.has_buffer() {
                continue;
            }
            match repairer.build_table_from_buffer(log) {
                Ok(Some(number)) => {
                    if let Err(e) = repairer.add_table_meta(number) {
                        warn!(lg = *id, log, table = number, error = %e, "new table rejected");
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(lg = *id, log, error = %e, "ignoring table build error"),
            }
        }
        info!(log, ops, "converted log");
        replayed.map(|_| ())
    }

    /// Write every group's descriptor, even after one fails.
    fn write_descriptors(&mut self) -> Result<()> {
        let mut last_error = None;
        for (id, repairer) in &mut self.groups {
            if let Err(e) = repairer.write_descriptor() {
                warn!(lg = *id, error = %e, "writing descriptor failed");
                last_error = Some(e);
            }
        }
        last_error.map_or(Ok(()), Err)
    }
}

fn insert_routed(log: u64, (id, repairer): &mut (GroupId, Repairer), batch: &WriteBatch) -> u64 {
    match repairer.insert_batch(batch) {
        Ok(n) => u64::from(n),
        Err(e) => {
            warn!(lg = *id, log, error = %e, "ignoring insert error");
            0
        }
    }
}
