//! # LSM repair with locality groups
//!
//! Rebuilds a log-structured store's manifests from the write-ahead logs and
//! sorted tables left on disk, after the manifest or its CURRENT pointer has
//! been lost or damaged.
//!
//! ## Core idea
//! Tables and logs are self-describing: a table's keys carry their sequence
//! numbers, and a log is a stream of checksummed batches. Replaying the logs
//! into fresh tables and scanning every table is enough to write a new
//! manifest that lists everything still readable at level 0. Whatever does
//! not survive the scan is moved aside into `lost/`, never deleted.
//!
//! A store may be split into locality groups, each with its own directory,
//! tables and manifest, all fed by one shared log. Repair routes each logged
//! mutation back to its group and keeps the original sequence numbers.
//!
//! ```no_run
//! use lsm_repair::{KeyPrefixRouter, Options, repair_db};
//!
//! let options = Options::default()
//!     .with_locality_groups([0, 1])
//!     .with_router(KeyPrefixRouter::new(0).with_prefix(b"idx:".to_vec(), 1));
//! let report = repair_db("/var/lib/store", options)?;
//! println!("recovered {} tables", report.tables());
//! # Ok::<(), lsm_repair::Error>(())
//! ```

pub mod batch;
pub mod bloom;
pub mod cache;
pub mod error;
pub mod filename;
pub mod iterator;
pub mod locality;
pub mod manifest;
pub mod memtable;
pub mod options;
pub mod repair;
pub mod sstable;
pub mod types;
pub mod wal;

pub use batch::WriteBatch;
pub use error::{Error, Result};
pub use locality::{DefaultGroupRouter, GroupId, KeyPrefixRouter, LocalityGroupRouter};
pub use options::Options;
pub use repair::{DbRepairer, GroupReport, RepairReport, Repairer, repair_db};
