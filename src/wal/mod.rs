//! Checksummed record logs.
//!
//! The same framing carries write batches (`NNNNNN.log`) and version
//! edits (`MANIFEST-NNNNNN`). Repair reads the former and writes the latter.

pub mod reader;
pub mod record;
pub mod writer;

pub use reader::{WALIterator, WALReader};
pub use record::encode_record;
pub use writer::WALWriter;
