use crate::error::{Error, Result};

/// The central iteration abstraction for the storage engine.
///
/// Every sorted data source (memtable, block, SSTable) implements this
/// trait, so the table builder can consume any of them.
///
/// Keys are encoded internal keys; values are raw bytes.
pub trait StorageIterator {
    /// Returns the current key. Only valid when is_valid() is true.
    fn key(&self) -> &[u8];

    /// Returns the current value. Only valid when is_valid() is true.
    fn value(&self) -> &[u8];

    /// Returns true if the iterator is positioned at a valid entry.
    fn is_valid(&self) -> bool;

    /// Advances to the next entry. Returns error on IO failure.
    fn next(&mut self) -> Result<()>;

    /// Positions the iterator at the first entry.
    fn seek_to_first(&mut self) -> Result<()>;

    /// Errors the iterator stepped over instead of stopping at.
    ///
    /// Sources that skip unreadable regions keep the first failure here;
    /// a caller that needs every entry must check it after iterating.
    fn status(&self) -> Option<&Error> {
        None
    }
}
