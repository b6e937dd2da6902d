use crate::bloom::BloomFilter;

/// Collects user keys while a table is being written, then sizes the filter
/// once the final key count is known.
///
/// Consecutive duplicates (several versions of one user key) are kept once.
pub struct BloomFilterBuilder {
    keys: Vec<Vec<u8>>,
    false_positive_rate: f64,
}

impl BloomFilterBuilder {
    pub fn new(false_positive_rate: f64) -> Self {
        BloomFilterBuilder {
            keys: Vec::new(),
            false_positive_rate,
        }
    }

    pub fn add_key(&mut self, key: &[u8]) {
        if self.keys.last().is_some_and(|last| last.as_slice() == key) {
            return;
        }
        self.keys.push(key.to_vec());
    }

    pub fn num_keys(&self) -> usize {
        self.keys.len()
    }

    /// Size and fill the filter, leaving the builder empty.
    pub fn build(&mut self) -> BloomFilter {
        let keys = std::mem::take(&mut self.keys);
        let mut filter = BloomFilter::new(keys.len(), self.false_positive_rate);
        for key in &keys {
            filter.insert(key);
        }
        filter
    }
}
