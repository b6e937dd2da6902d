use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::InternalKey;

/// Maximum height of the skip list. LevelDB uses 12.
pub const MAX_HEIGHT: usize = 12;

/// Per-node bookkeeping counted by `size_bytes` on top of key and value.
const NODE_OVERHEAD: usize = std::mem::size_of::<SkipNode>();

/// A single node in the skip list.
///
/// Each node has `height` forward pointers. Level 0 contains all nodes
/// (a regular linked list). Higher levels skip over nodes, enabling
/// O(log n) average-case search.
///
/// ```text
/// Level 3:  HEAD ──────────────────────────────► 50 ──────────► NIL
/// Level 2:  HEAD ──────────► 20 ────────────────► 50 ──────────► NIL
/// Level 1:  HEAD ──► 10 ──► 20 ────► 35 ────────► 50 ──► 60 ──► NIL
/// Level 0:  HEAD ──► 10 ──► 20 ──► 25 ──► 35 ──► 50 ──► 60 ──► 70 ► NIL
/// ```
///
/// Nodes live in an arena (`SkipList.nodes`) and point at each other by
/// index, so the list needs no unsafe code and drops in one go.
struct SkipNode {
    key: InternalKey,
    /// `key.encode()`, kept so iterators can hand out `&[u8]` keys.
    encoded_key: Vec<u8>,
    value: Vec<u8>,
    forward: Vec<Option<usize>>,
}

/// A probabilistic sorted map from internal keys to values.
///
/// Average case: O(log n) insert, O(log n) lookup, O(n) iteration.
pub struct SkipList {
    nodes: Vec<SkipNode>,
    /// Forward pointers of the head sentinel.
    head: [Option<usize>; MAX_HEIGHT],
    height: usize,
    size_bytes: usize,
    rng: StdRng,
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

impl SkipList {
    /// Create a new empty skip list.
    pub fn new() -> Self {
        SkipList {
            nodes: Vec::new(),
            head: [None; MAX_HEIGHT],
            height: 1,
            size_bytes: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Insert a key-value pair. Overwrites if the exact internal key exists.
    pub fn insert(&mut self, key: InternalKey, value: Vec<u8>) {
        let mut update: [Option<usize>; MAX_HEIGHT] = [None; MAX_HEIGHT];
        let mut cur = None;
        for level in (0..self.height).rev() {
            while let Some(next) = self.next_of(cur, level) {
                if self.nodes[next].key < key {
                    cur = Some(next);
                } else {
                    break;
                }
            }
            update[level] = cur;
        }

        if let Some(existing) = self.next_of(cur, 0) {
            if self.nodes[existing].key == key {
                let node = &mut self.nodes[existing];
                self.size_bytes = self.size_bytes - node.value.len() + value.len();
                node.value = value;
                return;
            }
        }

        let height = self.random_height();
        if height > self.height {
            // update[] for the new levels is already None (the head)
            self.height = height;
        }

        let idx = self.nodes.len();
        let forward = (0..height).map(|level| self.next_of(update[level], level)).collect();
        let encoded_key = key.encode();
        self.size_bytes += encoded_key.len() + value.len() + NODE_OVERHEAD;
        self.nodes.push(SkipNode {
            key,
            encoded_key,
            value,
            forward,
        });
        for (level, prev) in update.iter().enumerate().take(height) {
            self.set_next(*prev, level, Some(idx));
        }
    }

    /// Number of entries in the skip list.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the skip list is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Approximate memory usage in bytes.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Create an iterator over all entries in sorted order.
    pub fn iter(&self) -> SkipListIterator<'_> {
        SkipListIterator {
            list: self,
            current: self.head[0],
        }
    }

    fn next_of(&self, node: Option<usize>, level: usize) -> Option<usize> {
        match node {
            None => self.head[level],
            Some(idx) => self.nodes[idx].forward[level],
        }
    }

    fn set_next(&mut self, node: Option<usize>, level: usize, next: Option<usize>) {
        match node {
            None => self.head[level] = next,
            Some(idx) => self.nodes[idx].forward[level] = next,
        }
    }

    /// Each level has a 1/4 probability (LevelDB uses 1/4, not 1/2).
    fn random_height(&mut self) -> usize {
        let mut height = 1;
        while height < MAX_HEIGHT && self.rng.gen_ratio(1, 4) {
            height += 1;
        }
        height
    }
}

/// Iterator over skip list entries in sorted order.
///
/// Simply follows level 0 forward pointers — level 0 is a sorted linked list
/// containing every entry.
pub struct SkipListIterator<'a> {
    list: &'a SkipList,
    current: Option<usize>,
}

impl<'a> SkipListIterator<'a> {
    pub(crate) fn restart(&mut self) {
        self.current = self.list.head[0];
    }

    pub(crate) fn peek(&self) -> Option<&'a [u8]> {
        self.current.map(|idx| self.list.nodes[idx].encoded_key.as_slice())
    }

    pub(crate) fn peek_value(&self) -> Option<&'a [u8]> {
        self.current.map(|idx| self.list.nodes[idx].value.as_slice())
    }
}

impl<'a> Iterator for SkipListIterator<'a> {
    type Item = (&'a InternalKey, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        let node = &self.list.nodes[idx];
        self.current = node.forward[0];
        Some((&node.key, node.value.as_slice()))
    }
}
