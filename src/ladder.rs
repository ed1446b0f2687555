//! Price ladder - a fixed array of FIFO chains of resting orders.
//!
//! Each slot is the head of a singly linked chain of arena indices at one
//! discretized price bucket. Index 0 is scanned first during matching.
//! New resting orders are always appended to the tail of their bucket's
//! chain, preserving arrival order within the bucket.

use crate::arena::{Arena, ArenaIndex, NULL_INDEX};
use crate::types::OrderId;

/// One side of the book: `levels` bucket chains over the shared arena.
///
/// The ladder never owns slots; it only holds head indices. Unlinked nodes
/// must be returned to the arena by the caller.
#[derive(Clone, Debug)]
pub struct Ladder {
    heads: Vec<ArenaIndex>,
}

impl Ladder {
    /// Create an empty ladder with the given number of price buckets.
    pub fn new(levels: usize) -> Self {
        Self {
            heads: vec![NULL_INDEX; levels],
        }
    }

    /// Number of price buckets.
    #[inline]
    pub fn levels(&self) -> usize {
        self.heads.len()
    }

    /// Head of the chain at `level`, or `NULL_INDEX` if the bucket is empty.
    #[inline]
    pub fn head(&self, level: usize) -> ArenaIndex {
        self.heads[level]
    }

    /// Replace the chain head at `level`.
    #[inline]
    pub fn set_head(&mut self, level: usize, index: ArenaIndex) {
        self.heads[level] = index;
    }

    /// Append a node to the tail of the chain at `level` (FIFO within a
    /// bucket: the newest order matches last).
    ///
    /// # Complexity
    /// O(chain length) - walks to the tail; chains are short in practice.
    pub fn push_tail(&mut self, arena: &mut Arena, level: usize, index: ArenaIndex) {
        debug_assert_eq!(arena.get(index).next, NULL_INDEX);

        let head = self.heads[level];
        if head == NULL_INDEX {
            self.heads[level] = index;
            return;
        }

        let mut cur = head;
        while arena.get(cur).next != NULL_INDEX {
            cur = arena.get(cur).next;
        }
        arena.get_mut(cur).next = index;
    }

    /// Unlink the node carrying `id` from whichever chain holds it.
    ///
    /// Returns the unlinked index so the caller can free it, or `None` if no
    /// chain in this ladder contains the id.
    ///
    /// # Complexity
    /// O(total resting orders in this ladder) - linear scan.
    pub fn remove_by_id(&mut self, arena: &mut Arena, id: OrderId) -> Option<ArenaIndex> {
        for level in 0..self.heads.len() {
            let mut cur = self.heads[level];
            let mut prev = NULL_INDEX;
            while cur != NULL_INDEX {
                if arena.get(cur).id == id {
                    let next = arena.get(cur).next;
                    if prev == NULL_INDEX {
                        self.heads[level] = next;
                    } else {
                        arena.get_mut(prev).next = next;
                    }
                    return Some(cur);
                }
                prev = cur;
                cur = arena.get(cur).next;
            }
        }
        None
    }

    /// Total remaining quantity and order count at `level`.
    pub fn depth(&self, arena: &Arena, level: usize) -> (i64, u32) {
        let mut qty = 0i64;
        let mut count = 0u32;
        let mut cur = self.heads[level];
        while cur != NULL_INDEX {
            let node = arena.get(cur);
            qty += node.remaining as i64;
            count += 1;
            cur = node.next;
        }
        (qty, count)
    }

    /// Iterate the chain at `level` in FIFO order.
    pub fn iter_level<'a>(&'a self, arena: &'a Arena, level: usize) -> ChainIter<'a> {
        ChainIter {
            arena,
            cur: self.heads[level],
        }
    }

    /// True if no bucket holds any order.
    pub fn is_empty(&self) -> bool {
        self.heads.iter().all(|&h| h == NULL_INDEX)
    }
}

/// Iterator over one bucket's chain, yielding arena indices in FIFO order.
pub struct ChainIter<'a> {
    arena: &'a Arena,
    cur: ArenaIndex,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = ArenaIndex;

    fn next(&mut self) -> Option<ArenaIndex> {
        if self.cur == NULL_INDEX {
            return None;
        }
        let idx = self.cur;
        self.cur = self.arena.get(idx).next;
        Some(idx)
    }
}
