//! Order book - fixed-capacity price-time matching engine.
//!
//! All state lives in a pre-allocated arena plus two bucketed ladders; the
//! submit path performs no heap allocation (use [`OrderBook::submit_into`]
//! for a fully pool-backed call). Matching is single-threaded: exactly one
//! logical thread may drive `submit`/`cancel` at a time, and all concurrency
//! is pushed out to the ring channel boundary.
//!
//! The ladder is a bucketed approximation, not an exact price-sorted
//! structure: orders whose prices land in the same bucket share priority,
//! FIFO by arrival. Matching walks the opposite ladder from bucket 0 upward
//! and fills greedily against every resting order it encounters; limit and
//! market orders differ only in whether a residual rests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use arrayvec::ArrayVec;

use crate::arena::{Arena, NULL_INDEX};
use crate::ladder::Ladder;
use crate::types::{Execution, Order, OrderId, Price, Qty, Side};

/// Book geometry. Levels are centered on `ref_price`:
/// bucket = clamp((price - ref_price) / tick + levels/2, 0, levels-1).
#[derive(Clone, Copy, Debug)]
pub struct BookConfig {
    /// Price increment per bucket
    pub tick: Price,
    /// Number of buckets per side
    pub levels: usize,
    /// Arena capacity (maximum concurrently resting orders)
    pub max_orders: u32,
    /// Center of the ladder
    pub ref_price: Price,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            tick: 1,
            levels: 64,
            max_orders: 1024,
            ref_price: 10000,
        }
    }
}

impl BookConfig {
    /// Map a price onto its ladder bucket, saturating at the edges.
    /// Prices beyond the ladder range collapse into the boundary buckets.
    #[inline]
    pub fn bucket(&self, price: Price) -> usize {
        let diff = price - self.ref_price;
        let level = diff / self.tick + (self.levels as i64) / 2;
        level.clamp(0, self.levels as i64 - 1) as usize
    }
}

/// The matching engine: arena, bid/ask ladders, and the execution
/// sequence counter.
pub struct OrderBook {
    cfg: BookConfig,
    arena: Arena,
    bids: Ladder,
    asks: Ladder,
    /// Monotonic counter stamped onto every execution
    exec_seq: u64,
}

impl OrderBook {
    /// Create a book with the given geometry.
    ///
    /// # Panics
    /// Panics on a zero tick, zero levels, or zero capacity.
    pub fn new(cfg: BookConfig) -> Self {
        assert!(cfg.tick > 0, "tick must be positive");
        assert!(cfg.levels > 0, "levels must be non-zero");

        Self {
            cfg,
            arena: Arena::new(cfg.max_orders),
            bids: Ladder::new(cfg.levels),
            asks: Ladder::new(cfg.levels),
            exec_seq: 0,
        }
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submit an order, returning all executions it produced in generation
    /// order. Convenience variant that allocates the output vector.
    pub fn submit(&mut self, order: &Order) -> Vec<Execution> {
        let mut out = Vec::new();
        self.execute(order, |e| out.push(e));
        out
    }

    /// Submit an order, writing executions into a caller-supplied bounded
    /// buffer. No heap allocation occurs.
    ///
    /// Fills beyond the buffer's capacity still mutate the book and the
    /// sequence counter but are not recorded; size `CAP` for the worst case
    /// sweep the caller expects.
    ///
    /// Returns the number of executions recorded by this call.
    pub fn submit_into<const CAP: usize>(
        &mut self,
        order: &Order,
        out: &mut ArrayVec<Execution, CAP>,
    ) -> usize {
        let before = out.len();
        self.execute(order, |e| {
            if !out.is_full() {
                out.push(e);
            }
        });
        out.len() - before
    }

    /// Core match-then-rest pass shared by both submit variants.
    fn execute<F: FnMut(Execution)>(&mut self, order: &Order, mut emit: F) {
        let opposite = match order.side {
            Side::Buy => &mut self.asks,
            Side::Sell => &mut self.bids,
        };
        let residual =
            Self::match_against(&mut self.arena, opposite, &mut self.exec_seq, order, &mut emit);

        // Residual limit quantity rests at the tail of its bucket; market
        // residual is discarded. Arena exhaustion drops the residual too:
        // a hard capacity bound, not a retry condition.
        if residual > 0 && !order.is_market() {
            if let Some(idx) = self.arena.alloc() {
                let node = self.arena.get_mut(idx);
                node.id = order.id;
                node.price = order.price;
                node.ts = order.ts;
                node.qty = residual;
                node.remaining = residual;
                node.side = order.side;
                node.next = NULL_INDEX;

                let level = self.cfg.bucket(order.price);
                let same = match order.side {
                    Side::Buy => &mut self.bids,
                    Side::Sell => &mut self.asks,
                };
                same.push_tail(&mut self.arena, level, idx);
            }
        }
    }

    /// Walk the opposite ladder from bucket 0 upward, filling the incoming
    /// order against each chain head-first. Fully filled resting orders are
    /// unlinked and freed in place.
    ///
    /// Returns the incoming order's unfilled residual.
    fn match_against<F: FnMut(Execution)>(
        arena: &mut Arena,
        ladder: &mut Ladder,
        exec_seq: &mut u64,
        order: &Order,
        emit: &mut F,
    ) -> Qty {
        let mut remaining = order.qty;

        for level in 0..ladder.levels() {
            if remaining <= 0 {
                break;
            }

            let mut prev = NULL_INDEX;
            let mut cur = ladder.head(level);
            while cur != NULL_INDEX && remaining > 0 {
                let node = arena.get_mut(cur);
                let filled = remaining.min(node.remaining);

                let exec = Execution {
                    resting_id: node.id,
                    incoming_id: order.id,
                    filled_qty: filled,
                    price: node.price,
                    seq: *exec_seq,
                };
                *exec_seq += 1;

                node.remaining -= filled;
                remaining -= filled;

                let next = node.next;
                let exhausted = node.remaining == 0;
                emit(exec);

                if exhausted {
                    if prev == NULL_INDEX {
                        ladder.set_head(level, next);
                    } else {
                        arena.get_mut(prev).next = next;
                    }
                    arena.free(cur);
                } else {
                    prev = cur;
                }
                cur = next;
            }
        }

        remaining
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Cancel a resting order by id: unlink it and return its slot to the
    /// free list. Absence is a normal negative result, not an error.
    ///
    /// # Complexity
    /// O(total resting orders) - linear scan, bids first.
    pub fn cancel(&mut self, id: OrderId) -> bool {
        if let Some(idx) = self.bids.remove_by_id(&mut self.arena, id) {
            self.arena.free(idx);
            return true;
        }
        if let Some(idx) = self.asks.remove_by_id(&mut self.arena, id) {
            self.arena.free(idx);
            return true;
        }
        false
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Book geometry.
    #[inline]
    pub fn config(&self) -> &BookConfig {
        &self.cfg
    }

    /// Number of orders currently resting.
    #[inline]
    pub fn resting_count(&self) -> u32 {
        self.arena.allocated()
    }

    /// True if no orders rest on either side.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Remaining quantity of a resting order, or `None` if it is not in
    /// the book. Linear scan; intended for tests and telemetry.
    pub fn resting_remaining(&self, id: OrderId) -> Option<Qty> {
        for ladder in [&self.bids, &self.asks] {
            for level in 0..ladder.levels() {
                for idx in ladder.iter_level(&self.arena, level) {
                    let node = self.arena.get(idx);
                    if node.id == id {
                        return Some(node.remaining);
                    }
                }
            }
        }
        None
    }

    /// Total remaining quantity and order count in one bucket.
    /// `side` selects the resting side: Buy reads the bid ladder.
    pub fn depth_at(&self, side: Side, level: usize) -> (i64, u32) {
        let ladder = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        ladder.depth(&self.arena, level)
    }

    /// Hash of the full resting-book contents, for golden-master
    /// determinism tests: identical inputs must yield identical hashes.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.arena.allocated().hash(&mut hasher);
        self.exec_seq.hash(&mut hasher);

        for (tag, ladder) in [(0u8, &self.bids), (1u8, &self.asks)] {
            tag.hash(&mut hasher);
            for level in 0..ladder.levels() {
                for idx in ladder.iter_level(&self.arena, level) {
                    let node = self.arena.get(idx);
                    node.id.hash(&mut hasher);
                    node.price.hash(&mut hasher);
                    node.remaining.hash(&mut hasher);
                }
            }
        }

        hasher.finish()
    }

    /// Pre-fault arena pages before entering the hot loop.
    pub fn warm_up(&mut self) {
        self.arena.warm_up();
    }

    /// Next execution sequence number to be assigned.
    #[inline]
    pub fn next_seq(&self) -> u64 {
        self.exec_seq
    }

    /// Direct arena index lookup used by white-box tests.
    #[cfg(test)]
    fn arena_index_of(&self, id: OrderId) -> Option<crate::arena::ArenaIndex> {
        for ladder in [&self.bids, &self.asks] {
            for level in 0..ladder.levels() {
                for idx in ladder.iter_level(&self.arena, level) {
                    if self.arena.get(idx).id == id {
                        return Some(idx);
                    }
                }
            }
        }
        None
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("levels", &self.cfg.levels)
            .field("resting", &self.arena.allocated())
            .field("exec_seq", &self.exec_seq)
            .finish()
    }
}
