//! Risk engine - lock-free position/notional accounting and pre-trade gate.
//!
//! Single-writer discipline: the matching thread is the only mutator
//! (`apply_fill`), while monitoring threads may read snapshots concurrently.
//! The check path is advisory: a fill applied between `check` and book
//! submission can make the check stale. That race is accepted; the check is
//! point-in-time, not transactional.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::types::{Price, Qty, Side};

/// Independently tunable limits. Each limit is its own atomic so a control
/// thread can adjust one while checks are in flight, without a lock; a check
/// racing a limit update is tolerated.
#[derive(Debug)]
pub struct RiskLimits {
    max_order_size: AtomicI64,
    max_position: AtomicI64,
    max_notional: AtomicI64,
}

impl RiskLimits {
    pub fn new(max_order_size: i64, max_position: i64, max_notional: i64) -> Self {
        Self {
            max_order_size: AtomicI64::new(max_order_size),
            max_position: AtomicI64::new(max_position),
            max_notional: AtomicI64::new(max_notional),
        }
    }

    #[inline]
    pub fn max_order_size(&self) -> i64 {
        self.max_order_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn max_position(&self) -> i64 {
        self.max_position.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn max_notional(&self) -> i64 {
        self.max_notional.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_max_order_size(&self, v: i64) {
        self.max_order_size.store(v, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_max_position(&self, v: i64) {
        self.max_position.store(v, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_max_notional(&self, v: i64) {
        self.max_notional.store(v, Ordering::Relaxed);
    }
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self::new(50, 100, 1_000_000)
    }
}

/// Single-instrument position (signed contracts, positive = net long) and
/// signed notional exposure. Zeroed at construction, never reset.
#[derive(Debug, Default)]
pub struct RiskEngine {
    position: AtomicI64,
    notional: AtomicI64,
    limits: RiskLimits,
}

impl RiskEngine {
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            position: AtomicI64::new(0),
            notional: AtomicI64::new(0),
            limits,
        }
    }

    /// Pre-trade gate. Validates, without mutating state:
    /// order size, projected position, projected notional.
    ///
    /// Relaxed loads: this runs on the submission hot path and only needs
    /// the current committed values, not a synchronized snapshot.
    pub fn check(&self, price: Price, qty: Qty, side: Side) -> bool {
        let qty = qty as i64;

        if qty.abs() > self.limits.max_order_size() {
            return false;
        }

        let position = self.position.load(Ordering::Relaxed);
        let new_position = position + side.sign() * qty;
        if new_position.abs() > self.limits.max_position() {
            return false;
        }

        let notional = self.notional.load(Ordering::Relaxed);
        let new_notional = notional + price * qty;
        if new_notional.abs() > self.limits.max_notional() {
            return false;
        }

        true
    }

    /// The single authoritative mutation point, invoked once per
    /// book-confirmed fill, never speculatively. Position moves by
    /// `side * qty`, notional by `price * qty`.
    pub fn apply_fill(&self, price: Price, qty: Qty, side: Side) {
        let qty = qty as i64;
        self.position.fetch_add(side.sign() * qty, Ordering::Relaxed);
        self.notional.fetch_add(price * qty, Ordering::Relaxed);
    }

    /// Current position snapshot. Acquire load so an observer thread sees a
    /// value reflecting some fully-completed prior `apply_fill`.
    #[inline]
    pub fn position(&self) -> i64 {
        self.position.load(Ordering::Acquire)
    }

    /// Current notional snapshot; same ordering contract as [`position`].
    ///
    /// [`position`]: RiskEngine::position
    #[inline]
    pub fn notional(&self) -> i64 {
        self.notional.load(Ordering::Acquire)
    }

    /// The limit set, for concurrent tuning.
    #[inline]
    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }
}
