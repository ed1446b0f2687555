//! Market-making strategy producer.
//!
//! A background thread that streams symmetric bid/ask quotes around a
//! reference price onto the ring channel. Quote parameters are individual
//! atomics so a control thread can retune them while the loop runs. The
//! thread observes a running flag at every iteration and is joined on
//! `stop`; dropping the handle stops and joins too, so the thread can
//! never outlive its owner.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::ring::Producer;
use crate::types::{Order, Price, Qty, Side, Timestamp};

/// Throttle between quote rounds.
const QUOTE_INTERVAL: Duration = Duration::from_micros(100);

/// Live-tunable quote parameters.
#[derive(Debug)]
pub struct QuoteParams {
    spread_ticks: AtomicI64,
    size: AtomicI32,
}

impl QuoteParams {
    pub fn new(spread_ticks: i64, size: Qty) -> Self {
        Self {
            spread_ticks: AtomicI64::new(spread_ticks),
            size: AtomicI32::new(size),
        }
    }

    #[inline]
    pub fn spread_ticks(&self) -> i64 {
        self.spread_ticks.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_spread_ticks(&self, v: i64) {
        self.spread_ticks.store(v, Ordering::Relaxed);
    }

    #[inline]
    pub fn size(&self) -> Qty {
        self.size.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_size(&self, v: Qty) {
        self.size.store(v, Ordering::Relaxed);
    }
}

impl Default for QuoteParams {
    fn default() -> Self {
        Self::new(2, 1)
    }
}

/// Handle to the quote thread.
pub struct MarketMaker {
    running: Arc<AtomicBool>,
    params: Arc<QuoteParams>,
    handle: Option<JoinHandle<()>>,
}

impl MarketMaker {
    /// Spawn the quote loop with default parameters.
    pub fn spawn<const N: usize>(tx: Producer<Order, N>, ref_price: Price) -> Self {
        Self::spawn_with_params(tx, ref_price, Arc::new(QuoteParams::default()))
    }

    /// Spawn the quote loop with shared, externally tunable parameters.
    pub fn spawn_with_params<const N: usize>(
        tx: Producer<Order, N>,
        ref_price: Price,
        params: Arc<QuoteParams>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let loop_params = Arc::clone(&params);

        let handle = thread::spawn(move || quote_loop(tx, ref_price, flag, loop_params));

        Self {
            running,
            params,
            handle: Some(handle),
        }
    }

    /// Quote parameters, shared with the running thread.
    #[inline]
    pub fn params(&self) -> &QuoteParams {
        &self.params
    }

    /// Signal the loop to exit at its next poll and join it.
    /// Idempotent; no in-flight quote round is interrupted mid-way.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MarketMaker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn quote_loop<const N: usize>(
    mut tx: Producer<Order, N>,
    ref_price: Price,
    running: Arc<AtomicBool>,
    params: Arc<QuoteParams>,
) {
    let mut next_id: u64 = 1;
    let mut ts: Timestamp = 1;

    while running.load(Ordering::Acquire) {
        let spread = params.spread_ticks();
        let size = params.size();

        // Symmetric quotes around the reference. A full ring means the
        // matching side is behind; the quote is dropped, not retried.
        let bid = Order::new(next_id, Side::Buy, ref_price - spread, size, ts);
        next_id += 1;
        ts += 1;
        let _ = tx.push(bid);

        let ask = Order::new(next_id, Side::Sell, ref_price + spread, size, ts);
        next_id += 1;
        ts += 1;
        let _ = tx.push(ask);

        thread::sleep(QUOTE_INTERVAL);
    }
}
