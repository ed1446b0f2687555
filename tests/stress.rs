//! Stress Tests - Push the engine to its limits.
//!
//! These tests verify correctness under extreme conditions:
//! - Near-capacity operation and arena exhaustion
//! - High contention in a single price bucket
//! - Rapid order churn
//! - Ladder edge buckets

use nanobook::{BookConfig, Engine, Order, OrderBook, RiskLimits, Side};

fn big_config(max_orders: u32) -> BookConfig {
    BookConfig {
        tick: 1,
        levels: 64,
        max_orders,
        ref_price: 10000,
    }
}

fn order(id: u64, side: Side, price: i64, qty: i32, ts: i64) -> Order {
    Order::new(id, side, price, qty, ts)
}

// ============================================================================
// Capacity Stress Tests
// ============================================================================

#[test]
fn test_fill_arena_to_capacity() {
    const CAPACITY: u32 = 10_000;
    let mut book = OrderBook::new(big_config(CAPACITY));

    // Non-crossing: all bids, far side empty
    for i in 0..CAPACITY as u64 {
        let execs = book.submit(&order(i, Side::Buy, 9990 - (i % 8) as i64, 1, i as i64));
        assert!(execs.is_empty());
    }

    assert_eq!(book.resting_count(), CAPACITY);
}

#[test]
fn test_arena_full_drops_residual() {
    const CAPACITY: u32 = 100;
    let mut book = OrderBook::new(big_config(CAPACITY));

    for i in 0..CAPACITY as u64 {
        book.submit(&order(i, Side::Buy, 9990, 1, i as i64));
    }
    assert_eq!(book.resting_count(), CAPACITY);

    // Arena full: the next order cannot rest and its quantity vanishes
    book.submit(&order(1000, Side::Buy, 9990, 50, 1000));
    assert_eq!(book.resting_count(), CAPACITY);
    assert_eq!(book.resting_remaining(1000), None);
}

#[test]
fn test_arena_reuse_after_cancel() {
    const CAPACITY: u32 = 100;
    let mut book = OrderBook::new(big_config(CAPACITY));

    for i in 0..CAPACITY as u64 {
        book.submit(&order(i, Side::Buy, 9990, 1, i as i64));
    }

    assert!(book.cancel(50));

    book.submit(&order(1000, Side::Buy, 9990, 1, 1000));
    assert_eq!(book.resting_remaining(1000), Some(1));
    assert_eq!(book.resting_count(), CAPACITY);
}

#[test]
fn test_arena_returns_all_slots() {
    const CAPACITY: u32 = 1_000;
    let mut book = OrderBook::new(big_config(CAPACITY));

    for i in 0..CAPACITY as u64 {
        book.submit(&order(i, Side::Buy, 9985 + (i % 10) as i64, 1, i as i64));
    }
    assert_eq!(book.resting_count(), CAPACITY);

    for i in 0..CAPACITY as u64 {
        assert!(book.cancel(i), "order {} should cancel", i);
    }
    assert!(book.is_empty());

    // Every slot must be reusable
    for i in 0..CAPACITY as u64 {
        book.submit(&order(CAPACITY as u64 + i, Side::Sell, 10010, 1, i as i64));
    }
    assert_eq!(book.resting_count(), CAPACITY);
}

// ============================================================================
// High Contention Tests
// ============================================================================

#[test]
fn test_single_bucket_contention() {
    const ORDERS: u64 = 1_000;
    let mut book = OrderBook::new(big_config(10_000));

    for i in 0..ORDERS {
        book.submit(&order(i, Side::Sell, 10005, 100, i as i64));
    }
    assert_eq!(book.resting_count(), ORDERS as u32);

    // One sweep consumes every resting order at the bucket
    let execs = book.submit(&order(
        ORDERS,
        Side::Buy,
        10005,
        (ORDERS * 100) as i32,
        ORDERS as i64,
    ));

    assert_eq!(execs.len(), ORDERS as usize);
    assert!(book.is_empty());
}

#[test]
fn test_fifo_priority_under_contention() {
    let mut book = OrderBook::new(big_config(1_000));

    for i in 0..100u64 {
        book.submit(&order(i, Side::Sell, 10005, 10, i as i64));
    }

    // Match 50 orders worth
    let execs = book.submit(&order(1000, Side::Buy, 10005, 500, 1000));

    assert_eq!(execs.len(), 50);
    for (i, exec) in execs.iter().enumerate() {
        assert_eq!(exec.resting_id, i as u64, "fill {} should hit order {}", i, i);
    }

    // The 51st order is untouched
    assert_eq!(book.resting_remaining(50), Some(10));
}

// ============================================================================
// Rapid Churn Tests
// ============================================================================

#[test]
fn test_rapid_submit_cancel_cycles() {
    const CYCLES: u64 = 10_000;
    let mut book = OrderBook::new(big_config(1_000));

    for cycle in 0..CYCLES {
        let side = if cycle % 2 == 0 { Side::Buy } else { Side::Sell };
        let execs = book.submit(&order(cycle, side, 9995, 100, cycle as i64));
        // The book is empty at every submit, so each order rests and is
        // immediately canceled, exercising slot churn
        assert!(execs.is_empty());
        assert!(book.cancel(cycle));
    }

    assert!(book.is_empty(), "all slots should have been returned");
}

#[test]
fn test_rapid_match_cycles() {
    const CYCLES: u64 = 5_000;
    let mut book = OrderBook::new(big_config(10_000));

    let mut total_fills = 0u64;
    for cycle in 0..CYCLES {
        book.submit(&order(cycle * 2, Side::Sell, 10005, 100, cycle as i64));
        let execs = book.submit(&order(cycle * 2 + 1, Side::Buy, 10005, 100, cycle as i64));
        total_fills += execs.len() as u64;
    }

    assert_eq!(total_fills, CYCLES);
    assert!(book.is_empty());
    assert_eq!(book.next_seq(), CYCLES);
}

// ============================================================================
// Ladder Edge Cases
// ============================================================================

#[test]
fn test_far_prices_collapse_into_edge_buckets() {
    let mut book = OrderBook::new(big_config(1_000));

    // Way beyond the ladder range on both sides
    book.submit(&order(1, Side::Buy, 1, 5, 1));
    book.submit(&order(2, Side::Buy, 2, 5, 2));
    book.submit(&order(3, Side::Sell, 1_000_000, 5, 3));

    let cfg = *book.config();
    assert_eq!(cfg.bucket(1), 0);
    assert_eq!(cfg.bucket(1_000_000), cfg.levels - 1);

    // Both low-price bids share bucket 0, FIFO preserved
    let (qty, count) = book.depth_at(Side::Buy, 0);
    assert_eq!((qty, count), (10, 2));

    let execs = book.submit(&order(4, Side::Sell, 3, 10, 4));
    assert_eq!(execs.len(), 2);
    assert_eq!(execs[0].resting_id, 1);
    assert_eq!(execs[1].resting_id, 2);
}

#[test]
fn test_quantity_one_orders() {
    let mut book = OrderBook::new(big_config(1_000));

    for i in 0..100u64 {
        book.submit(&order(i, Side::Sell, 10001, 1, i as i64));
    }
    let execs = book.submit(&order(100, Side::Buy, 10001, 100, 100));
    assert_eq!(execs.len(), 100);
    assert!(execs.iter().all(|e| e.filled_qty == 1));
}

// ============================================================================
// Risk-Gated Engine Under Load
// ============================================================================

#[test]
fn test_engine_position_stays_bounded() {
    const OPS: u64 = 20_000;
    let max_position = 50i64;
    let mut engine = Engine::new(
        big_config(10_000),
        RiskLimits::new(10, max_position, i64::MAX / 2),
    );

    for i in 0..OPS {
        let side = if i % 3 == 0 { Side::Sell } else { Side::Buy };
        engine.process_order(&order(i, side, 10000 + (i % 5) as i64 - 2, 5, i as i64));

        let position = engine.risk.position();
        assert!(
            position.abs() <= max_position,
            "position {} breached limit at op {}",
            position,
            i
        );
    }
}
