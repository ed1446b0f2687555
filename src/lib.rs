//! # nanobook
//!
//! A deterministic, single-instrument matching engine with a pre-trade
//! risk gate, built for latency-sensitive simulation of exchange-style
//! order flow.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: one thread owns the book exclusively (no locks)
//! - **Allocation-Free Hot Path**: fixed arena, bounded buffers, index links
//! - **Deterministic**: identical input streams yield byte-identical
//!   executions, book state, and audit logs
//! - **Lock-Free Boundaries**: an SPSC ring feeds the matching thread;
//!   risk counters are plain atomics readable from monitors
//!
//! ## Architecture
//!
//! ```text
//! [Strategy Thread] --> [SPSC Ring] --> [Matching Thread (pinned)]
//!                                        risk check -> book submit
//!                                        -> risk fill -> audit log
//! ```

pub mod arena;
pub mod book;
pub mod engine;
pub mod ladder;
pub mod replay;
pub mod ring;
pub mod risk;
pub mod strategy;
pub mod timer;
pub mod types;

// Re-exports for convenience
pub use arena::{Arena, ArenaIndex, OrderNode, NULL_INDEX};
pub use book::{BookConfig, OrderBook};
pub use engine::{Engine, OrderOutcome};
pub use ladder::Ladder;
pub use replay::{ReplayError, ReplaySummary, Replayer};
pub use ring::{channel, Consumer, Producer};
pub use risk::{RiskEngine, RiskLimits};
pub use strategy::{MarketMaker, QuoteParams};
pub use timer::{LatencySink, ScopedTimer};
pub use types::{Execution, Order, OrderId, Price, Qty, Side, Timestamp};
