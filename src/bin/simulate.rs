//! Market-making simulation: a quote thread feeding the matching thread
//! over the ring channel, with per-order latency sampling.

use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use nanobook::{
    BookConfig, Engine, LatencySink, MarketMaker, Order, OrderOutcome, QuoteParams, RiskLimits,
    ScopedTimer,
};

/// Ring slots between the strategy thread and the matching thread.
const RING_SLOTS: usize = 1024;

#[derive(Parser, Debug)]
#[command(name = "simulate", about = "Two-thread market-making simulation")]
struct Args {
    /// Consumer loop iterations before shutdown
    #[arg(long, default_value_t = 1000)]
    iterations: u32,

    /// Quote spread in ticks around the reference price
    #[arg(long, default_value_t = 2)]
    spread: i64,

    /// Quote size
    #[arg(long, default_value_t = 1)]
    size: i32,

    /// Ladder center and quote reference price
    #[arg(long, default_value_t = 10000)]
    ref_price: i64,

    /// Pin the matching thread to the last CPU core
    #[arg(long)]
    pin: bool,

    /// Print each execution as it happens
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let cfg = BookConfig {
        ref_price: args.ref_price,
        ..BookConfig::default()
    };
    let mut engine = Engine::new(cfg, RiskLimits::default());

    let (tx, mut rx) = nanobook::channel::<Order, RING_SLOTS>();
    let params = Arc::new(QuoteParams::new(args.spread, args.size));
    let mut maker = MarketMaker::spawn_with_params(tx, args.ref_price, params);

    if args.pin {
        engine.pin_to_core();
    }
    engine.warm_up();

    let mut sink = LatencySink::new();
    let mut orders = 0u64;
    let mut fills = 0u64;
    let mut rejected = 0u64;

    for _ in 0..args.iterations {
        while let Some(order) = rx.pop() {
            let _tick = ScopedTimer::new(&mut sink, "tick_to_submit");
            orders += 1;

            match engine.process_order(&order) {
                OrderOutcome::Rejected => {
                    rejected += 1;
                    if args.verbose {
                        println!("Order rejected by risk id={}", order.id);
                    }
                }
                OrderOutcome::Executed(execs) => {
                    fills += execs.len() as u64;
                    if args.verbose {
                        for e in &execs {
                            println!(
                                "Exec: resting={} incoming={} qty={}@{}",
                                e.resting_id, e.incoming_id, e.filled_qty, e.price
                            );
                        }
                    }
                }
            }
        }
        thread::sleep(Duration::from_micros(500));
    }

    maker.stop();

    println!(
        "Processed {} orders: {} fills, {} rejected, {} resting",
        orders,
        fills,
        rejected,
        engine.book.resting_count()
    );
    println!(
        "Risk: position={} notional={}",
        engine.risk.position(),
        engine.risk.notional()
    );

    let mut stdout = std::io::stdout().lock();
    if sink.write_report(&mut stdout).is_err() {
        return ExitCode::FAILURE;
    }
    println!("Run complete.");
    ExitCode::SUCCESS
}
