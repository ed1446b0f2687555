//! Deterministic CSV replay runner.
//!
//! Reads `ORDER,id,side,price,qty[,ts]` records, drives them through the
//! risk gate and the book, and writes the byte-reproducible audit log.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use nanobook::{BookConfig, LatencySink, OrderBook, Replayer, RiskEngine, RiskLimits};

#[derive(Parser, Debug)]
#[command(name = "replay", about = "Deterministic order replay against the matching engine")]
struct Args {
    /// Input CSV of ORDER records
    input: PathBuf,

    /// Output audit log
    #[arg(short, long, default_value = "replay.log")]
    output: PathBuf,

    /// Price increment per ladder bucket
    #[arg(long, default_value_t = 1)]
    tick: i64,

    /// Ladder buckets per side
    #[arg(long, default_value_t = 64)]
    levels: usize,

    /// Arena capacity (max resting orders)
    #[arg(long, default_value_t = 1024)]
    max_orders: u32,

    /// Ladder center price
    #[arg(long, default_value_t = 10000)]
    ref_price: i64,

    /// Risk: maximum single order size
    #[arg(long, default_value_t = 50)]
    max_order_size: i64,

    /// Risk: maximum absolute position
    #[arg(long, default_value_t = 100)]
    max_position: i64,

    /// Risk: maximum absolute notional exposure
    #[arg(long, default_value_t = 1_000_000)]
    max_notional: i64,

    /// Write per-tick latency samples to this file
    #[arg(long)]
    latency_log: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("replay failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = BookConfig {
        tick: args.tick,
        levels: args.levels,
        max_orders: args.max_orders,
        ref_price: args.ref_price,
    };
    let mut book = OrderBook::new(cfg);
    let risk = RiskEngine::new(RiskLimits::new(
        args.max_order_size,
        args.max_position,
        args.max_notional,
    ));

    let input = BufReader::new(File::open(&args.input)?);
    let log = BufWriter::new(File::create(&args.output)?);

    let summary = match &args.latency_log {
        Some(path) => {
            let mut sink = LatencySink::with_sample_log(BufWriter::new(File::create(path)?));
            let summary = Replayer::new(&mut book, &risk, log)
                .with_latency_sink(&mut sink)
                .run(input)?;
            sink.flush()?;
            summary
        }
        None => Replayer::new(&mut book, &risk, log).run(input)?,
    };

    println!(
        "Replay complete: {} orders, {} executions, {} rejected, {} skipped",
        summary.orders, summary.executions, summary.rejected, summary.skipped
    );
    println!(
        "Final book: {} resting | position={} notional={}",
        book.resting_count(),
        risk.position(),
        risk.notional()
    );
    println!("Output: {}", args.output.display());

    Ok(())
}
