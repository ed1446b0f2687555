use hdrhistogram::Histogram;
use nanobook::{BookConfig, Execution, Order, OrderBook, Side};
use std::time::Instant;

fn main() {
    println!("Preparing Latency Benchmark...");

    // Setup: a wide ladder so alternating quotes sweep realistically
    let mut book = OrderBook::new(BookConfig {
        tick: 1,
        levels: 256,
        max_orders: 100_000,
        ref_price: 10000,
    });
    book.warm_up();

    let mut histogram = Histogram::<u64>::new_with_bounds(1, 100_000, 3).unwrap();

    const ITERATIONS: u64 = 1_000_000;

    println!("Running {} iterations...", ITERATIONS);

    let mut order_id = 0u64;
    let mut total_duration = std::time::Duration::new(0, 0);
    let mut execs = arrayvec::ArrayVec::<Execution, 64>::new();

    for _ in 0..ITERATIONS {
        order_id += 1;

        let side = if order_id % 2 == 0 { Side::Buy } else { Side::Sell };
        let order = Order::new(order_id, side, 10000 + (order_id % 100) as i64 - 50, 10, order_id as i64);

        // Critical measurement section
        let start = Instant::now();

        execs.clear();
        std::hint::black_box(book.submit_into(&order, &mut execs));

        let elapsed = start.elapsed();

        // Record nanoseconds; drop outliers beyond the histogram bound
        histogram.record(elapsed.as_nanos() as u64).unwrap_or(());
        total_duration += elapsed;
    }

    println!("\n=== Latency Report (ns) ===");
    println!("Total Ops:  {}", ITERATIONS);
    println!(
        "Throughput: {:.2} ops/sec",
        ITERATIONS as f64 / total_duration.as_secs_f64()
    );
    println!("---------------------------");
    println!("Min:    {:6} ns", histogram.min());
    println!("P50:    {:6} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:6} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:6} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:6} ns", histogram.value_at_quantile(0.999));
    println!("P99.99: {:6} ns", histogram.value_at_quantile(0.9999));
    println!("Max:    {:6} ns", histogram.max());
    println!("---------------------------");

    // Quick ASCII histogram
    println!("\nDistribution:");
    for v in histogram.iter_log(100_000, 2.0) {
        let count = v.count_at_value();
        if count > 0 {
            println!(
                "{:6} ns - {:6} ns: {:10} count",
                v.value_iterated_to(),
                v.value_iterated_to(),
                count
            );
        }
    }
}
