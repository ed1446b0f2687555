//! End-to-end replay tests with golden audit logs.
//!
//! The replay log is a correctness surface: byte-for-byte reproducibility
//! given identical input and configuration.

use nanobook::{BookConfig, OrderBook, Replayer, RiskEngine, RiskLimits};

fn scenario_book() -> OrderBook {
    OrderBook::new(BookConfig {
        tick: 1,
        levels: 8,
        max_orders: 128,
        ref_price: 10000,
    })
}

fn replay(input: &str, limits: RiskLimits) -> (String, nanobook::ReplaySummary) {
    let mut book = scenario_book();
    let risk = RiskEngine::new(limits);
    let mut log = Vec::new();
    let summary = Replayer::new(&mut book, &risk, &mut log)
        .run(input.as_bytes())
        .expect("replay should not fail on in-memory i/o");
    (String::from_utf8(log).unwrap(), summary)
}

#[test]
fn test_partial_fill_golden_log() {
    // Sell 5 rests; buy 3 partially fills it; buy 2 consumes the rest
    let input = "\
ORDER,1,S,10002,5,10
ORDER,2,B,10002,3,11
ORDER,3,B,10002,2,12
";

    let (log, summary) = replay(input, RiskLimits::default());

    let golden = "\
TS=10,RISK,position=0,notional=0
TS=0,EXEC,resting=1,incoming=2,qty=3,price=10002
TS=11,RISK,position=3,notional=30006
TS=1,EXEC,resting=1,incoming=3,qty=2,price=10002
TS=12,RISK,position=5,notional=50010
";
    assert_eq!(log, golden);

    assert_eq!(summary.orders, 3);
    assert_eq!(summary.executions, 2);
    assert_eq!(summary.rejected, 0);
    assert_eq!(summary.skipped, 0);
}

#[test]
fn test_risk_gate_golden_log() {
    // Limits: order size 3, position 5. The 10-lot is rejected outright;
    // after a 3-lot fill the next buy would push position to 6 and is
    // rejected too.
    let input = "\
ORDER,1,S,10000,3,1
ORDER,2,B,10000,10,2
ORDER,3,B,10000,3,3
ORDER,4,B,10000,3,4
";

    let (log, summary) = replay(input, RiskLimits::new(3, 5, 1_000_000));

    let golden = "\
TS=1,RISK,position=0,notional=0
TS=2,ORDER=2,B,REJECTED
TS=0,EXEC,resting=1,incoming=3,qty=3,price=10000
TS=3,RISK,position=3,notional=30000
TS=4,ORDER=4,B,REJECTED
";
    assert_eq!(log, golden);

    assert_eq!(summary.orders, 4);
    assert_eq!(summary.rejected, 2);
    assert_eq!(summary.executions, 1);
}

#[test]
fn test_replay_is_byte_identical_across_runs() {
    // A busier stream: both sides, partial fills, missing timestamps,
    // an unparseable row, and a risk rejection
    let input = "\
ORDER,1,S,10003,8,100
ORDER,2,S,10001,4
ORDER,3,B,10002,10
noise,line
ORDER,4,B,10001,45
ORDER,5,S,9999,60
ORDER,6,B,9999,7
";

    let limits = || RiskLimits::new(50, 100, 10_000_000);
    let (first, summary) = replay(input, limits());
    let (second, summary2) = replay(input, limits());

    assert_eq!(first, second, "replay log must be byte-identical");
    assert_eq!(summary, summary2);
    assert_eq!(summary.skipped, 1);
    assert!(summary.executions > 0);
    assert!(summary.rejected > 0, "the 60-lot should breach the size limit");
}

#[test]
fn test_local_timestamp_assignment() {
    // Rows without timestamps count up from 1; an explicit timestamp
    // resets the local counter
    let input = "\
ORDER,1,B,9999,1
ORDER,2,B,9998,1
ORDER,3,B,9997,1,50
ORDER,4,B,9996,1
";

    let (log, _) = replay(input, RiskLimits::default());

    let ts_lines: Vec<&str> = log.lines().collect();
    assert_eq!(ts_lines[0], "TS=1,RISK,position=0,notional=0");
    assert_eq!(ts_lines[1], "TS=2,RISK,position=0,notional=0");
    assert_eq!(ts_lines[2], "TS=50,RISK,position=0,notional=0");
    assert_eq!(ts_lines[3], "TS=51,RISK,position=0,notional=0");
}

#[test]
fn test_replayed_book_state_matches_direct_submission() {
    use nanobook::{Order, Side};

    let input = "\
ORDER,1,S,10002,5,1
ORDER,2,B,10002,3,2
";
    let mut replayed = scenario_book();
    {
        let risk = RiskEngine::default();
        let mut log = Vec::new();
        Replayer::new(&mut replayed, &risk, &mut log)
            .run(input.as_bytes())
            .unwrap();
    }

    let mut direct = scenario_book();
    direct.submit(&Order::new(1, Side::Sell, 10002, 5, 1));
    direct.submit(&Order::new(2, Side::Buy, 10002, 3, 2));

    assert_eq!(replayed.state_hash(), direct.state_hash());
    assert_eq!(replayed.resting_remaining(1), Some(2));
}
