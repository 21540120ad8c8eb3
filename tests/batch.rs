#![allow(missing_docs)]
#![cfg(not(feature = "loom"))]

use scatter_join::{
    config::{BatchConfig, ConsumerProtocol},
    executor::{BatchReport, Executor, SubmitError},
    task::Work,
    types::{InnerIndex, OuterIndex, WorkValue},
};
use std::{
    collections::HashSet,
    sync::Mutex,
    time::Duration,
};

/// The reference payload: deterministic running time proportional to `i * j`,
/// returning `i * j` work units.
fn useless_work(i: OuterIndex, j: InnerIndex) -> WorkValue {
    let max = u64::from(i) * u64::from(j);
    let mut back = 0.0f64;
    for _ in 0..max {
        back += (max as f64).sqrt();
    }
    // Keep the loop from being optimized out; the total is `max` itself.
    std::hint::black_box(back);
    max
}

fn executor() -> Executor<fn(OuterIndex, InnerIndex) -> WorkValue> {
    Executor::new(useless_work as fn(_, _) -> _, 4).expect("pool must build")
}

#[test]
fn work_count_invariance_across_protocols() {
    let executor = executor();

    let sequential = executor
        .run_sequential(&BatchConfig::new(5, 10, ConsumerProtocol::AllDone))
        .unwrap();
    let all_done = executor
        .submit_batch(&BatchConfig::new(5, 10, ConsumerProtocol::AllDone))
        .unwrap();
    let wake_on_each = executor
        .submit_batch(&BatchConfig::new(5, 10, ConsumerProtocol::WakeOnEach))
        .unwrap();

    assert_eq!(sequential.leaf_executions, 50);
    assert_eq!(all_done.leaf_executions, 50);
    assert_eq!(wake_on_each.leaf_executions, 50);

    assert_eq!(
        sequential.consumed_work_units,
        all_done.consumed_work_units
    );
    assert_eq!(
        sequential.consumed_work_units,
        wake_on_each.consumed_work_units
    );
}

#[test]
fn exactly_once_aggregation_per_outer_position() {
    // Per-outer sums become distinct base-16 digits (inner_count < 16), so
    // any missing or duplicated aggregation changes the total unambiguously.
    let executor =
        Executor::new(|i: OuterIndex, _j: InnerIndex| 1u64 << (4 * i), 4).expect("pool must build");

    let outer_count = 6u32;
    let inner_count = 10u32;
    let expected: WorkValue = (0..outer_count)
        .map(|i| u64::from(inner_count) * (1u64 << (4 * i)))
        .sum();

    let report = executor
        .submit_batch(&BatchConfig::new(
            outer_count,
            inner_count,
            ConsumerProtocol::WakeOnEach,
        ))
        .unwrap();
    assert_eq!(report.consumed_work_units, expected);

    let report = executor
        .submit_batch(&BatchConfig::new(
            outer_count,
            inner_count,
            ConsumerProtocol::AllDone,
        ))
        .unwrap();
    assert_eq!(report.consumed_work_units, expected);
}

/// Records every `(outer, inner)` position and panics on a repeat.
#[derive(Debug, Default)]
struct PositionRecorder {
    seen: Mutex<HashSet<(OuterIndex, InnerIndex)>>,
}

impl Work for PositionRecorder {
    fn run(&self, i: OuterIndex, j: InnerIndex) -> WorkValue {
        let mut seen = self.seen.lock().unwrap();
        assert!(seen.insert((i, j)), "leaf ({i}, {j}) executed twice");
        1
    }
}

#[test]
fn every_leaf_position_executes_exactly_once() {
    let executor = Executor::new(PositionRecorder::default(), 4).expect("pool must build");

    let outer_count = 7u32;
    let inner_count = 9u32;
    let report = executor
        .submit_batch(&BatchConfig::new(
            outer_count,
            inner_count,
            ConsumerProtocol::WakeOnEach,
        ))
        .unwrap();

    assert_eq!(
        report.leaf_executions,
        u64::from(outer_count) * u64::from(inner_count)
    );
    assert_eq!(
        report.consumed_work_units,
        u64::from(outer_count) * u64::from(inner_count)
    );
}

#[test]
fn single_worker_pool_completes_both_protocols() {
    // With one worker, every forked leaf and every root run on the same
    // thread; the inline-execution policy must not deadlock the pool.
    let executor =
        Executor::new(|i: OuterIndex, j: InnerIndex| u64::from(i) + u64::from(j), 1)
            .expect("pool must build");

    for protocol in [ConsumerProtocol::AllDone, ConsumerProtocol::WakeOnEach] {
        let report = executor
            .submit_batch(&BatchConfig::new(4, 4, protocol))
            .unwrap();
        assert_eq!(report.leaf_executions, 16);
    }
}

#[test]
fn wake_on_each_with_generous_timeout_completes() {
    let executor = executor();
    let mut config = BatchConfig::new(3, 3, ConsumerProtocol::WakeOnEach);
    config.drain_timeout = Some(Duration::from_secs(30));

    let BatchReport {
        leaf_executions, ..
    } = executor.submit_batch(&config).unwrap();
    assert_eq!(leaf_executions, 9);
}

#[test]
fn degenerate_batches_are_rejected() {
    let executor = executor();

    let empty = BatchConfig::new(0, 10, ConsumerProtocol::AllDone);
    assert_eq!(
        executor.submit_batch(&empty).unwrap_err(),
        SubmitError::EmptyBatch
    );
    assert_eq!(
        executor.run_sequential(&empty).unwrap_err(),
        SubmitError::EmptyBatch
    );

    let no_fan_out = BatchConfig::new(10, 0, ConsumerProtocol::WakeOnEach);
    assert_eq!(
        executor.submit_batch(&no_fan_out).unwrap_err(),
        SubmitError::EmptyFanOut
    );
}

#[test]
fn repeated_wake_on_each_runs_stay_consistent() {
    // Repeated small batches shake out lost-wakeup style hangs under real
    // scheduling; every run must drain the same total.
    let executor =
        Executor::new(|i: OuterIndex, j: InnerIndex| u64::from(i) * u64::from(j), 8)
            .expect("pool must build");

    let config = BatchConfig::new(64, 8, ConsumerProtocol::WakeOnEach);
    let expected = executor.run_sequential(&config).unwrap().consumed_work_units;
    for _ in 0..10 {
        let report = executor.submit_batch(&config).unwrap();
        assert_eq!(report.consumed_work_units, expected);
    }
}

#[test]
fn fan_out_of_one_runs_entirely_inline() {
    // fan_out == 1 forks zero children: the root's single unit executes
    // inline and still aggregates exactly once per outer submission.
    let executor =
        Executor::new(|i: OuterIndex, _j: InnerIndex| u64::from(i) + 1, 4).expect("pool must build");

    let report = executor
        .submit_batch(&BatchConfig::new(5, 1, ConsumerProtocol::WakeOnEach))
        .unwrap();
    assert_eq!(report.leaf_executions, 5);
    assert_eq!(report.consumed_work_units, 1 + 2 + 3 + 4 + 5);
}
