mod aggregate;
mod scatter;

use crate::{
    barrier::AllDoneBarrier,
    config::{BatchConfig, ConsumerProtocol},
    executor::{aggregate::AggregationTarget, scatter::LeafCounters},
    notifier::MultiEventNotifier,
    task::{TaskInput, Work},
    types::{InnerIndex, OuterIndex, WorkValue},
};
use core::time::Duration;
use derive_more::Debug;
use std::{
    sync::{atomic::Ordering, Arc},
    time::Instant,
};
use thiserror::Error;

/// Error returned by `Executor::new` when the backing worker pool cannot be
/// brought up.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutorSetupError {
    /// The worker pool could not be built.
    #[error("failed to build the worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Error returned by batch submission.
///
/// Every variant is fatal for the batch: there is no retry policy, and no
/// partial results are ever reported as success.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmitError {
    /// The batch contains no outer submissions.
    #[error("batch contains no outer submissions")]
    EmptyBatch,
    /// An outer submission would decompose into zero leaf units.
    #[error("outer submissions must contain at least one inner unit")]
    EmptyFanOut,
    /// The consumer's bounded wait elapsed before every outer submission
    /// posted its result.
    #[error("consumer wait timed out with {outstanding} outer submission(s) still outstanding")]
    DrainTimedOut {
        /// Outer submissions that never posted.
        outstanding: OuterIndex,
    },
}

/// Timing and cross-check data for one completed run.
///
/// Plain read data, valid once the producing call returns.
#[must_use]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Wall-clock time of the run, measured from the first submission to the
    /// consumer observing completion.
    pub elapsed: Duration,
    /// Total work units observed through the active consumer protocol.
    ///
    /// Under `WakeOnEach` this is the sum of drained per-submission results;
    /// under `AllDone` (where the barrier gives no payload visibility) and
    /// for the sequential baseline it is the leaf-level running total. For a
    /// fixed `outer_count x inner_count` all three must agree.
    pub consumed_work_units: WorkValue,
    /// Number of leaf units executed: always `outer_count * inner_count`.
    pub leaf_executions: u64,
}

/// Scatter-gather executor backed by a fixed worker pool.
///
/// Each outer submission becomes a root task node on the pool; the root
/// forks `inner_count - 1` leaf nodes into a structured scope and executes
/// the remaining unit inline in the forking thread, so the forking thread
/// contributes real work instead of idling on its own children. Submissions
/// are fire-and-forget: the consumer-side barrier or notifier is the join.
#[must_use]
#[derive(Debug)]
pub struct Executor<W: Work> {
    #[debug(skip)]
    work: Arc<W>,
    pool: rayon::ThreadPool,
}

impl<W: Work + 'static> Executor<W> {
    /// Build an executor running `work` on `parallelism` worker threads
    /// (`0` selects one thread per available core).
    ///
    /// # Errors
    /// If the worker pool cannot be built. This is the only point where the
    /// backend can refuse; individual submissions cannot fail afterwards.
    pub fn new(work: W, parallelism: usize) -> Result<Self, ExecutorSetupError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parallelism)
            .build()?;
        Ok(Self {
            work: Arc::new(work),
            pool,
        })
    }

    /// Submit a batch and block the calling thread until every outer
    /// submission's result has been aggregated.
    ///
    /// The calling thread is the consumer: under
    /// [`ConsumerProtocol::AllDone`] it parks on the countdown barrier, under
    /// [`ConsumerProtocol::WakeOnEach`] it wakes on each completion and
    /// drains partial results as they arrive.
    ///
    /// # Errors
    /// - [`SubmitError::EmptyBatch`] / [`SubmitError::EmptyFanOut`] if the
    ///   batch shape is degenerate.
    /// - [`SubmitError::DrainTimedOut`] if `drain_timeout` is set and
    ///   elapses with submissions still outstanding.
    pub fn submit_batch(&self, config: &BatchConfig) -> Result<BatchReport, SubmitError> {
        validate(config)?;
        match config.protocol {
            ConsumerProtocol::AllDone => self.run_all_done(config),
            ConsumerProtocol::WakeOnEach => self.run_wake_on_each(config),
        }
    }

    /// The sequential baseline: the same double loop over
    /// `outer_count x inner_count`, executed entirely in the calling thread.
    ///
    /// `protocol` and `drain_timeout` are ignored. Used to cross-check the
    /// work-count invariance of the parallel protocols.
    ///
    /// # Errors
    /// Same shape validation as [`submit_batch`](Self::submit_batch).
    pub fn run_sequential(&self, config: &BatchConfig) -> Result<BatchReport, SubmitError> {
        validate(config)?;
        let start = Instant::now();
        let mut total: WorkValue = 0;
        let mut leaves: u64 = 0;
        for i in 0..config.outer_count {
            for j in 0..config.inner_count {
                total += self.work.run(i, j);
                leaves += 1;
            }
        }
        Ok(BatchReport {
            elapsed: start.elapsed(),
            consumed_work_units: total,
            leaf_executions: leaves,
        })
    }

    fn run_all_done(&self, config: &BatchConfig) -> Result<BatchReport, SubmitError> {
        let barrier = Arc::new(AllDoneBarrier::new(config.outer_count));
        let counters = Arc::new(LeafCounters::default());
        let start = Instant::now();
        for outer in 0..config.outer_count {
            self.spawn_root(
                outer,
                config.inner_count,
                AggregationTarget::AllDone(Arc::clone(&barrier)),
                Arc::clone(&counters),
            );
        }
        barrier.await_all();
        let elapsed = start.elapsed();
        // The barrier's lock orders every leaf's counter update before these
        // loads, so relaxed reads observe the final values.
        Ok(BatchReport {
            elapsed,
            consumed_work_units: counters.work_units.load(Ordering::Relaxed),
            leaf_executions: counters.leaf_executions.load(Ordering::Relaxed),
        })
    }

    fn run_wake_on_each(&self, config: &BatchConfig) -> Result<BatchReport, SubmitError> {
        let notifier = Arc::new(MultiEventNotifier::new(config.outer_count));
        let counters = Arc::new(LeafCounters::default());
        let start = Instant::now();
        for outer in 0..config.outer_count {
            self.spawn_root(
                outer,
                config.inner_count,
                AggregationTarget::WakeOnEach(Arc::clone(&notifier)),
                Arc::clone(&counters),
            );
        }
        let mut consumed: WorkValue = 0;
        let mut on_result = |_position: OuterIndex, value: WorkValue| consumed += value;
        match config.drain_timeout {
            None => notifier.wait_and_drain(&mut on_result),
            Some(per_wait) => notifier
                .wait_and_drain_timeout(per_wait, &mut on_result)
                .map_err(|err| SubmitError::DrainTimedOut {
                    outstanding: err.outstanding,
                })?,
        }
        let elapsed = start.elapsed();
        Ok(BatchReport {
            elapsed,
            consumed_work_units: consumed,
            leaf_executions: counters.leaf_executions.load(Ordering::Relaxed),
        })
    }

    /// Fire one root task node into the pool. Fire-and-forget: completion is
    /// observed only through the aggregation target.
    fn spawn_root(
        &self,
        outer: OuterIndex,
        fan_out: InnerIndex,
        target: AggregationTarget,
        counters: Arc<LeafCounters>,
    ) {
        let work = Arc::clone(&self.work);
        self.pool.spawn(move || {
            let input = TaskInput::RootBatch { outer, fan_out };
            let envelopes = scatter::compute(work.as_ref(), input, &counters);
            target.complete(outer, &envelopes);
        });
    }
}

fn validate(config: &BatchConfig) -> Result<(), SubmitError> {
    if config.outer_count == 0 {
        return Err(SubmitError::EmptyBatch);
    }
    if config.inner_count == 0 {
        return Err(SubmitError::EmptyFanOut);
    }
    Ok(())
}
