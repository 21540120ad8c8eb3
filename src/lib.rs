//! Nested scatter-gather task execution with two consumer-side join
//! strategies.
//!
//! This crate decomposes a batch of `outer_count` submissions into
//! `inner_count` leaf units each, runs the leaves on a fixed worker pool, and
//! lets the submitting thread collect results through one of two protocols:
//! - [`config::ConsumerProtocol::AllDone`]: a single countdown barrier that
//!   releases the consumer only when every outer submission has finished.
//! - [`config::ConsumerProtocol::WakeOnEach`]: the consumer is woken each time
//!   any one outer submission finishes and drains partial results
//!   incrementally, without losing wakeups and without busy-polling.
//!
//! Key modules:
//! - `task`: the unit-of-work contract (`Work`), task-node inputs as a tagged
//!   variant, and the result envelope.
//! - `barrier`: the "wait for all" countdown barrier.
//! - `notifier`: the multi-event notifier — per-slot completion flags, one
//!   wait/notify gate, and a countdown-based termination predicate that makes
//!   the lost-wakeup race impossible.
//! - `executor`: the scatter-gather engine — forks `fan_out - 1` leaf nodes
//!   per outer submission, runs the last unit inline in the forking thread,
//!   aggregates exactly once per outer position, and reports timing.
//! - `config`: batch parameters and protocol selection.
//!
//! Quick start:
//! 1. Provide a unit of work — any `Fn(OuterIndex, InnerIndex) -> WorkValue`
//!    that is pure and bounded in running time.
//! 2. Build an [`executor::Executor`] with a parallelism level.
//! 3. Call `submit_batch` with a [`config::BatchConfig`]; inspect the
//!    returned [`executor::BatchReport`].
//!
//! The executor guarantees that aggregation for an outer position happens
//! exactly once, only after every forked child of that position (plus the one
//! unit executed inline) has reported, and that a result posted to the
//! notifier is never observed with a stale value.

/// The "wait for all" countdown barrier used by the `AllDone` protocol.
pub mod barrier;
/// Batch parameters and consumer-protocol selection.
pub mod config;
/// The scatter-gather executor: forking, inline execution, aggregation,
/// timing.
///
/// Unavailable under the `loom` feature, whose scheduler model does not
/// cover the rayon pool; the blocking primitives in `barrier` and `notifier`
/// are the loom-modeled surface.
#[cfg(not(feature = "loom"))]
pub mod executor;
/// The multi-event notifier used by the `WakeOnEach` protocol.
///
/// Per-slot completion flags with result storage, one boolean gate, and a
/// countdown of outstanding submissions, all behind one mutex and one
/// condition variable.
pub mod notifier;
mod sync;
/// The unit-of-work contract, task-node inputs, and result envelopes.
pub mod task;
/// Index/value aliases and the `SyncUnsafeCell` publication primitive.
pub mod types;
