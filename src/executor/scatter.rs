use crate::{
    task::{Position, ResultEnvelope, TaskInput, Work},
    types::{InnerIndex, OuterIndex, SyncUnsafeCell},
};
use std::sync::atomic::{AtomicU64, Ordering};

/// Leaf-level running totals shared by every task node of one batch.
///
/// `work_units` is the protocol-independent accumulation of every leaf's
/// result, the cross-check against the consumer-side totals; the barrier
/// protocol gives the consumer no payload visibility, so this is the only
/// total it can report.
#[derive(Debug, Default)]
pub(super) struct LeafCounters {
    pub(super) leaf_executions: AtomicU64,
    pub(super) work_units: AtomicU64,
}

/// The `compute` half of the task-node contract: produce this node's full
/// result set.
///
/// A `LeafUnit` invokes the unit-of-work function and returns its single
/// envelope. A `RootBatch` forks `fan_out - 1` leaf nodes into a structured
/// scope, executes the remaining unit inline in the forking thread, and
/// returns once every forked child has reported — a single "first child"
/// signal is never enough. The exhaustive match is the entire input
/// validation: no other shape exists.
pub(super) fn compute<W: Work>(
    work: &W,
    input: TaskInput,
    counters: &LeafCounters,
) -> Vec<ResultEnvelope> {
    match input {
        TaskInput::LeafUnit { position } => vec![run_leaf(work, position, counters)],
        TaskInput::RootBatch { outer, fan_out } => scatter_leaves(work, outer, fan_out, counters),
    }
}

/// Fork `fan_out - 1` leaves, run the last unit inline, and collect all
/// `fan_out` envelopes after the structured join.
///
/// Forking every unit and then blocking the forking thread on its own
/// children would cost an extra scheduling round-trip and, under nested
/// fan-out, risk starving the pool of runnable threads; the inline unit
/// keeps the forking thread productive instead.
fn scatter_leaves<W: Work>(
    work: &W,
    outer: OuterIndex,
    fan_out: InnerIndex,
    counters: &LeafCounters,
) -> Vec<ResultEnvelope> {
    let forked = (fan_out - 1) as usize;
    let slots: Vec<SyncUnsafeCell<Option<ResultEnvelope>>> =
        (0..forked).map(|_| SyncUnsafeCell::new(None)).collect();
    let mut inline = None;
    rayon::scope(|s| {
        for (idx, slot) in slots.iter().enumerate() {
            let position = Position {
                outer,
                inner: idx as InnerIndex,
            };
            s.spawn(move |_| {
                // A forked child re-enters the same dispatch as a leaf node.
                let envelope = compute(work, TaskInput::LeafUnit { position }, counters)
                    .pop()
                    .expect("scatter_leaves: leaf produced no envelope");
                // SAFETY: Each forked leaf owns a distinct slot index, and
                // slots are read only after the scope joins, so this is the
                // only access to `slot` while the scope is live.
                unsafe {
                    *slot.get() = Some(envelope);
                }
            });
        }
        // The remaining unit, executed inline by the forking thread.
        let position = Position {
            outer,
            inner: fan_out - 1,
        };
        inline = Some(run_leaf(work, position, counters));
    });
    let mut envelopes = Vec::with_capacity(fan_out as usize);
    for slot in slots {
        let envelope = slot
            .into_inner()
            .expect("scatter_leaves: forked leaf did not report");
        envelopes.push(envelope);
    }
    envelopes.push(inline.expect("scatter_leaves: inline unit did not report"));
    envelopes
}

fn run_leaf<W: Work>(work: &W, position: Position, counters: &LeafCounters) -> ResultEnvelope {
    let value = work.run(position.outer, position.inner);
    counters.leaf_executions.fetch_add(1, Ordering::Relaxed);
    counters.work_units.fetch_add(value, Ordering::Relaxed);
    ResultEnvelope { position, value }
}
