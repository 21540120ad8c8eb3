use crate::{
    barrier::AllDoneBarrier,
    notifier::MultiEventNotifier,
    task::ResultEnvelope,
    types::{OuterIndex, WorkValue},
};
use std::sync::Arc;

/// Completion aggregator: combines the result envelopes of one outer
/// submission's children into a single value and delivers it to the active
/// consumer protocol.
///
/// Each flavor is invoked exactly once per outer position, only after every
/// child of that submission has reported — partial child sets never trigger
/// a premature delivery (the structured join in the scatter step enforces
/// this).
#[derive(Debug, Clone)]
pub(super) enum AggregationTarget {
    /// Discards the payload and decrements the barrier once per outer
    /// submission, regardless of how many inner units it contained.
    AllDone(Arc<AllDoneBarrier>),
    /// Sums the envelopes belonging to the outer position and posts the sum
    /// to that position's notifier slot.
    WakeOnEach(Arc<MultiEventNotifier>),
}

impl AggregationTarget {
    /// The `complete` half of the task-node contract.
    pub(super) fn complete(&self, outer: OuterIndex, envelopes: &[ResultEnvelope]) {
        match self {
            Self::AllDone(barrier) => barrier.arrive(),
            Self::WakeOnEach(notifier) => {
                let sum: WorkValue = envelopes.iter().map(|envelope| envelope.value).sum();
                notifier.post(outer, sum);
            }
        }
    }
}
