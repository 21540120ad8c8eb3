use crate::types::{InnerIndex, OuterIndex};
use core::time::Duration;

/// Consumer-side synchronization strategy for one batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConsumerProtocol {
    /// Block the submitting thread on a single countdown barrier released
    /// only when every outer submission has finished. No per-arrival
    /// visibility.
    AllDone,
    /// Wake the submitting thread each time any one outer submission
    /// finishes, letting it drain partial results incrementally.
    WakeOnEach,
}

/// Parameters of one batch submission.
#[must_use]
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of top-level submissions in the batch.
    pub outer_count: OuterIndex,
    /// Number of leaf units each outer submission decomposes into.
    pub inner_count: InnerIndex,
    /// How the submitting thread synchronizes with completion.
    pub protocol: ConsumerProtocol,
    /// Upper bound on each individual consumer wait under `WakeOnEach`.
    ///
    /// `None` waits indefinitely. The batch is finite by construction, so an
    /// unbounded wait terminates unless a unit of work diverges; the bound
    /// turns that latent hang into a reported failure.
    pub drain_timeout: Option<Duration>,
}

impl BatchConfig {
    /// Batch parameters with an unbounded consumer wait.
    pub fn new(
        outer_count: OuterIndex,
        inner_count: InnerIndex,
        protocol: ConsumerProtocol,
    ) -> Self {
        Self {
            outer_count,
            inner_count,
            protocol,
            drain_timeout: None,
        }
    }
}
