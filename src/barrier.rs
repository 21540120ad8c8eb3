use crate::sync::{Condvar, Mutex};
use crate::types::OuterIndex;

/// A "wait until the count reaches zero" barrier.
///
/// Initialized to the number of outer submissions in a batch; each completed
/// submission calls [`arrive`](Self::arrive) once, and the consumer blocks in
/// [`await_all`](Self::await_all) until the countdown hits zero. The
/// countdown is monotonically decreasing and reaches zero exactly once; no
/// per-arrival visibility is given to the consumer.
#[must_use]
#[derive(Debug)]
pub struct AllDoneBarrier {
    outstanding: Mutex<OuterIndex>,
    all_done: Condvar,
}

impl AllDoneBarrier {
    /// A barrier that releases its waiter after `count` arrivals.
    pub fn new(count: OuterIndex) -> Self {
        Self {
            outstanding: Mutex::new(count),
            all_done: Condvar::new(),
        }
    }

    /// Record one completed outer submission.
    ///
    /// The final arrival (the one that takes the countdown to zero) unblocks
    /// every thread waiting in [`await_all`](Self::await_all).
    ///
    /// # Panics
    /// If called more times than the initial count: the countdown is
    /// monotonic by contract.
    pub fn arrive(&self) {
        let mut outstanding = self
            .outstanding
            .lock()
            .expect("AllDoneBarrier::arrive: poisoned");
        *outstanding = outstanding
            .checked_sub(1)
            .expect("AllDoneBarrier::arrive: countdown underflow");
        if *outstanding == 0 {
            self.all_done.notify_all();
        }
    }

    /// Suspend the calling thread until the countdown reaches zero.
    ///
    /// Returns immediately if it already has. Exactly one wakeup matters (the
    /// final arrival); the guarded loop absorbs any spurious ones.
    pub fn await_all(&self) {
        let mut outstanding = self
            .outstanding
            .lock()
            .expect("AllDoneBarrier::await_all: poisoned");
        while *outstanding > 0 {
            outstanding = self
                .all_done
                .wait(outstanding)
                .expect("AllDoneBarrier::await_all: poisoned");
        }
    }

    /// Number of arrivals still outstanding.
    #[must_use]
    pub fn outstanding(&self) -> OuterIndex {
        *self
            .outstanding
            .lock()
            .expect("AllDoneBarrier::outstanding: poisoned")
    }
}
