use crate::sync::{Condvar, Mutex};
use crate::types::{OuterIndex, WorkValue};
#[cfg(not(feature = "loom"))]
use core::time::Duration;
use thiserror::Error;

/// Delivery state of one slot. Every slot moves `Unset -> Set -> Consumed`
/// exactly once per batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SlotState {
    Unset,
    Set,
    Consumed,
}

#[derive(Debug)]
struct Slot {
    state: SlotState,
    value: WorkValue,
}

#[derive(Debug)]
struct Shared {
    /// One slot per outer submission, indexed by outer position.
    slots: Box<[Slot]>,
    /// At least one slot turned `Set` since the consumer's last drain.
    ready: bool,
    /// Outer submissions that haven't posted yet. This, never `ready`, is
    /// the consumer's loop-termination predicate.
    outstanding: OuterIndex,
}

/// Lets a single consumer thread react to N independent, concurrently
/// completing producers without losing wakeups and without busy-polling.
///
/// One mutex and one condition variable guard all bookkeeping: per-slot
/// completion flags with result storage, the `ready` gate, and the
/// `outstanding` countdown. A plain per-producer condition variable would
/// force the consumer to block on N independent handles; the single gate
/// plus one O(N) scan per wakeup is the bounded-overhead alternative, and N
/// is the caller-controlled batch size.
///
/// The lost-wakeup race — a post landing between the consumer's last drain
/// and its reset of the gate — cannot hang the consumer: [`post`](Self::post)
/// decrements `outstanding` in the same critical section that sets the gate,
/// so the consumer either still observes `ready == true` and loops once more
/// without blocking, or observes `outstanding == 0` and exits without ever
/// calling wait. A final unconditional drain pass collects anything that
/// landed after the last in-loop scan.
#[must_use]
#[derive(Debug)]
pub struct MultiEventNotifier {
    shared: Mutex<Shared>,
    posted: Condvar,
}

/// The consumer's bounded wait elapsed with submissions still outstanding.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
#[error("consumer wait timed out with {outstanding} outer submission(s) still outstanding")]
pub struct WaitTimedOut {
    /// Outer submissions that had not posted when the wait gave up.
    pub outstanding: OuterIndex,
}

impl MultiEventNotifier {
    /// A notifier sized to `outer_count` outer submissions, all slots unset.
    pub fn new(outer_count: OuterIndex) -> Self {
        Self {
            shared: Mutex::new(Shared {
                slots: (0..outer_count)
                    .map(|_| Slot {
                        state: SlotState::Unset,
                        value: 0,
                    })
                    .collect(),
                ready: false,
                outstanding: outer_count,
            }),
            posted: Condvar::new(),
        }
    }

    /// Deliver the aggregated result of one outer submission and wake the
    /// consumer.
    ///
    /// Called concurrently by many completion threads; the lock serializes
    /// only this O(1) bookkeeping, never the unit-of-work computation that
    /// precedes it. The value is stored before the flag flips, and both are
    /// published by the same critical section, so the consumer can never
    /// observe a `Set` slot with a stale value.
    ///
    /// # Panics
    /// If `position` has already posted (slots are at-most-once by contract)
    /// or is out of range.
    pub fn post(&self, position: OuterIndex, value: WorkValue) {
        let mut shared = self
            .shared
            .lock()
            .expect("MultiEventNotifier::post: poisoned");
        let slot = &mut shared.slots[position as usize];
        assert_eq!(
            slot.state,
            SlotState::Unset,
            "MultiEventNotifier::post: duplicate post for position {position}",
        );
        slot.value = value;
        slot.state = SlotState::Set;
        shared.ready = true;
        shared.outstanding = shared
            .outstanding
            .checked_sub(1)
            .expect("MultiEventNotifier::post: countdown underflow");
        // Exactly one consumer thread, so a single-target notify suffices.
        self.posted.notify_one();
    }

    /// Consume every result as it arrives, returning once all outer
    /// submissions have posted.
    ///
    /// The only caller is the single consumer thread. `consume` receives
    /// `(position, value)` for each slot exactly once, in scan order within a
    /// drain pass; across passes there is no cross-position ordering —
    /// producers post in any order.
    pub fn wait_and_drain(&self, mut consume: impl FnMut(OuterIndex, WorkValue)) {
        loop {
            let mut shared = self
                .shared
                .lock()
                .expect("MultiEventNotifier::wait_and_drain: poisoned");
            // Guarded wait: the predicate is re-checked after every wakeup,
            // since two posts may coalesce into one notify and the condvar
            // may wake spuriously.
            while !shared.ready && shared.outstanding > 0 {
                shared = self
                    .posted
                    .wait(shared)
                    .expect("MultiEventNotifier::wait_and_drain: poisoned");
            }
            if shared.outstanding == 0 {
                // Termination is decided on the countdown, never on the
                // gate: a post that raced the previous gate reset has
                // already decremented `outstanding` under this same lock.
                break;
            }
            drain(&mut shared, &mut consume);
            shared.ready = false;
        }
        // A post can land between the last in-loop drain and the observation
        // of `outstanding == 0`; this unconditional pass collects it.
        let mut shared = self
            .shared
            .lock()
            .expect("MultiEventNotifier::wait_and_drain: poisoned");
        drain(&mut shared, &mut consume);
    }

    /// [`wait_and_drain`](Self::wait_and_drain) with a bound on each
    /// individual wait.
    ///
    /// # Errors
    /// [`WaitTimedOut`] if `per_wait` elapses with no new post and
    /// submissions still outstanding. Already-drained results are not
    /// rescinded; the error reports how many submissions never posted.
    #[cfg(not(feature = "loom"))]
    pub fn wait_and_drain_timeout(
        &self,
        per_wait: Duration,
        mut consume: impl FnMut(OuterIndex, WorkValue),
    ) -> Result<(), WaitTimedOut> {
        loop {
            let mut shared = self
                .shared
                .lock()
                .expect("MultiEventNotifier::wait_and_drain_timeout: poisoned");
            while !shared.ready && shared.outstanding > 0 {
                let (guard, timeout) = self
                    .posted
                    .wait_timeout(shared, per_wait)
                    .expect("MultiEventNotifier::wait_and_drain_timeout: poisoned");
                shared = guard;
                if timeout.timed_out() && !shared.ready && shared.outstanding > 0 {
                    return Err(WaitTimedOut {
                        outstanding: shared.outstanding,
                    });
                }
            }
            if shared.outstanding == 0 {
                break;
            }
            drain(&mut shared, &mut consume);
            shared.ready = false;
        }
        let mut shared = self
            .shared
            .lock()
            .expect("MultiEventNotifier::wait_and_drain_timeout: poisoned");
        drain(&mut shared, &mut consume);
        Ok(())
    }

    /// Number of outer submissions that haven't posted yet.
    #[must_use]
    pub fn outstanding(&self) -> OuterIndex {
        self.shared
            .lock()
            .expect("MultiEventNotifier::outstanding: poisoned")
            .outstanding
    }

    /// Reinitialize all slots, the gate, and the countdown for the next run.
    ///
    /// Takes `&mut self`, so no producer or consumer can be mid-operation.
    pub fn reset(&mut self) {
        let mut shared = self
            .shared
            .lock()
            .expect("MultiEventNotifier::reset: poisoned");
        shared.outstanding = shared.slots.len() as OuterIndex;
        shared.ready = false;
        for slot in shared.slots.iter_mut() {
            slot.state = SlotState::Unset;
            slot.value = 0;
        }
    }
}

/// Scan every slot once; consume and mark `Set -> Consumed`. Slots already
/// consumed are re-scanned but skipped, so back-to-back drains with no
/// intervening post deliver nothing twice.
fn drain(shared: &mut Shared, consume: &mut impl FnMut(OuterIndex, WorkValue)) {
    for (position, slot) in shared.slots.iter_mut().enumerate() {
        if slot.state == SlotState::Set {
            slot.state = SlotState::Consumed;
            consume(position as OuterIndex, slot.value);
        }
    }
}
