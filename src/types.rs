#[cfg(not(feature = "loom"))]
use core::cell::UnsafeCell;
#[cfg(not(feature = "loom"))]
use derive_more::{Deref, DerefMut};

/// Index of one outer submission within a batch.
pub type OuterIndex = u32;
/// Index of one inner (leaf) unit within an outer submission.
pub type InnerIndex = u32;
/// Numeric partial result produced by one unit of work.
pub type WorkValue = u64;

/// A minimal `UnsafeCell` wrapper that is `Sync` when `T: Sync`.
///
/// Used by the executor to let forked leaves publish their result envelopes
/// into disjoint slots of one shared buffer; correctness is ensured by
/// scheduling (every leaf owns exactly one slot index, and slots are read
/// only after the structured join).
#[cfg(not(feature = "loom"))]
#[derive(Debug, Deref, DerefMut)]
#[repr(transparent)]
pub(crate) struct SyncUnsafeCell<T>(UnsafeCell<T>);

#[cfg(not(feature = "loom"))]
unsafe impl<T: Sync> Sync for SyncUnsafeCell<T> {}

#[cfg(not(feature = "loom"))]
impl<T> SyncUnsafeCell<T> {
    pub(crate) fn new(val: T) -> Self {
        Self(UnsafeCell::new(val))
    }

    pub(crate) fn into_inner(self) -> T {
        self.0.into_inner()
    }
}
