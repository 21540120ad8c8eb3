//! Blocking primitives, swapped for their `loom` models under the `loom`
//! feature so the notifier and barrier can be exhaustively model-checked.

#[cfg(feature = "loom")]
mod imp {
    pub(crate) use loom::sync::{Condvar, Mutex};
}

#[cfg(not(feature = "loom"))]
mod imp {
    pub(crate) use std::sync::{Condvar, Mutex};
}

pub(crate) use imp::*;
