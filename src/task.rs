use crate::types::{InnerIndex, OuterIndex, WorkValue};

/// A pluggable unit of work: a pure function of two integers with bounded
/// running time that contributes a numeric partial result.
///
/// The executor invokes it once per leaf unit, from worker threads. Purity is
/// a contract, not an enforced property: an impure implementation breaks the
/// work-count cross-checks between protocols but nothing else.
pub trait Work: Send + Sync {
    /// Execute the unit of work for outer index `i` and inner index `j`.
    fn run(&self, i: OuterIndex, j: InnerIndex) -> WorkValue;
}

impl<F> Work for F
where
    F: Fn(OuterIndex, InnerIndex) -> WorkValue + Send + Sync,
{
    fn run(&self, i: OuterIndex, j: InnerIndex) -> WorkValue {
        self(i, j)
    }
}

/// Position of one leaf unit within a batch: `(outer submission, inner
/// unit)`. Carried by every result envelope for routing back to the right
/// aggregation slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    /// Outer submission this unit belongs to.
    pub outer: OuterIndex,
    /// Index of the unit within its outer submission.
    pub inner: InnerIndex,
}

/// Input accepted by a task node, matched exhaustively.
///
/// An unrecognized input shape is unrepresentable: where the source design
/// narrowed an opaque payload at runtime and aborted the batch on a mismatch,
/// the two legal shapes are encoded as variants.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TaskInput {
    /// The smallest scheduled piece of work; directly invokes the unit-of-work
    /// function.
    LeafUnit {
        /// Where the produced result is routed.
        position: Position,
    },
    /// A splittable root: fork `fan_out - 1` leaf nodes and execute the
    /// remaining unit inline in the forking thread.
    RootBatch {
        /// Outer submission being decomposed.
        outer: OuterIndex,
        /// Total number of leaf units, including the one executed inline.
        fan_out: InnerIndex,
    },
}

/// The payload returned by a leaf task node.
///
/// Exclusively owned by the node that produced it until handed to the
/// completion aggregator; never reused afterwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResultEnvelope {
    /// Identifies the producing leaf unit.
    pub position: Position,
    /// The numeric partial result.
    pub value: WorkValue,
}
