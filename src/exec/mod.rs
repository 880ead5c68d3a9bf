//! Speculative parallel for-each over a shared worklist.
//!
//! Worker threads pull items from a global worklist and run a user
//! [`Operator`] under cautious concurrency control: an iteration that
//! signals [`Conflict`] is rolled back (locks released, push buffer
//! discarded, allocator reset) and its item is retried from an aborted
//! list drained only by the leader thread. Any iteration may request a
//! cooperative break; global quiescence is decided by a token-passing
//! termination protocol.

pub mod context;
pub mod for_each;
pub mod termination;
pub mod worklist;

pub use context::{Conflict, IterationArena, IterationLock, LoopStatistics, UserContext};
pub use for_each::{for_each, ExecConfig, ForEach, Operator};
pub use termination::TerminationDetection;
pub use worklist::{FifoWorklist, StealingWorklist, Worklist};

use std::cell::Cell;

thread_local! {
    static WORKER_ID: Cell<usize> = const { Cell::new(0) };
}

/// Bind the calling thread's worker id for the duration of a loop.
pub(crate) fn set_worker_id(id: usize) {
    WORKER_ID.with(|w| w.set(id));
}

/// Worker id of the calling thread (0 outside a loop).
pub(crate) fn worker_id() -> usize {
    WORKER_ID.with(|w| w.get())
}
