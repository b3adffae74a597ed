//! Symbolic factories (C6): turn a tag string into a constructed
//! primitive or `None`, never a panic.
//!
//! Mirrors this crate's lineage's convention of keying variant
//! construction off short uppercase tags rather than matching on an enum
//! directly at every call site, useful wherever the tag travels through
//! configuration or a CLI flag before the concrete type is chosen.

use crate::barrier::{Barrier, BarrierVariant, SenseBarrier, StepBarrier};
use crate::sort::SortMode;
use crate::task_queue::ConcurrentTaskQueue;

/// Builds a fresh [`Barrier`] for the named variant, or `None` if `tag`
/// is not one of `"BARRIER_SENSE"` / `"BARRIER_STEP"` (§4.6).
pub fn make_barrier(tag: &str) -> Option<Box<dyn Barrier>> {
    match tag {
        "BARRIER_SENSE" => Some(Box::new(SenseBarrier::new())),
        "BARRIER_STEP" => Some(Box::new(StepBarrier::new())),
        _ => None,
    }
}

/// Builds a fresh [`ConcurrentTaskQueue`], or `None` if `tag` is not
/// `"QUEUE_BLOCKING"` (§4.6). A single tag today, kept as a lookup
/// rather than an unconditional constructor so a second queue
/// implementation can be added later without changing callers.
pub fn make_queue(tag: &str) -> Option<ConcurrentTaskQueue> {
    match tag {
        "QUEUE_BLOCKING" => Some(ConcurrentTaskQueue::new()),
        _ => None,
    }
}

/// Resolves a sort-mode tag to a [`SortMode`], or `None` if unrecognized
/// (§4.6). Stealing variants default to the plain double-barrier scheme;
/// use `"SORT_STEALING_WAIT_FREE"` for the per-thread-stage-counter
/// refinement.
pub fn make_sort_mode(tag: &str) -> Option<SortMode> {
    match tag {
        "SORT_SEQUENTIAL" => Some(SortMode::Sequential),
        "SORT_FORK_JOIN" => Some(SortMode::ForkJoin),
        "SORT_BARRIER_SENSE" => Some(SortMode::Barrier(BarrierVariant::Sense)),
        "SORT_BARRIER_STEP" => Some(SortMode::Barrier(BarrierVariant::Step)),
        "SORT_LOCK_FREE" => Some(SortMode::LockFree),
        "SORT_STEALING" => Some(SortMode::Stealing {
            barrier_variant: BarrierVariant::Sense,
            wait_free: false,
        }),
        "SORT_STEALING_WAIT_FREE" => Some(SortMode::Stealing {
            barrier_variant: BarrierVariant::Sense,
            wait_free: true,
        }),
        _ => None,
    }
}
