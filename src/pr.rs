//! Memory fences and the CPU spin hint used by the wait strategies and
//! the barrier/stage-counter protocols.
//!
//! # Memory Ordering
//!
//! - [`compiler_barrier`]: compiler barrier only, no hardware fence.
//! - [`fence_acquire`] / [`fence_release`] / [`fence_acqrel`]: named
//!   fences matching the orderings used throughout [`crate::barrier`]
//!   and [`crate::stage`].
//! - [`fence_seqcst`]: full sequentially-consistent fence, used where
//!   the spec accepts "sequential consistency is sufficient" as a
//!   simpler alternative to acquire/release pairing (§4.5.2 M4).
//!
//! # Progress Guarantees
//!
//! Every operation in this module is wait-free by definition.

use core::sync::atomic::{compiler_fence, fence, Ordering};

/// Compiler barrier: prevents compiler reordering, no hardware fence.
#[inline(always)]
pub fn compiler_barrier() {
    compiler_fence(Ordering::SeqCst);
}

/// Acquire fence.
#[inline(always)]
pub fn fence_acquire() {
    fence(Ordering::Acquire);
}

/// Release fence.
#[inline(always)]
pub fn fence_release() {
    fence(Ordering::Release);
}

/// Acquire-release fence.
#[inline(always)]
pub fn fence_acqrel() {
    fence(Ordering::AcqRel);
}

/// Full sequentially-consistent fence.
#[inline(always)]
pub fn fence_seqcst() {
    fence(Ordering::SeqCst);
}

/// CPU pause/stall hint for spin loops.
///
/// Reduces pipeline speculation and power draw while spinning; this is
/// the hardware half of the `pause` [`crate::wait::WaitStrategy`].
#[inline(always)]
pub fn stall() {
    core::hint::spin_loop();
}
