//! Stage-count arithmetic shared by the sort engine's precondition
//! checks (§4.5).
//!
//! # Operations
//!
//! - [`checked_log2`]: exact base-2 logarithm of a power of two, or
//!   `None` if `v` is zero or not a power of two.
//!
//! # Thread Safety
//!
//! Every function here is pure and wait-free.

/// Exact base-2 logarithm of `v`, or `None` if `v` is zero or not a
/// power of two.
#[inline]
pub const fn checked_log2(v: usize) -> Option<u32> {
    if v != 0 && v.is_power_of_two() {
        Some(v.trailing_zeros())
    } else {
        None
    }
}
