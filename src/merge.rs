//! In-place linear-time merge kernels for bitonic segments (C4).
//!
//! Two equal-length segments, each internally monotone (ascending or
//! descending), are merged in a single linear pass into either ascending
//! ([`merge_up`]) or descending ([`merge_dn`]) order, using a scratch
//! buffer of twice the segment length. Direction of each input is
//! detected once, up front, by comparing its first and last elements,
//! which collapses what the source names as eight separate directional
//! variants (`{Up, Dn} × {UpUp, UpDn, DnUp, DnDn}`) into one parameterized
//! walk, since in Rust the four input-direction combinations are just a
//! choice of start index and step rather than four copy-pasted loops.
//!
//! All eight combinations produce the same result as concatenating the
//! two segments, sorting, and projecting the result back onto the two
//! halves. On a tie, the element from the left segment (`a`) wins, so
//! the merge is stable with respect to segment provenance.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Ascending,
    Descending,
}

#[inline]
fn direction<T: PartialOrd>(s: &[T]) -> Dir {
    if s.len() < 2 || s[0] <= s[s.len() - 1] {
        Dir::Ascending
    } else {
        Dir::Descending
    }
}

/// Walks `a` and `b` from whichever end makes each locally ascending,
/// writing `out_ascending` order into `out`. `out` must have length
/// `2 * a.len()`.
fn merge_into<T: PartialOrd + Copy>(a: &[T], b: &[T], out: &mut [T], out_ascending: bool) {
    let n = a.len();
    debug_assert_eq!(b.len(), n);
    debug_assert_eq!(out.len(), 2 * n);
    if n == 0 {
        return;
    }

    let da = direction(a);
    let db = direction(b);

    let mut ai: isize = if da == Dir::Ascending { 0 } else { n as isize - 1 };
    let astep: isize = if da == Dir::Ascending { 1 } else { -1 };
    let mut bi: isize = if db == Dir::Ascending { 0 } else { n as isize - 1 };
    let bstep: isize = if db == Dir::Ascending { 1 } else { -1 };

    let mut out_idx: isize = if out_ascending { 0 } else { 2 * n as isize - 1 };
    let out_step: isize = if out_ascending { 1 } else { -1 };

    let mut ac = 0usize;
    let mut bc = 0usize;

    while ac < n && bc < n {
        let av = a[ai as usize];
        let bv = b[bi as usize];
        // Tie prefers the left segment, regardless of output direction.
        let take_a = if out_ascending { av <= bv } else { av >= bv };
        if take_a {
            out[out_idx as usize] = av;
            ai += astep;
            ac += 1;
        } else {
            out[out_idx as usize] = bv;
            bi += bstep;
            bc += 1;
        }
        out_idx += out_step;
    }
    while ac < n {
        out[out_idx as usize] = a[ai as usize];
        ai += astep;
        ac += 1;
        out_idx += out_step;
    }
    while bc < n {
        out[out_idx as usize] = b[bi as usize];
        bi += bstep;
        bc += 1;
        out_idx += out_step;
    }
}

/// Merges `a` and `b` into ascending order in place.
///
/// `a` and `b` must have equal length, each internally monotone
/// (ascending or descending); `buf` must have length `2 * a.len()` and
/// is used as scratch. On return, the smaller half of the combined
/// multiset occupies `a` and the larger half occupies `b`, both
/// ascending.
///
/// # Panics
///
/// Panics (via `debug_assert`) if `a.len() != b.len()` or
/// `buf.len() != 2 * a.len()`.
pub fn merge_up<T: PartialOrd + Copy>(a: &mut [T], b: &mut [T], buf: &mut [T]) {
    merge_into(a, b, buf, true);
    let n = a.len();
    a.copy_from_slice(&buf[..n]);
    b.copy_from_slice(&buf[n..]);
}

/// Merges `a` and `b` into descending order in place. See [`merge_up`]
/// for the shared preconditions.
pub fn merge_dn<T: PartialOrd + Copy>(a: &mut [T], b: &mut [T], buf: &mut [T]) {
    merge_into(a, b, buf, false);
    let n = a.len();
    a.copy_from_slice(&buf[..n]);
    b.copy_from_slice(&buf[n..]);
}
