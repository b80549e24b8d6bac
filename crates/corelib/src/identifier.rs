//! Positions in the ring's identifier space and arc arithmetic over them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in `[0, m)` for whatever ring modulus `m` the owning
/// `RingNode` was constructed with.
///
/// `Identifier` carries no modulus of its own — arithmetic that needs one
/// (`add_pow2`, `in_arc`) takes `m` explicitly, since a bare identifier is
/// meaningless without knowing which ring it belongs to, and threading
/// `m` through call sites is cheaper than wrapping every value in a
/// ring-tagged type for a single-ring-per-process design.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier(pub u64);

impl Identifier {
    pub const ZERO: Identifier = Identifier(0);

    /// `(self + 2^i) mod m`. Used to compute finger-table start points.
    ///
    /// `i` is bounded by `K = ceil(log2(m))` which is at most 64, so `2^i`
    /// never overflows `u64` for `i < 64`.
    pub fn add_pow2(self, i: u32, m: u64) -> Identifier {
        let step = 1u64.checked_shl(i).unwrap_or(0);
        Identifier(modulo_add(self.0, step, m))
    }

    pub fn add(self, delta: u64, m: u64) -> Identifier {
        Identifier(modulo_add(self.0, delta, m))
    }

    /// Clockwise distance from `self` to `other`, in `[0, m)`.
    pub fn distance_to(self, other: Identifier, m: u64) -> u64 {
        if m == 0 {
            return 0;
        }
        if other.0 >= self.0 {
            other.0 - self.0
        } else {
            (m - self.0) + other.0
        }
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn modulo_add(a: u64, b: u64, m: u64) -> u64 {
    if m == 0 {
        return 0;
    }
    // a, b < m so a%m + b%m < 2m, safe to add without overflow for any
    // m that fits a u64, then reduce once more.
    let a = a % m;
    let b = b % m;
    let sum = a.wrapping_add(b);
    if sum < a {
        // overflowed u64; reduce via u128 to stay correct at the top of
        // the range (m close to u64::MAX).
        (((a as u128) + (b as u128)) % (m as u128)) as u64
    } else {
        sum % m
    }
}

/// Number of finger-table entries for ring modulus `m`: `ceil(log2(m))`.
///
/// `m <= 1` degenerates to a single-entry table (a ring of size 0 or 1
/// has nowhere else to point).
pub fn finger_table_len(m: u64) -> usize {
    if m <= 1 {
        return 1;
    }
    (64 - (m - 1).leading_zeros()) as usize
}

/// Whether `x` lies on the clockwise arc from `a` to `b` (mod `m`).
///
/// `inc_a`/`inc_b` control whether the respective endpoint is included.
/// Handles wrap-around (`b < a` in absolute terms is the common case on a
/// ring). `a == b` with both endpoints open denotes the whole ring minus
/// the single point `a`; with both closed it denotes the whole ring.
pub fn in_arc(a: Identifier, b: Identifier, x: Identifier, inc_a: bool, inc_b: bool, m: u64) -> bool {
    if m == 0 {
        return false;
    }
    if a.0 == b.0 {
        if inc_a || inc_b {
            return true;
        }
        return x.0 != a.0;
    }

    let span = a.distance_to(b, m);
    let offset = a.distance_to(x, m);

    if offset == 0 {
        return inc_a;
    }
    if offset == span {
        return inc_b;
    }
    offset < span
}
