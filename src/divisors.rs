use std::collections::BTreeSet;

/// Largest value shown as a button, whatever the current number is.
pub const DEFAULT_CAP: u32 = 40;

/// Number of candidate buttons for `n`: `min(n, cap)`.
#[must_use]
pub fn candidate_limit(n: u32, cap: u32) -> u32 {
    n.min(cap)
}

/// Divisors of `n` in `1..=min(n, cap)`, found by trial division.
#[must_use]
pub fn divisors_of(n: u32, cap: u32) -> BTreeSet<u32> {
    (1..=candidate_limit(n, cap)).filter(|i| n % i == 0).collect()
}
