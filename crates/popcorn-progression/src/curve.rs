//! Level curve: experience required per level.
//!
//! The experience needed to advance from level `N` to `N + 1` is
//! `5 * N^2 + 50 * N + 100`. The curve is strictly increasing and never
//! below 100, so a roll-over loop that subtracts thresholds always ends.

/// Experience required to advance from `level` to `level + 1`.
///
/// Saturates at [`u64::MAX`] instead of overflowing for absurd levels.
pub fn threshold_for(level: u32) -> u64 {
    let level = u64::from(level);
    level
        .saturating_mul(level)
        .saturating_mul(5)
        .saturating_add(level.saturating_mul(50))
        .saturating_add(100)
}

/// Total experience a member has earned to sit at `level` with no progress.
///
/// Equals the sum of [`threshold_for`] over every level below `level`, using
/// the closed form of the sums of `n` and `n^2`.
pub fn total_experience_for(level: u32) -> u64 {
    if level == 0 {
        return 0;
    }
    let n = u128::from(level);
    let prev = n.saturating_sub(1);

    // sum_{k<n} k^2 = (n-1) n (2n-1) / 6, sum_{k<n} k = (n-1) n / 2
    let squares = prev
        .saturating_mul(n)
        .saturating_mul(n.saturating_mul(2).saturating_sub(1))
        / 6;
    let linear = prev.saturating_mul(n) / 2;

    let total = squares
        .saturating_mul(5)
        .saturating_add(linear.saturating_mul(50))
        .saturating_add(n.saturating_mul(100));
    u64::try_from(total).unwrap_or(u64::MAX)
}
