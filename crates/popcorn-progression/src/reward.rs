//! Credit rewards paid on level-up.
//!
//! A level-up pays a base amount drawn from the configured reward range plus
//! half the new level (floor division), and a milestone bonus when the new
//! level is a multiple of 10 or 100. The bonus is evaluated against the final
//! level reached, so a multi-level jump pays at most one bonus.

/// Bonus for reaching a level that is a multiple of 100.
pub const CENTENNIAL_BONUS: i64 = 1000;

/// Bonus for reaching a level that is a multiple of 10 (but not 100).
pub const DECADE_BONUS: i64 = 100;

/// Milestone bonus for reaching `level`.
pub const fn level_bonus(level: u32) -> i64 {
    if level % 100 == 0 {
        CENTENNIAL_BONUS
    } else if level % 10 == 0 {
        DECADE_BONUS
    } else {
        0
    }
}

/// Base reward for reaching `level`: the drawn base plus `floor(level / 2)`.
pub fn level_reward(reward_base: i64, level: u32) -> i64 {
    reward_base.saturating_add(i64::from(level / 2))
}
