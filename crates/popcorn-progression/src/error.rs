//! Error types for the popcorn-progression crate.
//!
//! Processing itself is infallible. Only loading a [`ProgressionConfig`]
//! with nonsensical ranges can fail.
//!
//! [`ProgressionConfig`]: crate::ProgressionConfig

/// Errors produced when validating a progression config.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProgressionConfigError {
    /// The experience gain range contains no values.
    #[error("min_gain ({min}) must not exceed max_gain ({max})")]
    EmptyGainRange {
        /// Configured lower bound.
        min: u64,
        /// Configured upper bound.
        max: u64,
    },

    /// The reward range contains no values.
    #[error("reward_min ({min}) must not exceed reward_max ({max})")]
    EmptyRewardRange {
        /// Configured lower bound.
        min: i64,
        /// Configured upper bound.
        max: i64,
    },

    /// Level-up rewards must never debit a member.
    #[error("reward_min must be non-negative, got {min}")]
    NegativeReward {
        /// Configured lower bound.
        min: i64,
    },

    /// The cooldown does not fit the supported window.
    #[error("cooldown_secs {secs} exceeds one year")]
    CooldownTooLong {
        /// Configured cooldown in seconds.
        secs: u64,
    },
}
