//! Tunable parameters of the progression processor.
//!
//! Mirrors the `progression:` section of the bot's YAML config. Every field
//! has a default matching the live bot, so an empty section is valid.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::ProgressionConfigError;

/// Longest cooldown accepted, one year. Keeps the window representable.
const MAX_COOLDOWN_SECS: u64 = 365 * 24 * 60 * 60;

/// Cooldown, gain range, and reward range for the progression processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Minimum seconds between two experience grants to the same member.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Smallest experience gain per qualifying event (inclusive).
    #[serde(default = "default_min_gain")]
    pub min_gain: u64,

    /// Largest experience gain per qualifying event (inclusive).
    #[serde(default = "default_max_gain")]
    pub max_gain: u64,

    /// Smallest base credit reward on level-up (inclusive).
    #[serde(default = "default_reward_min")]
    pub reward_min: i64,

    /// Largest base credit reward on level-up (inclusive).
    #[serde(default = "default_reward_max")]
    pub reward_max: i64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            min_gain: default_min_gain(),
            max_gain: default_max_gain(),
            reward_min: default_reward_min(),
            reward_max: default_reward_max(),
        }
    }
}

impl ProgressionConfig {
    /// Check that every range is non-empty and the cooldown is representable.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressionConfigError::EmptyGainRange`],
    /// [`ProgressionConfigError::EmptyRewardRange`],
    /// [`ProgressionConfigError::NegativeReward`], or
    /// [`ProgressionConfigError::CooldownTooLong`].
    pub const fn validate(&self) -> Result<(), ProgressionConfigError> {
        if self.min_gain > self.max_gain {
            return Err(ProgressionConfigError::EmptyGainRange {
                min: self.min_gain,
                max: self.max_gain,
            });
        }
        if self.reward_min < 0 {
            return Err(ProgressionConfigError::NegativeReward {
                min: self.reward_min,
            });
        }
        if self.reward_min > self.reward_max {
            return Err(ProgressionConfigError::EmptyRewardRange {
                min: self.reward_min,
                max: self.reward_max,
            });
        }
        if self.cooldown_secs > MAX_COOLDOWN_SECS {
            return Err(ProgressionConfigError::CooldownTooLong {
                secs: self.cooldown_secs,
            });
        }
        Ok(())
    }

    /// The cooldown window as a [`TimeDelta`].
    pub fn cooldown(&self) -> TimeDelta {
        i64::try_from(self.cooldown_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }
}

const fn default_cooldown_secs() -> u64 {
    60
}

const fn default_min_gain() -> u64 {
    15
}

const fn default_max_gain() -> u64 {
    25
}

const fn default_reward_min() -> i64 {
    45
}

const fn default_reward_max() -> i64 {
    50
}
