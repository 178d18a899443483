//! Progression engine for the Popcorn leveling bot.
//!
//! Members earn experience from chat activity, level up along a fixed
//! quadratic curve, and receive credits when they do. This crate holds the
//! rules and nothing else: no I/O, no clocks, no global state. Callers fetch
//! the member's records, hand them to [`ProgressionEngine`], and persist the
//! [`Outcome::patch`] themselves.
//!
//! # Modules
//!
//! - [`curve`] -- Experience threshold per level ([`threshold_for`])
//! - [`processor`] -- Cooldown gate, gain, roll-over, and reward ([`ProgressionEngine`])
//! - [`reward`] -- Level-up credit reward and milestone bonus tiers
//! - [`config`] -- Tunable cooldown and ranges ([`ProgressionConfig`])
//! - [`error`] -- Config validation errors ([`ProgressionConfigError`])
//!
//! # Usage
//!
//! ```
//! use chrono::Utc;
//! use popcorn_progression::{Draws, Outcome, ProgressionEngine};
//! use popcorn_types::{BalanceRecord, ProgressionRecord, Settings};
//!
//! let engine = ProgressionEngine::default();
//! let record = ProgressionRecord { experience: 95, level: 0, last_award_at: None };
//! let settings = Settings { levels_enabled: true };
//!
//! let outcome = engine.apply(
//!     &record,
//!     &BalanceRecord::default(),
//!     settings,
//!     Utc::now(),
//!     Draws { gain: 10, reward_base: 45 },
//! );
//!
//! let Outcome::LeveledUp(level_up) = outcome else { unreachable!() };
//! assert_eq!(level_up.new_level, 1);
//! assert_eq!(level_up.record.experience, 5);
//! ```

pub mod config;
pub mod curve;
pub mod error;
pub mod processor;
pub mod reward;

// Re-export primary types at crate root.
pub use config::ProgressionConfig;
pub use curve::{threshold_for, total_experience_for};
pub use error::ProgressionConfigError;
pub use processor::{Draws, LevelUp, Outcome, ProgressionEngine, SkipReason, roll_over};
pub use reward::{CENTENNIAL_BONUS, DECADE_BONUS, level_bonus, level_reward};
