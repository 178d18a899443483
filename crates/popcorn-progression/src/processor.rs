//! Progression processor: turns a qualifying event into an updated record.
//!
//! # Pipeline
//!
//! 1. **Gate** -- leveling disabled, or the cooldown since the last grant has
//!    not elapsed: the event is dropped with [`Outcome::Skipped`].
//! 2. **Gain** -- add the drawn experience gain.
//! 3. **Roll-over** -- while the experience meets the current level's
//!    threshold, subtract it and advance one level. One event may cross
//!    several levels.
//! 4. **Reward** -- on level-up, credit the base reward plus the milestone
//!    bonus for the final level to balance and net worth.
//! 5. **Commit** -- stamp the cooldown timestamp and return the new state.
//!
//! The processor performs no I/O. Randomness enters only through [`Draws`],
//! so [`ProgressionEngine::apply`] is a pure function of its inputs and can
//! be replayed safely when the caller retries a failed save.

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;

use popcorn_types::{BalanceRecord, ProgressPatch, ProgressionRecord, Settings};

use crate::config::ProgressionConfig;
use crate::curve::threshold_for;
use crate::reward::{level_bonus, level_reward};

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// The random values one processing step consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draws {
    /// Experience gained by the event.
    pub gain: u64,
    /// Base credit reward, only paid if the event causes a level-up.
    pub reward_base: i64,
}

/// Why an event was dropped without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The community has leveling turned off (or no settings at all).
    LevelsDisabled,
    /// The member was granted experience too recently.
    Cooldown {
        /// Time left until the member is eligible again.
        remaining: TimeDelta,
    },
}

/// Details of a step that gained one or more levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    /// Progression after roll-over.
    pub record: ProgressionRecord,
    /// Balance after the reward was credited.
    pub balance: BalanceRecord,
    /// Number of levels gained by this step.
    pub levels_gained: u32,
    /// Final level reached.
    pub new_level: u32,
    /// Base reward credited, excluding the bonus.
    pub reward: i64,
    /// Milestone bonus credited, zero when the final level is no milestone.
    pub bonus: i64,
}

impl LevelUp {
    /// Total credited: reward plus bonus.
    pub const fn total_credit(&self) -> i64 {
        self.reward.saturating_add(self.bonus)
    }
}

/// Result of processing one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed; the event is discarded.
    Skipped(SkipReason),
    /// Experience increased without a level change.
    Updated {
        /// Progression after the gain.
        record: ProgressionRecord,
    },
    /// One or more levels were gained and a reward was credited.
    LeveledUp(LevelUp),
}

impl Outcome {
    /// Returns `true` if the event was dropped.
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// The updated progression, if anything changed.
    pub const fn record(&self) -> Option<&ProgressionRecord> {
        match self {
            Self::Skipped(_) => None,
            Self::Updated { record } => Some(record),
            Self::LeveledUp(level_up) => Some(&level_up.record),
        }
    }

    /// The partial update to persist, carrying only the fields this step
    /// changed. `None` when the event was skipped.
    pub fn patch(&self) -> Option<ProgressPatch> {
        match self {
            Self::Skipped(_) => None,
            Self::Updated { record } => Some(progression_patch(record)),
            Self::LeveledUp(level_up) => Some(ProgressPatch {
                balance: Some(level_up.balance.balance),
                net_worth: Some(level_up.balance.net_worth),
                ..progression_patch(&level_up.record)
            }),
        }
    }
}

fn progression_patch(record: &ProgressionRecord) -> ProgressPatch {
    ProgressPatch {
        level: Some(record.level),
        experience: Some(record.experience),
        last_award_at: record.last_award_at,
        balance: None,
        net_worth: None,
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Applies the progression rules with a fixed configuration.
///
/// Holds no per-member state; one engine serves every community.
#[derive(Debug, Clone, Default)]
pub struct ProgressionEngine {
    config: ProgressionConfig,
}

impl ProgressionEngine {
    /// Create an engine with the given configuration.
    ///
    /// The configuration should have passed [`ProgressionConfig::validate`];
    /// [`roll`](Self::roll) on an empty range falls back to the lower bound.
    pub const fn new(config: ProgressionConfig) -> Self {
        Self { config }
    }

    /// The configuration this engine applies.
    pub const fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Draw the random inputs for one step from `rng`.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Draws {
        let cfg = &self.config;
        let gain = if cfg.min_gain <= cfg.max_gain {
            rng.random_range(cfg.min_gain..=cfg.max_gain)
        } else {
            cfg.min_gain
        };
        let reward_base = if cfg.reward_min <= cfg.reward_max {
            rng.random_range(cfg.reward_min..=cfg.reward_max)
        } else {
            cfg.reward_min
        };
        Draws { gain, reward_base }
    }

    /// Process one qualifying event, drawing randomness from `rng`.
    pub fn process<R: Rng + ?Sized>(
        &self,
        record: &ProgressionRecord,
        balance: &BalanceRecord,
        settings: Settings,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Outcome {
        let draws = self.roll(rng);
        self.apply(record, balance, settings, now, draws)
    }

    /// Deterministic core of [`process`](Self::process).
    ///
    /// Identical inputs always produce an identical [`Outcome`].
    pub fn apply(
        &self,
        record: &ProgressionRecord,
        balance: &BalanceRecord,
        settings: Settings,
        now: DateTime<Utc>,
        draws: Draws,
    ) -> Outcome {
        if let Some(reason) = self.gate(record, settings, now) {
            return Outcome::Skipped(reason);
        }

        let gained = record.experience.saturating_add(draws.gain);
        let (level, experience) = roll_over(record.level, gained);
        let updated = ProgressionRecord {
            experience,
            level,
            last_award_at: Some(now),
        };

        let levels_gained = level.saturating_sub(record.level);
        if levels_gained == 0 {
            return Outcome::Updated { record: updated };
        }

        let reward = level_reward(draws.reward_base, level);
        let bonus = level_bonus(level);
        let mut new_balance = balance.clone();
        new_balance.credit(reward.saturating_add(bonus));

        tracing::debug!(
            from_level = record.level,
            to_level = level,
            levels_gained,
            reward,
            bonus,
            "member leveled up"
        );

        Outcome::LeveledUp(LevelUp {
            record: updated,
            balance: new_balance,
            levels_gained,
            new_level: level,
            reward,
            bonus,
        })
    }

    /// Check the cooldown and settings gate.
    ///
    /// Returns the reason to skip, or `None` when the event qualifies. A
    /// last-award timestamp in the future (clock skew) counts as cooling
    /// down rather than as eligible.
    pub fn gate(
        &self,
        record: &ProgressionRecord,
        settings: Settings,
        now: DateTime<Utc>,
    ) -> Option<SkipReason> {
        if !settings.levels_enabled {
            return Some(SkipReason::LevelsDisabled);
        }
        let last = record.last_award_at?;
        let cooldown = self.config.cooldown();
        let elapsed = now.signed_duration_since(last);
        if elapsed < cooldown {
            let remaining = cooldown.checked_sub(&elapsed).unwrap_or(cooldown);
            return Some(SkipReason::Cooldown { remaining });
        }
        None
    }

    /// Add raw experience for the owner-only `givexp` command.
    ///
    /// No gate, no roll-over, no cooldown stamp: the next qualifying event
    /// normalizes the surplus into levels and pays the reward then.
    pub const fn grant(record: &ProgressionRecord, amount: u64) -> ProgressionRecord {
        ProgressionRecord {
            experience: record.experience.saturating_add(amount),
            level: record.level,
            last_award_at: record.last_award_at,
        }
    }
}

/// Convert surplus experience into levels.
///
/// Each iteration pays the threshold of the level being left, so the result
/// always satisfies `experience < threshold_for(level)`.
pub fn roll_over(mut level: u32, mut experience: u64) -> (u32, u64) {
    // Multi-level jumps charge each level its own threshold, not the previous one's.
    let mut threshold = threshold_for(level);
    while let Some(rest) = experience.checked_sub(threshold) {
        experience = rest;
        level = level.saturating_add(1);
        threshold = threshold_for(level);
    }
    (level, experience)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn enabled() -> Settings {
        Settings {
            levels_enabled: true,
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_714_564_800, 0).unwrap_or_default()
    }

    fn record(level: u32, experience: u64) -> ProgressionRecord {
        ProgressionRecord {
            experience,
            level,
            last_award_at: None,
        }
    }

    fn wallet(balance: i64) -> BalanceRecord {
        BalanceRecord {
            balance,
            net_worth: balance,
            date_last_claimed_dailies: None,
        }
    }

    fn draws(gain: u64) -> Draws {
        Draws {
            gain,
            reward_base: 45,
        }
    }

    // -----------------------------------------------------------------------
    // Gate
    // -----------------------------------------------------------------------

    #[test]
    fn disabled_settings_always_skip() {
        let engine = ProgressionEngine::default();
        let outcome = engine.apply(
            &record(0, 95),
            &wallet(0),
            Settings::default(),
            t0(),
            draws(500),
        );
        assert_eq!(outcome, Outcome::Skipped(SkipReason::LevelsDisabled));
        assert!(outcome.patch().is_none());
    }

    #[test]
    fn cooldown_skips_regardless_of_gain() {
        let engine = ProgressionEngine::default();
        let mut rec = record(3, 10);
        rec.last_award_at = Some(t0());
        let now = t0() + TimeDelta::milliseconds(59_999);

        for gain in [0, 15, 25, 10_000] {
            let outcome = engine.apply(&rec, &wallet(0), enabled(), now, draws(gain));
            assert_eq!(
                outcome,
                Outcome::Skipped(SkipReason::Cooldown {
                    remaining: TimeDelta::milliseconds(1)
                })
            );
        }
    }

    #[test]
    fn cooldown_boundary_is_eligible() {
        let engine = ProgressionEngine::default();
        let mut rec = record(3, 10);
        rec.last_award_at = Some(t0());
        let now = t0() + TimeDelta::seconds(60);
        let outcome = engine.apply(&rec, &wallet(0), enabled(), now, draws(15));
        assert!(!outcome.is_skipped());
    }

    #[test]
    fn future_timestamp_is_cooling_down() {
        let engine = ProgressionEngine::default();
        let mut rec = record(0, 0);
        rec.last_award_at = Some(t0() + TimeDelta::hours(1));
        let outcome = engine.apply(&rec, &wallet(0), enabled(), t0(), draws(15));
        assert!(matches!(
            outcome,
            Outcome::Skipped(SkipReason::Cooldown { .. })
        ));
    }

    #[test]
    fn never_awarded_member_is_eligible() {
        let engine = ProgressionEngine::default();
        assert_eq!(engine.gate(&record(0, 0), enabled(), t0()), None);
    }

    // -----------------------------------------------------------------------
    // Scenarios
    // -----------------------------------------------------------------------

    #[test]
    fn single_roll_over() {
        let engine = ProgressionEngine::default();
        let outcome = engine.apply(&record(0, 95), &wallet(0), enabled(), t0(), draws(10));
        let Outcome::LeveledUp(level_up) = outcome else {
            panic!("expected a level-up");
        };
        assert_eq!(level_up.record.experience, 5);
        assert_eq!(level_up.record.level, 1);
        assert_eq!(level_up.levels_gained, 1);
        assert_eq!(level_up.new_level, 1);
        assert_eq!(level_up.reward, 45);
        assert_eq!(level_up.bonus, 0);
        assert_eq!(level_up.balance.balance, 45);
        assert_eq!(level_up.balance.net_worth, 45);
        assert_eq!(level_up.record.last_award_at, Some(t0()));
    }

    #[test]
    fn reaching_level_ten_pays_decade_bonus() {
        let engine = ProgressionEngine::default();
        let start = record(9, threshold_for(9) - 5);
        let outcome = engine.apply(&start, &wallet(1_000), enabled(), t0(), draws(20));
        let Outcome::LeveledUp(level_up) = outcome else {
            panic!("expected a level-up");
        };
        assert_eq!(level_up.new_level, 10);
        assert_eq!(level_up.bonus, 100);
        assert_eq!(level_up.reward, 50);
        assert_eq!(level_up.total_credit(), 150);
        assert_eq!(level_up.balance.balance, 1_150);
        assert_eq!(level_up.balance.net_worth, 1_150);
    }

    #[test]
    fn reaching_level_hundred_pays_centennial_bonus() {
        let engine = ProgressionEngine::default();
        let start = record(99, threshold_for(99) - 1);
        let outcome = engine.apply(&start, &wallet(0), enabled(), t0(), draws(15));
        let Outcome::LeveledUp(level_up) = outcome else {
            panic!("expected a level-up");
        };
        assert_eq!(level_up.new_level, 100);
        assert_eq!(level_up.bonus, 1_000);
        assert_eq!(level_up.reward, 95);
        assert_eq!(level_up.record.experience, 14);
    }

    #[test]
    fn gain_below_threshold_only_updates() {
        let engine = ProgressionEngine::default();
        let outcome = engine.apply(&record(5, 0), &wallet(300), enabled(), t0(), draws(15));
        assert_eq!(
            outcome,
            Outcome::Updated {
                record: ProgressionRecord {
                    experience: 15,
                    level: 5,
                    last_award_at: Some(t0()),
                }
            }
        );
    }

    #[test]
    fn large_gain_crosses_two_levels() {
        let engine = ProgressionEngine::default();
        // 100 (level 0) + 155 (level 1) = 255; 260 leaves 5 toward level 2.
        let outcome = engine.apply(&record(0, 0), &wallet(0), enabled(), t0(), draws(260));
        let Outcome::LeveledUp(level_up) = outcome else {
            panic!("expected a level-up");
        };
        assert_eq!(level_up.levels_gained, 2);
        assert_eq!(level_up.new_level, 2);
        assert_eq!(level_up.record.experience, 5);
        assert_eq!(level_up.reward, 46);
        assert_eq!(level_up.bonus, 0);
    }

    #[test]
    fn multi_level_bonus_uses_final_level_only() {
        let engine = ProgressionEngine::default();
        // From 8 straight past 9 and 10 to 11: no bonus for passing 10.
        let gain = threshold_for(8) + threshold_for(9) + threshold_for(10);
        let outcome = engine.apply(&record(8, 0), &wallet(0), enabled(), t0(), draws(gain));
        let Outcome::LeveledUp(level_up) = outcome else {
            panic!("expected a level-up");
        };
        assert_eq!(level_up.new_level, 11);
        assert_eq!(level_up.levels_gained, 3);
        assert_eq!(level_up.bonus, 0);
    }

    #[test]
    fn unnormalized_record_rolls_over_on_next_event() {
        let engine = ProgressionEngine::default();
        let granted = ProgressionEngine::grant(&record(0, 0), 1_000);
        assert_eq!(granted.experience, 1_000);
        assert_eq!(granted.level, 0);

        let outcome = engine.apply(&granted, &wallet(0), enabled(), t0(), draws(15));
        let rec = outcome.record().cloned().unwrap_or_default();
        assert!(rec.level >= 4);
        assert!(rec.experience < threshold_for(rec.level));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    #[test]
    fn experience_is_always_normalized() {
        let engine = ProgressionEngine::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut rec = record(0, 0);
        let mut bal = wallet(0);
        let mut now = t0();

        for _ in 0..5_000 {
            now += TimeDelta::seconds(61);
            match engine.process(&rec, &bal, enabled(), now, &mut rng) {
                Outcome::Skipped(reason) => panic!("unexpected skip: {reason:?}"),
                Outcome::Updated { record } => rec = record,
                Outcome::LeveledUp(level_up) => {
                    assert!(level_up.balance.balance > bal.balance);
                    assert!(level_up.new_level > rec.level);
                    rec = level_up.record;
                    bal = level_up.balance;
                }
            }
            assert!(rec.experience < threshold_for(rec.level));
        }
        assert!(rec.level > 10);
        assert_eq!(bal.balance, bal.net_worth);
    }

    #[test]
    fn apply_is_idempotent() {
        let engine = ProgressionEngine::default();
        let rec = record(9, 940);
        let bal = wallet(12);
        let first = engine.apply(&rec, &bal, enabled(), t0(), draws(25));
        let second = engine.apply(&rec, &bal, enabled(), t0(), draws(25));
        assert_eq!(first, second);
    }

    #[test]
    fn seeded_process_is_reproducible() {
        let engine = ProgressionEngine::default();
        let rec = record(2, 200);
        let bal = wallet(0);
        let a = engine.process(&rec, &bal, enabled(), t0(), &mut SmallRng::seed_from_u64(7));
        let b = engine.process(&rec, &bal, enabled(), t0(), &mut SmallRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn rolls_stay_in_configured_ranges() {
        let engine = ProgressionEngine::default();
        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..1_000 {
            let d = engine.roll(&mut rng);
            assert!((15..=25).contains(&d.gain));
            assert!((45..=50).contains(&d.reward_base));
        }
    }

    #[test]
    fn degenerate_ranges_use_lower_bound() {
        let engine = ProgressionEngine::new(ProgressionConfig {
            min_gain: 40,
            max_gain: 10,
            reward_min: 9,
            reward_max: 1,
            ..ProgressionConfig::default()
        });
        let d = engine.roll(&mut SmallRng::seed_from_u64(1));
        assert_eq!(d, Draws { gain: 40, reward_base: 9 });
    }

    // -----------------------------------------------------------------------
    // Patches
    // -----------------------------------------------------------------------

    #[test]
    fn update_patch_leaves_balance_alone() {
        let engine = ProgressionEngine::default();
        let outcome = engine.apply(&record(5, 0), &wallet(300), enabled(), t0(), draws(15));
        let patch = outcome.patch().unwrap_or_default();
        assert_eq!(patch.level, Some(5));
        assert_eq!(patch.experience, Some(15));
        assert_eq!(patch.last_award_at, Some(t0()));
        assert_eq!(patch.balance, None);
        assert_eq!(patch.net_worth, None);
    }

    #[test]
    fn level_up_patch_carries_balance() {
        let engine = ProgressionEngine::default();
        let outcome = engine.apply(&record(0, 95), &wallet(10), enabled(), t0(), draws(10));
        let patch = outcome.patch().unwrap_or_default();
        assert_eq!(patch.level, Some(1));
        assert_eq!(patch.experience, Some(5));
        assert_eq!(patch.balance, Some(55));
        assert_eq!(patch.net_worth, Some(55));
    }

    #[test]
    fn roll_over_without_surplus_is_identity() {
        assert_eq!(roll_over(3, 0), (3, 0));
        assert_eq!(roll_over(0, 99), (0, 99));
        assert_eq!(roll_over(0, 100), (1, 0));
    }

    #[test]
    fn multi_level_jump_charges_each_level_its_own_threshold() {
        // 100 (level 0) + 155 (level 1) + 220 (level 2) + 7 surplus.
        assert_eq!(roll_over(0, 482), (3, 7));
        // One short of clearing level 2 stays at level 2.
        assert_eq!(roll_over(0, 474), (2, 219));
    }
}
