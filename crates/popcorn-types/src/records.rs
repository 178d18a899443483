//! Persisted member records and community settings.
//!
//! Field names on the wire follow the API service's JSON (`xp`, `netWorth`,
//! `levelsEnabled`, ...), while the Rust names describe what the values mean.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Progression
// ---------------------------------------------------------------------------

/// Experience and level state of one member in one community.
///
/// A member never seen before has the [`Default`] record: level 0, no
/// experience, never awarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ProgressionRecord {
    /// Experience accumulated toward the next level.
    #[serde(rename = "xp", default)]
    pub experience: u64,
    /// Current level, starting at 0.
    #[serde(default)]
    pub level: u32,
    /// When experience was last granted. Drives the cooldown gate.
    #[serde(rename = "timestamp", default)]
    pub last_award_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Balance
// ---------------------------------------------------------------------------

/// Currency state of one member in one community.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct BalanceRecord {
    /// Spendable credits.
    #[serde(default)]
    pub balance: i64,
    /// Lifetime credits, moved in lockstep with rewards.
    #[serde(default)]
    pub net_worth: i64,
    /// Last dailies claim. Owned by the dailies command, never written here.
    #[serde(default)]
    pub date_last_claimed_dailies: Option<DateTime<Utc>>,
}

impl BalanceRecord {
    /// Credit `amount` to both the balance and the net worth.
    ///
    /// Saturates at [`i64::MAX`] rather than wrapping.
    pub const fn credit(&mut self, amount: i64) {
        self.balance = self.balance.saturating_add(amount);
        self.net_worth = self.net_worth.saturating_add(amount);
    }
}

/// Everything the API service returns for a member of a community.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MemberProfile {
    /// Leveling state.
    #[serde(rename = "level", default)]
    pub progression: ProgressionRecord,
    /// Currency state.
    #[serde(default)]
    pub balance: BalanceRecord,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Per-community settings relevant to leveling.
///
/// Defaults to leveling disabled, so a community with missing or partial
/// settings never starts granting experience by accident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Settings {
    /// Whether members of this community earn experience at all.
    #[serde(default)]
    pub levels_enabled: bool,
}

// ---------------------------------------------------------------------------
// Partial update
// ---------------------------------------------------------------------------

/// Partial update sent to the API service.
///
/// Only fields that are `Some` are serialized, so fields maintained by other
/// subsystems (dailies, shop purchases) are never overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ProgressPatch {
    /// New level.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[ts(optional)]
    pub level: Option<u32>,
    /// New experience toward the next level.
    #[serde(rename = "xp", skip_serializing_if = "Option::is_none", default)]
    #[ts(optional)]
    pub experience: Option<u64>,
    /// New cooldown timestamp.
    #[serde(rename = "timestamp", skip_serializing_if = "Option::is_none", default)]
    #[ts(optional)]
    pub last_award_at: Option<DateTime<Utc>>,
    /// New spendable balance.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[ts(optional)]
    pub balance: Option<i64>,
    /// New net worth.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    #[ts(optional)]
    pub net_worth: Option<i64>,
}

impl ProgressPatch {
    /// Returns `true` if the patch carries no changes.
    pub const fn is_empty(&self) -> bool {
        self.level.is_none()
            && self.experience.is_none()
            && self.last_award_at.is_none()
            && self.balance.is_none()
            && self.net_worth.is_none()
    }

    /// Apply the patch onto a profile, leaving absent fields untouched.
    pub fn apply_to(&self, profile: &mut MemberProfile) {
        if let Some(level) = self.level {
            profile.progression.level = level;
        }
        if let Some(experience) = self.experience {
            profile.progression.experience = experience;
        }
        if let Some(at) = self.last_award_at {
            profile.progression.last_award_at = Some(at);
        }
        if let Some(balance) = self.balance {
            profile.balance.balance = balance;
        }
        if let Some(net_worth) = self.net_worth {
            profile.balance.net_worth = net_worth;
        }
    }
}
