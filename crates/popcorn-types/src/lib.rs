//! Shared type definitions for the Popcorn leveling bot.
//!
//! This crate is the single source of truth for the records exchanged with
//! the API service and the gateway. Types flow to `TypeScript` via `ts-rs`
//! so the API service and the gateway share the exact same shapes.
//!
//! # Modules
//!
//! - [`ids`] -- Snowflake and event identifiers
//! - [`records`] -- Progression, balance, settings, and partial updates
//! - [`events`] -- Message-bus payloads (activity, grants, announcements)

pub mod events;
pub mod ids;
pub mod records;

// Re-export all public types at crate root for convenience.
pub use events::{ActivityEvent, Announcement, ExperienceGrant};
pub use ids::{ChannelId, CommunityId, EventId, MemberId, MemberKey};
pub use records::{BalanceRecord, MemberProfile, ProgressPatch, ProgressionRecord, Settings};
