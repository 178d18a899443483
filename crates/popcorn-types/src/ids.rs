//! Type-safe identifier wrappers.
//!
//! Chat-platform identifiers (communities, members, channels) are snowflakes
//! that the gateway and the API service exchange as decimal strings, so they
//! are wrapped around [`String`] rather than parsed into integers. Events
//! produced by the gateway carry a UUID v7 [`EventId`] for log correlation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around a string snowflake with standard derives.
macro_rules! define_snowflake {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from its string form.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_snowflake! {
    /// Identifier of a community (guild) the bot is a member of.
    CommunityId
}

define_snowflake! {
    /// Identifier of a community member (user).
    MemberId
}

define_snowflake! {
    /// Identifier of a text channel notifications are delivered to.
    ChannelId
}

/// Unique identifier for an activity event published by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventId(pub Uuid);

impl EventId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key used to address one member's records inside one community.
///
/// Progression and balances are tracked per member per community, so every
/// store lookup and every per-member lock is keyed on the pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberKey {
    /// The community the member belongs to.
    pub community: CommunityId,
    /// The member within that community.
    pub member: MemberId,
}

impl MemberKey {
    /// Build a key from a community and member id.
    pub const fn new(community: CommunityId, member: MemberId) -> Self {
        Self { community, member }
    }
}

impl core::fmt::Display for MemberKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.community, self.member)
    }
}
