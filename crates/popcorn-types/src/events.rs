//! Message-bus payloads exchanged with the gateway.
//!
//! The gateway owns the chat-platform connection. It publishes an
//! [`ActivityEvent`] for every qualifying message and an [`ExperienceGrant`]
//! for the owner-only `givexp` command, and delivers every [`Announcement`]
//! the bot publishes back to the named channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{ChannelId, CommunityId, EventId, MemberId, MemberKey};

/// A qualifying message sent by a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActivityEvent {
    /// Gateway-assigned event identifier.
    pub event_id: EventId,
    /// Community the message was sent in.
    pub community_id: CommunityId,
    /// Author of the message.
    pub member_id: MemberId,
    /// Author's display name in that community, used in announcements.
    pub display_name: String,
    /// Channel the message was sent in; announcements go back here.
    pub channel_id: ChannelId,
    /// When the gateway observed the message.
    pub occurred_at: DateTime<Utc>,
}

impl ActivityEvent {
    /// The member this event is attributed to.
    pub fn member_key(&self) -> MemberKey {
        MemberKey::new(self.community_id.clone(), self.member_id.clone())
    }
}

/// Raw experience granted by a bot owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ExperienceGrant {
    /// Community the grant applies to.
    pub community_id: CommunityId,
    /// Member receiving the experience.
    pub member_id: MemberId,
    /// Experience to add.
    pub amount: u64,
    /// Owner who issued the command; the reply mentions them.
    pub requested_by: MemberId,
    /// Channel the command was issued in, where the reply is posted.
    pub channel_id: ChannelId,
}

impl ExperienceGrant {
    /// The member this grant is attributed to.
    pub fn member_key(&self) -> MemberKey {
        MemberKey::new(self.community_id.clone(), self.member_id.clone())
    }
}

/// A rendered text message to post in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Announcement {
    /// Destination channel.
    pub channel_id: ChannelId,
    /// Member the announcement is about.
    pub member_id: MemberId,
    /// Markdown text.
    pub text: String,
}
