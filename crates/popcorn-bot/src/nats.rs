//! NATS pub/sub integration for activity intake and announcements.
//!
//! The gateway publishes activity on `popcorn.activity.{community}` and
//! owner grants on `popcorn.grant.{community}`. The bot publishes rendered
//! level-up messages on `popcorn.notify.{channel}` for the gateway to post.

use popcorn_types::{ActivityEvent, Announcement, ExperienceGrant};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::BotError;
use crate::leveling::NotificationSink;

/// Subject pattern for activity events, all communities.
pub const ACTIVITY_SUBJECT: &str = "popcorn.activity.*";

/// Subject pattern for owner experience grants, all communities.
pub const GRANT_SUBJECT: &str = "popcorn.grant.*";

/// Prefix of the per-channel announcement subjects.
pub const NOTIFY_PREFIX: &str = "popcorn.notify";

/// NATS client wrapper for the bot.
///
/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct NatsClient {
    client: async_nats::Client,
}

impl NatsClient {
    /// Connect to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Nats`] if the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self, BotError> {
        info!(url = url, "connecting to NATS server");
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BotError::Nats(format!("failed to connect to {url}: {e}")))?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Subscribe to `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Nats`] if the subscription fails.
    pub async fn subscribe(&self, subject: &str) -> Result<async_nats::Subscriber, BotError> {
        debug!(subject = subject, "subscribing");
        let subscriber = self
            .client
            .subscribe(subject.to_owned())
            .await
            .map_err(|e| BotError::Nats(format!("failed to subscribe to {subject}: {e}")))?;
        info!(subject = subject, "subscribed");
        Ok(subscriber)
    }

    /// Subject an announcement for `channel` is published on.
    pub fn notify_subject(announcement: &Announcement) -> String {
        format!("{NOTIFY_PREFIX}.{}", announcement.channel_id)
    }

    /// Deserialize an activity payload.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Parse`] if deserialization fails.
    pub fn deserialize_activity(data: &[u8]) -> Result<ActivityEvent, BotError> {
        deserialize(data, "activity event")
    }

    /// Deserialize a grant payload.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Parse`] if deserialization fails.
    pub fn deserialize_grant(data: &[u8]) -> Result<ExperienceGrant, BotError> {
        deserialize(data, "experience grant")
    }

    /// Extract the community segment of an intake subject.
    ///
    /// Subject format: `popcorn.{kind}.{community}`. Returns `None` if the
    /// subject does not match.
    pub fn community_from_subject(subject: &str) -> Option<&str> {
        let mut parts = subject.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("popcorn"), Some(_), Some(community), None) if !community.is_empty() => {
                Some(community)
            }
            _ => None,
        }
    }
}

fn deserialize<T: DeserializeOwned>(data: &[u8], what: &str) -> Result<T, BotError> {
    serde_json::from_slice(data)
        .map_err(|e| BotError::Parse(format!("failed to deserialize {what}: {e}")))
}

impl NotificationSink for NatsClient {
    async fn send(&self, announcement: &Announcement) -> Result<(), BotError> {
        let subject = Self::notify_subject(announcement);
        let payload = serde_json::to_vec(announcement)
            .map_err(|e| BotError::Nats(format!("failed to serialize announcement: {e}")))?;
        debug!(
            subject = subject,
            member_id = %announcement.member_id,
            "publishing announcement"
        );
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| BotError::Nats(format!("failed to publish to {subject}: {e}")))
    }
}

impl std::fmt::Debug for NatsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsClient")
            .field("connected", &true)
            .finish()
    }
}
