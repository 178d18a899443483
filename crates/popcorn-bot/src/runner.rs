//! Intake loop: bus messages in, leveling tasks out.
//!
//! Activity and grant messages are read from their subscriptions in one
//! `select!` loop. Each message is parsed, checked against the community
//! named in its subject, and handed to the [`LevelingService`] on its own
//! task. A semaphore caps how many tasks run at once; when the cap is hit
//! the loop waits instead of buffering more work.
//!
//! Randomness is drawn on the loop before the task is spawned, so the
//! task itself is deterministic given its [`Draws`].

use std::sync::Arc;

use futures::{Stream, StreamExt};
use popcorn_progression::Draws;
use popcorn_store::{MemberStore, SettingsStore};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::BotError;
use crate::leveling::{LevelingService, NotificationSink};
use crate::nats::NatsClient;

/// Upper bound on the configured concurrency.
const MAX_PERMITS: usize = 1 << 16;

/// Dispatches bus messages to the leveling service.
#[derive(Debug)]
pub struct IntakeRunner<S, N> {
    service: Arc<LevelingService<S, N>>,
    permits: Arc<Semaphore>,
    max_in_flight: u32,
}

impl<S, N> IntakeRunner<S, N>
where
    S: MemberStore + SettingsStore + 'static,
    N: NotificationSink + 'static,
{
    /// Create a runner allowing at most `max_in_flight` concurrent tasks.
    pub fn new(service: LevelingService<S, N>, max_in_flight: usize) -> Self {
        let limit = max_in_flight.clamp(1, MAX_PERMITS);
        Self {
            service: Arc::new(service),
            permits: Arc::new(Semaphore::new(limit)),
            max_in_flight: u32::try_from(limit).unwrap_or(u32::MAX),
        }
    }

    /// Read both subscriptions until they end, then wait for in-flight work.
    pub async fn run<A, G>(&self, mut activity: A, mut grants: G)
    where
        A: Stream<Item = async_nats::Message> + Unpin,
        G: Stream<Item = async_nats::Message> + Unpin,
    {
        info!(
            max_in_flight = self.max_in_flight,
            "intake runner started, awaiting activity"
        );
        let mut activity_open = true;
        let mut grants_open = true;

        while activity_open || grants_open {
            tokio::select! {
                message = activity.next(), if activity_open => match message {
                    Some(message) => {
                        self.dispatch_activity(message.subject.as_str(), &message.payload).await;
                    }
                    None => {
                        info!("activity subscription ended");
                        activity_open = false;
                    }
                },
                message = grants.next(), if grants_open => match message {
                    Some(message) => {
                        self.dispatch_grant(message.subject.as_str(), &message.payload).await;
                    }
                    None => {
                        info!("grant subscription ended");
                        grants_open = false;
                    }
                },
            }
        }

        self.drain().await;
    }

    /// Wait until every spawned task has finished.
    pub async fn drain(&self) {
        debug!("waiting for in-flight events");
        match self.permits.acquire_many(self.max_in_flight).await {
            Ok(_all) => info!("all in-flight events finished"),
            Err(e) => warn!(error = %e, "semaphore closed while draining"),
        }
    }

    /// Parse an activity message and process it on a new task.
    ///
    /// Returns the task handle, or `None` if the message was dropped.
    pub async fn dispatch_activity(&self, subject: &str, payload: &[u8]) -> Option<JoinHandle<()>> {
        let event = match NatsClient::deserialize_activity(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(subject = subject, error = %e, "dropping malformed activity");
                return None;
            }
        };
        if !subject_matches(subject, event.community_id.as_str()) {
            warn!(
                subject = subject,
                community_id = %event.community_id,
                "activity community does not match subject, dropping"
            );
            return None;
        }

        let draws: Draws = self.service.engine().roll(&mut rand::rng());
        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                warn!(error = %e, "intake closed, dropping activity");
                return None;
            }
        };

        let service = Arc::clone(&self.service);
        Some(tokio::spawn(async move {
            if let Err(e) = service.handle_activity(&event, draws).await {
                log_failure("activity", &event.member_key().to_string(), &e);
            }
            drop(permit);
        }))
    }

    /// Parse a grant message and process it on a new task.
    ///
    /// Returns the task handle, or `None` if the message was dropped.
    pub async fn dispatch_grant(&self, subject: &str, payload: &[u8]) -> Option<JoinHandle<()>> {
        let grant = match NatsClient::deserialize_grant(payload) {
            Ok(grant) => grant,
            Err(e) => {
                warn!(subject = subject, error = %e, "dropping malformed grant");
                return None;
            }
        };
        if !subject_matches(subject, grant.community_id.as_str()) {
            warn!(
                subject = subject,
                community_id = %grant.community_id,
                "grant community does not match subject, dropping"
            );
            return None;
        }

        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                warn!(error = %e, "intake closed, dropping grant");
                return None;
            }
        };

        let service = Arc::clone(&self.service);
        Some(tokio::spawn(async move {
            if let Err(e) = service.handle_grant(&grant).await {
                log_failure("grant", &grant.member_key().to_string(), &e);
            }
            drop(permit);
        }))
    }
}

fn subject_matches(subject: &str, community: &str) -> bool {
    NatsClient::community_from_subject(subject) == Some(community)
}

fn log_failure(kind: &str, member: &str, error: &BotError) {
    match error {
        BotError::Store(e) => {
            warn!(kind = kind, member = member, error = %e, "store call failed, event dropped");
        }
        other => {
            warn!(kind = kind, member = member, error = %other, "event processing failed");
        }
    }
}
