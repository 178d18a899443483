//! Leveling service: one activity event from intake to announcement.
//!
//! For each event the service:
//! 1. Serializes on the member, so two events for the same member never
//!    interleave their read-modify-write against the API service.
//! 2. Fetches the community settings. Missing settings mean leveling is off.
//! 3. Fetches the member profile. An unknown member starts from defaults.
//! 4. Runs the progression engine.
//! 5. Saves only the fields the engine changed.
//! 6. On level-up, renders and sends exactly one announcement, and only
//!    after the save succeeded.
//!
//! Owner grants (`givexp`) take the same member lock, apply only to
//! members with an existing record, and reply in the command's channel.
//!
//! Nothing is retried here. A failed save surfaces as [`BotError::Store`]
//! and the computed state is dropped.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use popcorn_progression::{Draws, Outcome, ProgressionEngine, SkipReason};
use popcorn_store::{MemberStore, SettingsStore, StoreError};
use popcorn_types::{
    ActivityEvent, Announcement, ExperienceGrant, MemberKey, MemberProfile, ProgressPatch,
    ProgressionRecord,
};

use crate::announce::{Announcer, GRANT_UNKNOWN_MEMBER, grant_applied};
use crate::error::BotError;

/// Delivers rendered announcements to a channel.
pub trait NotificationSink: Send + Sync {
    /// Send one announcement.
    fn send(&self, announcement: &Announcement)
    -> impl Future<Output = Result<(), BotError>> + Send;
}

// ---------------------------------------------------------------------------
// Per-member locks
// ---------------------------------------------------------------------------

/// One async mutex per member, created on demand and dropped when idle.
#[derive(Debug, Default)]
pub struct MemberLocks {
    locks: Mutex<HashMap<MemberKey, Arc<Mutex<()>>>>,
}

impl MemberLocks {
    /// Wait until no other task holds `key`, then hold it.
    pub async fn acquire(&self, key: &MemberKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Release `key` and forget its mutex if nobody else is waiting on it.
    pub async fn release(&self, key: &MemberKey, guard: OwnedMutexGuard<()>) {
        drop(guard);
        let mut locks = self.locks.lock().await;
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }

    /// Number of members with a live lock entry.
    #[cfg(test)]
    pub async fn active(&self) -> usize {
        self.locks.lock().await.len()
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Runs the progression engine against a store and announces level-ups.
///
/// `S` is both the member and the settings store; `N` receives the
/// announcements. Both are injected so tests can use in-memory doubles.
#[derive(Debug)]
pub struct LevelingService<S, N> {
    store: S,
    sink: N,
    engine: ProgressionEngine,
    announcer: Announcer,
    locks: MemberLocks,
}

impl<S, N> LevelingService<S, N>
where
    S: MemberStore + SettingsStore,
    N: NotificationSink,
{
    /// Create a service from its collaborators.
    pub fn new(store: S, sink: N, engine: ProgressionEngine, announcer: Announcer) -> Self {
        Self {
            store,
            sink,
            engine,
            announcer,
            locks: MemberLocks::default(),
        }
    }

    /// The progression engine, for drawing [`Draws`] before dispatch.
    pub const fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    /// The backing store.
    #[cfg(test)]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Process one activity event with pre-drawn randomness.
    ///
    /// The event's `occurred_at` is the processing time used for the
    /// cooldown gate and stamped on the record.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Store`] if a fetch or the save fails (no
    /// announcement is sent), or [`BotError::Template`] / [`BotError::Nats`]
    /// if the announcement could not be rendered or delivered after a
    /// successful save.
    pub async fn handle_activity(
        &self,
        event: &ActivityEvent,
        draws: Draws,
    ) -> Result<Outcome, BotError> {
        let key = event.member_key();
        let guard = self.locks.acquire(&key).await;
        let result = self.process_activity(&key, event, draws).await;
        self.locks.release(&key, guard).await;
        result
    }

    async fn process_activity(
        &self,
        key: &MemberKey,
        event: &ActivityEvent,
        draws: Draws,
    ) -> Result<Outcome, BotError> {
        let settings = self
            .store
            .fetch_settings(&key.community)
            .await?
            .unwrap_or_default();
        if !settings.levels_enabled {
            debug!(member = %key, "leveling disabled for community");
            return Ok(Outcome::Skipped(SkipReason::LevelsDisabled));
        }

        let profile = self.fetch_or_default(key).await?;
        let outcome = self.engine.apply(
            &profile.progression,
            &profile.balance,
            settings,
            event.occurred_at,
            draws,
        );

        let Some(patch) = outcome.patch() else {
            debug!(member = %key, event_id = %event.event_id, ?outcome, "event skipped");
            return Ok(outcome);
        };
        self.store.save_partial(key, &patch).await?;

        if let Outcome::LeveledUp(level_up) = &outcome {
            info!(
                member = %key,
                event_id = %event.event_id,
                level = level_up.new_level,
                levels_gained = level_up.levels_gained,
                reward = level_up.reward,
                bonus = level_up.bonus,
                "member leveled up"
            );
            let text = self.announcer.level_up(&event.display_name, level_up)?;
            self.sink
                .send(&Announcement {
                    channel_id: event.channel_id.clone(),
                    member_id: event.member_id.clone(),
                    text,
                })
                .await?;
        } else {
            debug!(
                member = %key,
                event_id = %event.event_id,
                experience = outcome.record().map(|r| r.experience),
                "experience granted"
            );
        }

        Ok(outcome)
    }

    /// Add raw experience for the owner-only `givexp` command.
    ///
    /// Only members that already have a record can receive a grant. Saves
    /// only the experience field, then replies in the command's channel.
    /// Returns the record as persisted.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Store`] with [`StoreError::NotFound`] for an
    /// unknown member (nothing is saved, the owner is told), or if the fetch
    /// or the save fails. Returns [`BotError::Nats`] if the reply fails.
    pub async fn handle_grant(&self, grant: &ExperienceGrant) -> Result<ProgressionRecord, BotError> {
        let key = grant.member_key();
        let guard = self.locks.acquire(&key).await;
        let result = self.process_grant(&key, grant).await;
        self.locks.release(&key, guard).await;
        result
    }

    async fn process_grant(
        &self,
        key: &MemberKey,
        grant: &ExperienceGrant,
    ) -> Result<ProgressionRecord, BotError> {
        let profile = match self.store.fetch_member(key).await {
            Ok(profile) => profile,
            Err(e) if e.is_not_found() => {
                info!(
                    member = %key,
                    requested_by = %grant.requested_by,
                    "grant refused, member has no record"
                );
                self.reply(grant, GRANT_UNKNOWN_MEMBER.to_owned()).await?;
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        let record = ProgressionEngine::grant(&profile.progression, grant.amount);
        let patch = ProgressPatch {
            experience: Some(record.experience),
            ..ProgressPatch::default()
        };
        self.store.save_partial(key, &patch).await?;
        info!(
            member = %key,
            amount = grant.amount,
            requested_by = %grant.requested_by,
            experience = record.experience,
            "experience granted by owner"
        );
        self.reply(
            grant,
            grant_applied(&grant.member_id, grant.amount, record.experience),
        )
        .await?;
        Ok(record)
    }

    async fn reply(&self, grant: &ExperienceGrant, text: String) -> Result<(), BotError> {
        self.sink
            .send(&Announcement {
                channel_id: grant.channel_id.clone(),
                member_id: grant.requested_by.clone(),
                text,
            })
            .await
    }

    async fn fetch_or_default(&self, key: &MemberKey) -> Result<MemberProfile, StoreError> {
        match self.store.fetch_member(key).await {
            Ok(profile) => Ok(profile),
            Err(e) if e.is_not_found() => {
                debug!(member = %key, "new member, starting from defaults");
                Ok(MemberProfile::default())
            }
            Err(e) => Err(e),
        }
    }
}
