//! In-process store.
//!
//! Holds profiles and settings in maps behind `tokio` locks. Used as the
//! test double for the leveling service. Every saved patch is also appended
//! to a journal so tests can assert exactly which fields were written.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, RwLock};

use popcorn_types::{CommunityId, MemberKey, MemberProfile, ProgressPatch, Settings};

use crate::error::StoreError;
use crate::{MemberStore, SettingsStore};

/// Store that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    members: RwLock<HashMap<MemberKey, MemberProfile>>,
    settings: RwLock<HashMap<CommunityId, Settings>>,
    journal: Mutex<Vec<(MemberKey, ProgressPatch)>>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a member profile.
    pub async fn put_member(&self, key: MemberKey, profile: MemberProfile) {
        self.members.write().await.insert(key, profile);
    }

    /// Insert or replace a community's settings.
    pub async fn put_settings(&self, community: CommunityId, settings: Settings) {
        self.settings.write().await.insert(community, settings);
    }

    /// Current profile of a member, if stored.
    pub async fn member(&self, key: &MemberKey) -> Option<MemberProfile> {
        self.members.read().await.get(key).cloned()
    }

    /// Every patch saved so far, in order.
    pub async fn journal(&self) -> Vec<(MemberKey, ProgressPatch)> {
        self.journal.lock().await.clone()
    }

    /// Make every subsequent save fail (or succeed again).
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl MemberStore for MemoryStore {
    async fn fetch_member(&self, key: &MemberKey) -> Result<MemberProfile, StoreError> {
        self.members
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn save_partial(&self, key: &MemberKey, patch: &ProgressPatch) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Injected("save_partial"));
        }
        {
            let mut members = self.members.write().await;
            let profile = members.entry(key.clone()).or_default();
            patch.apply_to(profile);
        }
        self.journal.lock().await.push((key.clone(), patch.clone()));
        Ok(())
    }
}

impl SettingsStore for MemoryStore {
    async fn fetch_settings(&self, community: &CommunityId) -> Result<Option<Settings>, StoreError> {
        Ok(self.settings.read().await.get(community).copied())
    }
}

#[cfg(test)]
mod tests {
    use popcorn_types::MemberId;

    use super::*;

    fn key() -> MemberKey {
        MemberKey::new(CommunityId::from("1"), MemberId::from("2"))
    }

    #[tokio::test]
    async fn unknown_member_is_not_found() {
        let store = MemoryStore::new();
        let result = store.fetch_member(&key()).await;
        assert!(result.is_err_and(|e| e.is_not_found()));
    }

    #[tokio::test]
    async fn save_partial_upserts_and_journals() {
        let store = MemoryStore::new();
        let mut profile = MemberProfile::default();
        profile.balance.balance = 500;
        store.put_member(key(), profile).await;

        let patch = ProgressPatch {
            level: Some(3),
            experience: Some(12),
            ..ProgressPatch::default()
        };
        assert!(store.save_partial(&key(), &patch).await.is_ok());

        let stored = store.member(&key()).await.unwrap_or_default();
        assert_eq!(stored.progression.level, 3);
        assert_eq!(stored.progression.experience, 12);
        assert_eq!(stored.balance.balance, 500);
        assert_eq!(store.journal().await, vec![(key(), patch)]);
    }

    #[tokio::test]
    async fn injected_failure_writes_nothing() {
        let store = MemoryStore::new();
        store.fail_saves(true);
        let patch = ProgressPatch {
            level: Some(1),
            ..ProgressPatch::default()
        };
        assert!(store.save_partial(&key(), &patch).await.is_err());
        assert!(store.member(&key()).await.is_none());
        assert!(store.journal().await.is_empty());
    }

    #[tokio::test]
    async fn missing_settings_are_none() {
        let store = MemoryStore::new();
        let settings = store.fetch_settings(&CommunityId::from("9")).await;
        assert!(matches!(settings, Ok(None)));

        store
            .put_settings(CommunityId::from("9"), Settings { levels_enabled: true })
            .await;
        let settings = store.fetch_settings(&CommunityId::from("9")).await;
        assert!(matches!(settings, Ok(Some(Settings { levels_enabled: true }))));
    }
}
