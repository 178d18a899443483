//! Member and settings stores for the Popcorn leveling bot.
//!
//! The bot never talks to a database directly. Member records and community
//! settings live behind the API service, reached through the two contracts
//! defined here:
//!
//! - [`MemberStore`] -- fetch a member profile, save a partial update
//! - [`SettingsStore`] -- fetch a community's settings
//!
//! # Implementations
//!
//! - [`api`] -- [`ApiStore`], JSON over HTTP via `reqwest`
//! - [`memory`] -- [`MemoryStore`], maps behind `tokio` locks
//!
//! Both are used through static dispatch: the leveling service is generic
//! over its stores, so test doubles slot in without trait objects. The
//! returned futures are `Send` so the service can run on spawned tasks.

pub mod api;
pub mod error;
pub mod memory;

use std::future::Future;

use popcorn_types::{CommunityId, MemberKey, MemberProfile, ProgressPatch, Settings};

pub use api::{ApiConfig, ApiStore};
pub use error::StoreError;
pub use memory::MemoryStore;

/// Read and partially update member records.
pub trait MemberStore: Send + Sync {
    /// Fetch the profile of a member in a community.
    ///
    /// Returns [`StoreError::NotFound`] for a member with no record yet.
    fn fetch_member(
        &self,
        key: &MemberKey,
    ) -> impl Future<Output = Result<MemberProfile, StoreError>> + Send;

    /// Write only the fields present in `patch`.
    fn save_partial(
        &self,
        key: &MemberKey,
        patch: &ProgressPatch,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Read community settings.
pub trait SettingsStore: Send + Sync {
    /// Fetch a community's settings, `None` if it has none.
    fn fetch_settings(
        &self,
        community: &CommunityId,
    ) -> impl Future<Output = Result<Option<Settings>, StoreError>> + Send;
}
