//! Remote API service store.
//!
//! The API service owns the database. The bot reads and patches member
//! records over plain JSON HTTP:
//!
//! | Method | Route | Body |
//! |--------|-------|------|
//! | `GET` | `/guilds/{community}/users/{member}` | -> [`MemberProfile`] |
//! | `PATCH` | `/guilds/{community}/users/{member}` | [`ProgressPatch`] |
//! | `GET` | `/guilds/{community}/settings` | -> [`Settings`] |
//!
//! A `404` maps to [`StoreError::NotFound`] for members and to `None` for
//! settings. No request is retried here; retry policy belongs to the caller.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use popcorn_types::{CommunityId, MemberKey, MemberProfile, ProgressPatch, Settings};

use crate::error::StoreError;
use crate::{MemberStore, SettingsStore};

/// Connection settings for the API service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, without trailing slash (e.g. `http://api:3000`).
    pub base_url: String,
    /// Bearer token sent with every request, if set.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Store backed by the remote API service.
#[derive(Debug, Clone)]
pub struct ApiStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiStore {
    /// Build a client for the API service.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the base URL is empty or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, StoreError> {
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(StoreError::Config("API base URL is empty".to_owned()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    /// Route of a member record.
    pub fn member_route(key: &MemberKey) -> String {
        format!("/guilds/{}/users/{}", key.community, key.member)
    }

    /// Route of a community's settings.
    pub fn settings_route(community: &CommunityId) -> String {
        format!("/guilds/{community}/settings")
    }

    fn url(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, route: &str, request: RequestBuilder) -> Result<Response, StoreError> {
        self.authorize(request)
            .send()
            .await
            .map_err(|source| StoreError::Http {
                route: route.to_owned(),
                source,
            })
    }

    /// GET `route` and decode the JSON body. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<Option<T>, StoreError> {
        let response = self.send(route, self.client.get(self.url(route))).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = read_body(route, response).await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                route: route.to_owned(),
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                route: route.to_owned(),
                source,
            })
    }
}

async fn read_body(route: &str, response: Response) -> Result<String, StoreError> {
    response.text().await.map_err(|source| StoreError::Http {
        route: route.to_owned(),
        source,
    })
}

impl MemberStore for ApiStore {
    async fn fetch_member(&self, key: &MemberKey) -> Result<MemberProfile, StoreError> {
        let route = Self::member_route(key);
        debug!(route = route, "fetching member profile");
        self.get_json(&route)
            .await?
            .ok_or(StoreError::NotFound(route))
    }

    async fn save_partial(&self, key: &MemberKey, patch: &ProgressPatch) -> Result<(), StoreError> {
        let route = Self::member_route(key);
        if patch.is_empty() {
            debug!(route = route, "empty patch, nothing to save");
            return Ok(());
        }
        debug!(route = route, ?patch, "saving partial member update");
        let request = self.client.patch(self.url(&route)).json(patch);
        let response = self.send(&route, request).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(route));
        }
        if !status.is_success() {
            let body = read_body(&route, response)
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(StoreError::Status {
                route,
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl SettingsStore for ApiStore {
    async fn fetch_settings(&self, community: &CommunityId) -> Result<Option<Settings>, StoreError> {
        let route = Self::settings_route(community);
        debug!(route = route, "fetching community settings");
        self.get_json(&route).await
    }
}
