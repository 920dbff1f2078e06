// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated media download from the originating provider.
//!
//! Twilio media comes from a direct URL behind basic auth. Cloud media is a
//! two-step fetch: resolve the media id through the Graph API to a short-lived
//! download URL, then fetch the bytes with the same bearer token. Network
//! failures are retried at most once inline with no backoff.

use std::time::Duration;

use palaver_core::PalaverError;
use palaver_resilience::retry_once;
use palaver_wire::{MediaDescriptor, MediaLocator};
use serde::Deserialize;
use tracing::debug;

/// Credentials and endpoints for provider media fetches.
#[derive(Debug, Clone, Default)]
pub struct FetchAuth {
    /// Twilio basic-auth pair.
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    /// Cloud bearer token.
    pub cloud_access_token: Option<String>,
    /// Graph API base for media id resolution.
    pub graph_base: String,
}

/// Downloads inbound media bytes from either provider.
#[derive(Debug, Clone)]
pub struct MediaFetcher {
    client: reqwest::Client,
    auth: FetchAuth,
}

/// Graph API media-id lookup response; only the URL is consumed.
#[derive(Debug, Deserialize)]
struct GraphMediaLookup {
    url: String,
}

impl MediaFetcher {
    pub fn new(auth: FetchAuth) -> Result<Self, PalaverError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PalaverError::channel("failed to build HTTP client", e))?;
        Ok(Self { client, auth })
    }

    /// Download the bytes for one media descriptor.
    pub async fn fetch(&self, descriptor: &MediaDescriptor) -> Result<Vec<u8>, PalaverError> {
        match &descriptor.locator {
            MediaLocator::Url(url) => retry_once(|| self.fetch_twilio(url)).await,
            MediaLocator::ProviderId(id) => {
                let url = retry_once(|| self.resolve_cloud_url(id)).await?;
                retry_once(|| self.fetch_cloud(&url)).await
            }
        }
    }

    async fn fetch_twilio(&self, url: &str) -> Result<Vec<u8>, PalaverError> {
        let mut request = self.client.get(url);
        if let (Some(sid), Some(token)) = (
            self.auth.twilio_account_sid.as_deref(),
            self.auth.twilio_auth_token.as_deref(),
        ) {
            request = request.basic_auth(sid, Some(token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PalaverError::channel("media download failed", e))?
            .error_for_status()
            .map_err(|e| PalaverError::channel("media download rejected", e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PalaverError::channel("media body read failed", e))?;
        debug!(size = bytes.len(), "downloaded media");
        Ok(bytes.to_vec())
    }

    /// Resolve a Cloud media id to its short-lived download URL.
    async fn resolve_cloud_url(&self, media_id: &str) -> Result<String, PalaverError> {
        let url = format!("{}/{media_id}", self.auth.graph_base);
        let response = self
            .bearer(self.client.get(&url))
            .send()
            .await
            .map_err(|e| PalaverError::channel("media id lookup failed", e))?
            .error_for_status()
            .map_err(|e| PalaverError::channel("media id lookup rejected", e))?;

        let lookup: GraphMediaLookup = response
            .json()
            .await
            .map_err(|e| PalaverError::channel("media id lookup body unparseable", e))?;
        Ok(lookup.url)
    }

    async fn fetch_cloud(&self, url: &str) -> Result<Vec<u8>, PalaverError> {
        let response = self
            .bearer(self.client.get(url))
            .send()
            .await
            .map_err(|e| PalaverError::channel("media download failed", e))?
            .error_for_status()
            .map_err(|e| PalaverError::channel("media download rejected", e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PalaverError::channel("media body read failed", e))?;
        debug!(size = bytes.len(), "downloaded media");
        Ok(bytes.to_vec())
    }

    fn bearer(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth.cloud_access_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}
