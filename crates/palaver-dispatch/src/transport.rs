// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider-specific outbound send transports.
//!
//! Twilio takes a form-encoded POST behind basic auth; the Cloud API takes a
//! JSON POST behind a bearer token. Both deliver exactly one fragment per
//! request.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use palaver_core::PalaverError;

/// One provider's fragment delivery API.
#[async_trait]
pub trait ReplyTransport: Send + Sync {
    /// Deliver a single fragment to the destination.
    async fn send_fragment(&self, to: &str, body: &str) -> Result<(), PalaverError>;
}

fn http_client() -> Result<reqwest::Client, PalaverError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| PalaverError::channel("failed to build HTTP client", e))
}

/// Sends fragments through the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct TwilioSender {
    client: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSender {
    pub fn new(
        api_base: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Result<Self, PalaverError> {
        Ok(Self {
            client: http_client()?,
            api_base: api_base.into(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
        })
    }
}

#[async_trait]
impl ReplyTransport for TwilioSender {
    async fn send_fragment(&self, to: &str, body: &str) -> Result<(), PalaverError> {
        let url = format!("{}/Accounts/{}/Messages.json", self.api_base, self.account_sid);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("From", self.from_number.as_str()), ("To", to), ("Body", body)])
            .send()
            .await
            .map_err(|e| PalaverError::channel("twilio send failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PalaverError::Channel {
                message: format!("twilio send returned {status}: {detail}"),
                source: None,
            });
        }
        debug!(to, chars = body.chars().count(), "twilio fragment sent");
        Ok(())
    }
}

/// Sends fragments through the Cloud (Graph) messages API.
#[derive(Debug, Clone)]
pub struct CloudSender {
    client: reqwest::Client,
    graph_base: String,
    phone_number_id: String,
    access_token: String,
}

impl CloudSender {
    pub fn new(
        graph_base: impl Into<String>,
        phone_number_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, PalaverError> {
        Ok(Self {
            client: http_client()?,
            graph_base: graph_base.into(),
            phone_number_id: phone_number_id.into(),
            access_token: access_token.into(),
        })
    }
}

#[async_trait]
impl ReplyTransport for CloudSender {
    async fn send_fragment(&self, to: &str, body: &str) -> Result<(), PalaverError> {
        let url = format!("{}/{}/messages", self.graph_base, self.phone_number_id);
        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": {"body": body},
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PalaverError::channel("cloud send failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PalaverError::Channel {
                message: format!("cloud send returned {status}: {detail}"),
                source: None,
            });
        }
        debug!(to, chars = body.chars().count(), "cloud fragment sent");
        Ok(())
    }
}
