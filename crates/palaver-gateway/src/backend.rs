// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the downstream generation backend.
//!
//! One JSON POST per inbound event: the normalized input plus the trimmed
//! conversation window. The call is bounded by a hard timeout; any failure
//! surfaces as [`PalaverError::Backend`] and the caller maps it to the fixed
//! "technical problem" reply rather than dropping the conversation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use palaver_core::{PalaverError, Turn, UserKey};

/// Generation backend HTTP client.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    input: InputPayload<'a>,
    history: &'a [Turn],
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct InputPayload<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    reply: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl BackendClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PalaverError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PalaverError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Produce a reply for the user's input and trimmed history window.
    ///
    /// `input_kind` records how the text was obtained (`text` or `audio`).
    pub async fn generate(
        &self,
        input_kind: &str,
        text: &str,
        history: &[Turn],
        phone: Option<&str>,
        user: &UserKey,
    ) -> Result<String, PalaverError> {
        let request = GenerateRequest {
            input: InputPayload {
                kind: input_kind,
                text,
            },
            history,
            phone,
            user_id: user.as_str(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PalaverError::Backend {
                message: if e.is_timeout() {
                    "backend request timed out".to_string()
                } else {
                    format!("backend unreachable: {e}")
                },
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PalaverError::Backend {
                message: format!("backend returned {status}: {detail}"),
                source: None,
            });
        }

        let body: GenerateResponse = response.json().await.map_err(|e| PalaverError::Backend {
            message: format!("backend reply unparseable: {e}"),
            source: Some(Box::new(e)),
        })?;

        let reply = body
            .reply
            .iter()
            .filter(|part| part.kind == "text")
            .map(|part| part.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        if reply.trim().is_empty() {
            return Err(PalaverError::Backend {
                message: "backend returned no text reply".to_string(),
                source: None,
            });
        }

        debug!(user = %user, chars = reply.chars().count(), "backend reply received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user() -> UserKey {
        UserKey("wa:5491122334455".into())
    }

    #[tokio::test]
    async fn generate_posts_input_and_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(body_string_contains("\"type\":\"text\""))
            .and(body_string_contains("\"text\":\"hola\""))
            .and(body_string_contains("\"user_id\":\"wa:5491122334455\""))
            .and(body_string_contains("\"phone\":\"whatsapp:+5491122334455\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "reply": [{"type": "text", "text": "Buenas! Como puedo ayudarte?"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BackendClient::new(
            format!("{}/generate", server.uri()),
            Duration::from_secs(15),
        )
        .unwrap();
        let history = vec![Turn::user("hola", Some("SM1".into()), None)];
        let reply = client
            .generate(
                "text",
                "hola",
                &history,
                Some("whatsapp:+5491122334455"),
                &user(),
            )
            .await
            .unwrap();

        assert_eq!(reply, "Buenas! Como puedo ayudarte?");
    }

    #[tokio::test]
    async fn multiple_text_parts_join_as_paragraphs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "reply": [
                    {"type": "text", "text": "Primero."},
                    {"type": "action", "text": "ignored"},
                    {"type": "text", "text": "Segundo."}
                ]
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri(), Duration::from_secs(15)).unwrap();
        let reply = client.generate("text", "hola", &[], None, &user()).await.unwrap();
        assert_eq!(reply, "Primero.\n\nSegundo.");
    }

    #[tokio::test]
    async fn server_error_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri(), Duration::from_secs(15)).unwrap();
        let err = client
            .generate("text", "hola", &[], None, &user())
            .await
            .unwrap_err();
        assert!(matches!(err, PalaverError::Backend { .. }));
    }

    #[tokio::test]
    async fn empty_reply_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"reply": []})),
            )
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri(), Duration::from_secs(15)).unwrap();
        assert!(client.generate("text", "hola", &[], None, &user()).await.is_err());
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"reply": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri(), Duration::from_millis(50)).unwrap();
        let err = client
            .generate("text", "hola", &[], None, &user())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
