// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Palaver workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Canonical key addressing one conversation session regardless of the
/// originating channel.
///
/// Produced by the identity resolver as `wa:` plus the digits-only phone
/// number. Requests with no recoverable identity collapse onto the [`ANON`]
/// sentinel; sessions under that key are best-effort only (no dedup, no
/// reliable backup linkage) since unrelated requests may collide on it.
///
/// [`ANON`]: UserKey::anon
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserKey(pub String);

impl UserKey {
    /// Sentinel key for requests whose sender could not be identified.
    pub fn anon() -> Self {
        UserKey("anon".to_string())
    }

    /// Whether this is the anonymous sentinel.
    pub fn is_anon(&self) -> bool {
        self.0 == "anon"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the conversation produced a turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// Reference to a media object persisted in durable blob storage.
///
/// Owned by the [`Turn`] that references it; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    /// Storage URI of the persisted bytes (e.g. `blob://palaver/uploads/...`).
    pub uri: String,
    /// MIME content type as reported by the provider.
    pub content_type: String,
    /// Size of the persisted object in bytes.
    pub size: u64,
}

/// One typed part of a turn's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
    Media { media: MediaReference },
}

/// Origin details attached to a turn for audit and outbound routing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMetadata {
    /// Raw origin phone as delivered by the provider (pre-normalization).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Which provider delivered the event (`twilio`, `cloud`, `recovered`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// RFC 3339 timestamp of when the turn was appended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// One user or assistant message in a session's ordered history.
///
/// Turns are created once and immutable thereafter. `external_message_id`,
/// when present, is unique among user-role turns of a session and drives
/// deduplication of provider redeliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TurnMetadata>,
}

impl Turn {
    /// Build a user turn with a single text part.
    pub fn user(
        text: impl Into<String>,
        external_message_id: Option<String>,
        metadata: Option<TurnMetadata>,
    ) -> Self {
        Turn {
            role: TurnRole::User,
            content: vec![ContentPart::Text { text: text.into() }],
            external_message_id,
            metadata,
        }
    }

    /// Build an assistant turn with a single text part.
    pub fn assistant(text: impl Into<String>) -> Self {
        Turn {
            role: TurnRole::Assistant,
            content: vec![ContentPart::Text { text: text.into() }],
            external_message_id: None,
            metadata: None,
        }
    }

    /// Concatenated text of all text parts, media parts skipped.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::Media { .. } => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Append a media part to this turn while it is still being assembled.
    pub fn with_media(mut self, media: MediaReference) -> Self {
        self.content.push(ContentPart::Media { media });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn anon_key_is_sentinel() {
        let key = UserKey::anon();
        assert!(key.is_anon());
        assert_eq!(key.as_str(), "anon");
        assert!(!UserKey("wa:123".into()).is_anon());
    }

    #[test]
    fn turn_role_round_trips() {
        assert_eq!(TurnRole::User.to_string(), "user");
        assert_eq!(TurnRole::Assistant.to_string(), "assistant");
        assert_eq!(TurnRole::from_str("user").unwrap(), TurnRole::User);
        assert_eq!(TurnRole::from_str("assistant").unwrap(), TurnRole::Assistant);
    }

    #[test]
    fn turn_text_joins_text_parts_only() {
        let turn = Turn::user("hola", Some("SM123".into()), None).with_media(MediaReference {
            uri: "blob://palaver/uploads/x.ogg".into(),
            content_type: "audio/ogg".into(),
            size: 42,
        });
        assert_eq!(turn.text(), "hola");
        assert_eq!(turn.content.len(), 2);
        assert_eq!(turn.external_message_id.as_deref(), Some("SM123"));
    }

    #[test]
    fn turn_serializes_with_tagged_parts() {
        let turn = Turn::assistant("hello");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
        assert!(json.contains("\"type\":\"text\""));
        // Absent optionals are omitted entirely.
        assert!(!json.contains("external_message_id"));

        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
    }

    #[test]
    fn media_reference_round_trips() {
        let media = MediaReference {
            uri: "blob://palaver/uploads/2026/08/wa:123/abc.ogg".into(),
            content_type: "audio/ogg".into(),
            size: 2048,
        };
        let json = serde_json::to_string(&media).unwrap();
        let back: MediaReference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, media);
    }
}
