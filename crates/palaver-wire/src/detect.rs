// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire format detection for inbound webhook bodies.
//!
//! Classifies a raw request body as a Cloud API JSON event, a Twilio-style
//! form-encoded event, or a malformed payload needing recovery, and flattens
//! it into a provider-agnostic field map. Detection never fails hard: the
//! worst outcome is an empty map, which downstream treats as "no phone found"
//! / "empty message".

use std::collections::BTreeMap;

use serde::Deserialize;
use strum::Display;
use tracing::debug;

use crate::recover;

/// Flat field name -> value mapping recovered from a wire payload.
pub type FlatMap = BTreeMap<String, String>;

/// Which wire shape the body was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    /// Nested Cloud API JSON event.
    Cloud,
    /// URL-encoded form event (Twilio webhook shape).
    Twilio,
    /// Fields scraped back out of a double-encoded or mangled body.
    Recovered,
}

/// A classified inbound event: flattened fields plus their provenance.
#[derive(Debug, Clone)]
pub struct WireEvent {
    pub source: SourceKind,
    pub fields: FlatMap,
}

impl WireEvent {
    pub fn empty(source: SourceKind) -> Self {
        WireEvent {
            source,
            fields: FlatMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Keys below this length are never treated as a double-encoded payload;
/// a real percent- or base64-encoded form body is much longer than any
/// legitimate field name.
const SUSPICIOUS_KEY_LEN: usize = 20;

/// Classify a request body and flatten it into a [`WireEvent`].
///
/// JSON content types go through the Cloud event schema; everything else is
/// parsed as form data. A form result consisting of exactly one long key with
/// an empty (or `"="`) value triggers the ordered recovery chain in
/// [`recover`]. All failures degrade to an empty field map.
pub fn detect(body: &[u8], content_type: Option<&str>) -> WireEvent {
    let is_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);

    if is_json {
        return parse_cloud_json(body);
    }

    let fields = parse_form(body);

    if let Some(mangled_key) = single_mangled_key(&fields) {
        debug!(
            key_len = mangled_key.len(),
            "form body looks double-encoded, running recovery chain"
        );
        let recovered = recover::run_chain(body).unwrap_or_default();
        return WireEvent {
            source: SourceKind::Recovered,
            fields: recovered,
        };
    }

    WireEvent {
        source: SourceKind::Twilio,
        fields,
    }
}

/// Parse URL-encoded form data into a flat map. Unparseable input yields an
/// empty map.
pub(crate) fn parse_form(body: &[u8]) -> FlatMap {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

/// Return the lone key if the map is a single long key with an empty or `"="`
/// value -- the signature of a payload whose true content was swallowed into
/// the key by a second round of encoding.
fn single_mangled_key(fields: &FlatMap) -> Option<&str> {
    if fields.len() != 1 {
        return None;
    }
    let (key, value) = fields.iter().next()?;
    if (value.is_empty() || value == "=") && key.len() > SUSPICIOUS_KEY_LEN {
        Some(key)
    } else {
        None
    }
}

// --- Cloud API event schema ---
//
// Only the fields the pipeline consumes are modeled; everything else in the
// event is ignored by serde.

#[derive(Debug, Deserialize)]
struct CloudEnvelope {
    #[serde(default)]
    entry: Vec<CloudEntry>,
}

#[derive(Debug, Deserialize)]
struct CloudEntry {
    #[serde(default)]
    changes: Vec<CloudChange>,
}

#[derive(Debug, Deserialize)]
struct CloudChange {
    #[serde(default)]
    value: Option<CloudValue>,
}

#[derive(Debug, Default, Deserialize)]
struct CloudValue {
    #[serde(default)]
    messages: Vec<CloudMessage>,
    #[serde(default)]
    contacts: Vec<CloudContact>,
}

#[derive(Debug, Deserialize)]
struct CloudMessage {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "type")]
    message_type: Option<String>,
    #[serde(default)]
    text: Option<CloudText>,
    #[serde(default)]
    audio: Option<CloudMedia>,
    #[serde(default)]
    image: Option<CloudMedia>,
}

#[derive(Debug, Deserialize)]
struct CloudText {
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CloudMedia {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CloudContact {
    #[serde(default)]
    wa_id: Option<String>,
}

/// Flatten the first message of a Cloud API event into wire fields.
fn parse_cloud_json(body: &[u8]) -> WireEvent {
    let envelope: CloudEnvelope = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(err) => {
            debug!(error = %err, "cloud event body is not parseable JSON");
            return WireEvent::empty(SourceKind::Cloud);
        }
    };

    let Some(value) = envelope
        .entry
        .into_iter()
        .next()
        .and_then(|entry| entry.changes.into_iter().next())
        .and_then(|change| change.value)
    else {
        return WireEvent::empty(SourceKind::Cloud);
    };

    let mut fields = FlatMap::new();

    if let Some(contact) = value.contacts.into_iter().next()
        && let Some(wa_id) = contact.wa_id
    {
        fields.insert("contact_wa_id".to_string(), wa_id);
    }

    if let Some(message) = value.messages.into_iter().next() {
        if let Some(from) = message.from {
            fields.insert("from".to_string(), from);
        }
        if let Some(id) = message.id {
            fields.insert("message_id".to_string(), id);
        }
        if let Some(message_type) = message.message_type {
            fields.insert("message_type".to_string(), message_type);
        }
        if let Some(body) = message.text.and_then(|t| t.body) {
            fields.insert("text_body".to_string(), body);
        }
        if let Some(audio) = message.audio {
            if let Some(id) = audio.id {
                fields.insert("audio_id".to_string(), id);
            }
            if let Some(mime) = audio.mime_type {
                fields.insert("audio_mime_type".to_string(), mime);
            }
        }
        if let Some(image) = message.image {
            if let Some(id) = image.id {
                fields.insert("image_id".to_string(), id);
            }
            if let Some(mime) = image.mime_type {
                fields.insert("image_mime_type".to_string(), mime);
            }
        }
    }

    WireEvent {
        source: SourceKind::Cloud,
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    #[test]
    fn form_body_parses_to_twilio_fields() {
        let body = b"From=whatsapp%3A%2B5491122334455&Body=hola&MessageSid=SM123";
        let event = detect(body, Some("application/x-www-form-urlencoded"));
        assert_eq!(event.source, SourceKind::Twilio);
        assert_eq!(event.field("From"), Some("whatsapp:+5491122334455"));
        assert_eq!(event.field("Body"), Some("hola"));
        assert_eq!(event.field("MessageSid"), Some("SM123"));
    }

    #[test]
    fn cloud_json_flattens_nested_message() {
        let body = serde_json::json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "contacts": [{"wa_id": "5491122334455"}],
                        "messages": [{
                            "from": "5491122334455",
                            "id": "wamid.abc123",
                            "type": "text",
                            "text": {"body": "hola"}
                        }]
                    }
                }]
            }]
        });
        let event = detect(
            serde_json::to_vec(&body).unwrap().as_slice(),
            Some("application/json"),
        );
        assert_eq!(event.source, SourceKind::Cloud);
        assert_eq!(event.field("from"), Some("5491122334455"));
        assert_eq!(event.field("text_body"), Some("hola"));
        assert_eq!(event.field("message_id"), Some("wamid.abc123"));
        assert_eq!(event.field("contact_wa_id"), Some("5491122334455"));
    }

    #[test]
    fn cloud_json_with_audio_flattens_media_fields() {
        let body = serde_json::json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "messages": [{
                            "from": "5491122334455",
                            "id": "wamid.audio1",
                            "type": "audio",
                            "audio": {"id": "media-789", "mime_type": "audio/ogg; codecs=opus"}
                        }]
                    }
                }]
            }]
        });
        let event = detect(
            serde_json::to_vec(&body).unwrap().as_slice(),
            Some("application/json"),
        );
        assert_eq!(event.field("audio_id"), Some("media-789"));
        assert_eq!(event.field("audio_mime_type"), Some("audio/ogg; codecs=opus"));
    }

    #[test]
    fn malformed_json_degrades_to_empty_fields() {
        let event = detect(b"{not json at all", Some("application/json"));
        assert_eq!(event.source, SourceKind::Cloud);
        assert!(event.fields.is_empty());
    }

    #[test]
    fn json_without_messages_degrades_to_empty_fields() {
        let event = detect(br#"{"entry": []}"#, Some("application/json"));
        assert!(event.fields.is_empty());
    }

    #[test]
    fn base64_double_encoded_body_is_recovered() {
        let inner = "From=whatsapp%3A%2B5491122334455&Body=hola";
        let encoded = base64::engine::general_purpose::STANDARD.encode(inner);
        let event = detect(encoded.as_bytes(), Some("application/x-www-form-urlencoded"));
        assert_eq!(event.source, SourceKind::Recovered);
        assert_eq!(event.field("From"), Some("whatsapp:+5491122334455"));
        assert_eq!(event.field("Body"), Some("hola"));
    }

    #[test]
    fn percent_double_encoded_body_is_recovered() {
        // The whole form string percent-encoded once more, escapes included:
        // "=" -> %3D, "&" -> %26, "%" -> %25.
        let body = "From%3Dwhatsapp%253A%252B5491122334455%26Body%3Dhola";
        let event = detect(body.as_bytes(), Some("application/x-www-form-urlencoded"));
        assert_eq!(event.source, SourceKind::Recovered);
        assert_eq!(event.field("From"), Some("whatsapp:+5491122334455"));
        assert_eq!(event.field("Body"), Some("hola"));
    }

    #[test]
    fn unrecoverable_garbage_yields_empty_recovered_event() {
        let body = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa!!!!";
        let event = detect(body.as_bytes(), Some("application/x-www-form-urlencoded"));
        assert_eq!(event.source, SourceKind::Recovered);
        assert!(event.fields.is_empty());
    }

    #[test]
    fn short_single_key_is_not_treated_as_mangled() {
        let event = detect(b"Body=", Some("application/x-www-form-urlencoded"));
        assert_eq!(event.source, SourceKind::Twilio);
        assert_eq!(event.field("Body"), Some(""));
    }

    #[test]
    fn detection_is_idempotent() {
        let inner = "From=whatsapp%3A%2B5491122334455&Body=hola";
        let encoded = base64::engine::general_purpose::STANDARD.encode(inner);
        let first = detect(encoded.as_bytes(), None);
        let second = detect(encoded.as_bytes(), None);
        assert_eq!(first.fields, second.fields);
        assert_eq!(first.source, second.source);
    }
}
