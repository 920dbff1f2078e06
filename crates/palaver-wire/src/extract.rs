// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message extraction: user-visible text and media descriptors out of a
//! flattened wire event, independent of provider shape.

use palaver_core::UserKey;

use crate::detect::{SourceKind, WireEvent};

/// Where the media bytes live, per provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaLocator {
    /// Direct download URL (Twilio `MediaUrl{i}`).
    Url(String),
    /// Provider media id needing a Graph API lookup (Cloud `audio.id`).
    ProviderId(String),
}

/// One inbound media attachment before download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub locator: MediaLocator,
    pub content_type: String,
}

impl MediaDescriptor {
    /// Audio classification is a substring match on the content type, so
    /// `audio/ogg; codecs=opus` and `audio/mpeg` both qualify.
    pub fn is_audio(&self) -> bool {
        self.content_type.contains("audio")
    }
}

/// The provider-agnostic result of extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMessage {
    /// Plain user text; empty when the event carried none.
    pub text: String,
    pub media: Vec<MediaDescriptor>,
}

impl ExtractedMessage {
    /// Whether any attachment is audio.
    pub fn has_audio(&self) -> bool {
        self.media.iter().any(MediaDescriptor::is_audio)
    }

    /// The first audio attachment, if any.
    pub fn first_audio(&self) -> Option<&MediaDescriptor> {
        self.media.iter().find(|descriptor| descriptor.is_audio())
    }
}

/// Fallback field names scanned case-insensitively when no explicit body
/// field is present.
const GENERIC_TEXT_FIELDS: &[&str] = &["body", "text", "message"];

/// Pull text and media out of a wire event.
///
/// Extraction order: explicit `Body` -> Cloud nested `text_body` -> indexed
/// media field pairs and Cloud media ids -> generic case-insensitive
/// body/text/message scan. Regex recovery has already run inside the
/// detector, so recovered events are read like form events here.
pub fn extract(event: &WireEvent) -> ExtractedMessage {
    let text = event
        .field("Body")
        .or_else(|| event.field("text_body"))
        .map(str::to_string)
        .or_else(|| generic_text_scan(event))
        .unwrap_or_default();

    ExtractedMessage {
        text,
        media: extract_media(event),
    }
}

fn generic_text_scan(event: &WireEvent) -> Option<String> {
    event.fields.iter().find_map(|(key, value)| {
        let lowered = key.to_ascii_lowercase();
        GENERIC_TEXT_FIELDS
            .contains(&lowered.as_str())
            .then(|| value.clone())
    })
}

fn extract_media(event: &WireEvent) -> Vec<MediaDescriptor> {
    let mut media = Vec::new();

    // Twilio indexed pairs: MediaUrl{i} + MediaContentType{i}, i < NumMedia.
    let count: usize = event
        .field("NumMedia")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(0);
    for i in 0..count {
        if let Some(url) = event.field(&format!("MediaUrl{i}")) {
            let content_type = event
                .field(&format!("MediaContentType{i}"))
                .unwrap_or("application/octet-stream")
                .to_string();
            media.push(MediaDescriptor {
                locator: MediaLocator::Url(url.to_string()),
                content_type,
            });
        }
    }

    // Cloud media ids carry their own mime type; default to OGG voice notes
    // when the event omitted it.
    if let Some(id) = event.field("audio_id") {
        media.push(MediaDescriptor {
            locator: MediaLocator::ProviderId(id.to_string()),
            content_type: event
                .field("audio_mime_type")
                .unwrap_or("audio/ogg")
                .to_string(),
        });
    }
    if let Some(id) = event.field("image_id") {
        media.push(MediaDescriptor {
            locator: MediaLocator::ProviderId(id.to_string()),
            content_type: event
                .field("image_mime_type")
                .unwrap_or("image/jpeg")
                .to_string(),
        });
    }

    media
}

/// The provider-supplied message identifier used for deduplication.
///
/// Twilio sends `MessageSid`; Cloud sends the `wamid` on the message object.
/// Recovered payloads usually lose it, which disables dedup for that event.
pub fn external_message_id(event: &WireEvent) -> Option<String> {
    event
        .field("MessageSid")
        .or_else(|| event.field("message_id"))
        .map(str::to_string)
}

/// Raw origin phone for turn metadata and outbound routing, before
/// normalization.
pub fn origin_phone(event: &WireEvent) -> Option<String> {
    event
        .field("From")
        .or_else(|| event.field("WaId"))
        .or_else(|| event.field("from"))
        .or_else(|| event.field("contact_wa_id"))
        .map(str::to_string)
}

/// Provider label recorded in turn metadata.
pub fn provider_label(event: &WireEvent) -> &'static str {
    match event.source {
        SourceKind::Cloud => "cloud",
        SourceKind::Twilio => "twilio",
        SourceKind::Recovered => "recovered",
    }
}

/// Destination a reply should be sent to, resolved from the event.
///
/// Twilio wants the original `From` value back (prefix tag included); Cloud
/// wants the bare wa id. Falls back to the canonical key's digits when the
/// event lost the raw field.
pub fn reply_destination(event: &WireEvent, user: &UserKey) -> Option<String> {
    if let Some(from) = event.field("From") {
        return Some(from.to_string());
    }
    if let Some(from) = event.field("from").or_else(|| event.field("WaId")) {
        return Some(from.to_string());
    }
    if user.is_anon() {
        return None;
    }
    user.as_str().strip_prefix("wa:").map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::FlatMap;

    fn event(source: SourceKind, pairs: &[(&str, &str)]) -> WireEvent {
        WireEvent {
            source,
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<FlatMap>(),
        }
    }

    #[test]
    fn explicit_body_wins() {
        let event = event(
            SourceKind::Twilio,
            &[("Body", "hola"), ("text", "ignored")],
        );
        let extracted = extract(&event);
        assert_eq!(extracted.text, "hola");
        assert!(extracted.media.is_empty());
    }

    #[test]
    fn cloud_text_body_extracted() {
        let event = event(SourceKind::Cloud, &[("text_body", "buenas")]);
        assert_eq!(extract(&event).text, "buenas");
    }

    #[test]
    fn indexed_media_pairs_extracted_in_order() {
        let event = event(
            SourceKind::Twilio,
            &[
                ("NumMedia", "2"),
                ("MediaUrl0", "https://api.example.test/m0"),
                ("MediaContentType0", "audio/ogg"),
                ("MediaUrl1", "https://api.example.test/m1"),
                ("MediaContentType1", "image/jpeg"),
            ],
        );
        let extracted = extract(&event);
        assert_eq!(extracted.media.len(), 2);
        assert_eq!(
            extracted.media[0].locator,
            MediaLocator::Url("https://api.example.test/m0".into())
        );
        assert_eq!(extracted.media[0].content_type, "audio/ogg");
        assert!(extracted.media[0].is_audio());
        assert!(!extracted.media[1].is_audio());
        assert!(extracted.has_audio());
    }

    #[test]
    fn cloud_audio_id_becomes_provider_locator() {
        let event = event(
            SourceKind::Cloud,
            &[("audio_id", "media-1"), ("audio_mime_type", "audio/ogg; codecs=opus")],
        );
        let extracted = extract(&event);
        assert_eq!(extracted.media.len(), 1);
        assert_eq!(
            extracted.media[0].locator,
            MediaLocator::ProviderId("media-1".into())
        );
        assert!(extracted.has_audio());
    }

    #[test]
    fn cloud_audio_without_mime_defaults_to_ogg() {
        let event = event(SourceKind::Cloud, &[("audio_id", "media-1")]);
        assert_eq!(extract(&event).media[0].content_type, "audio/ogg");
    }

    #[test]
    fn generic_scan_is_case_insensitive() {
        let event = event(SourceKind::Recovered, &[("MESSAGE", "recovered text")]);
        assert_eq!(extract(&event).text, "recovered text");
    }

    #[test]
    fn empty_event_extracts_empty_message() {
        let event = event(SourceKind::Recovered, &[]);
        let extracted = extract(&event);
        assert!(extracted.text.is_empty());
        assert!(extracted.media.is_empty());
        assert!(!extracted.has_audio());
    }

    #[test]
    fn message_id_per_provider() {
        let twilio = event(SourceKind::Twilio, &[("MessageSid", "SM123")]);
        assert_eq!(external_message_id(&twilio).as_deref(), Some("SM123"));

        let cloud = event(SourceKind::Cloud, &[("message_id", "wamid.9")]);
        assert_eq!(external_message_id(&cloud).as_deref(), Some("wamid.9"));

        let bare = event(SourceKind::Recovered, &[("Body", "hola")]);
        assert!(external_message_id(&bare).is_none());
    }

    #[test]
    fn reply_destination_prefers_raw_from() {
        let twilio = event(SourceKind::Twilio, &[("From", "whatsapp:+549111")]);
        let user = UserKey("wa:549111".into());
        assert_eq!(
            reply_destination(&twilio, &user).as_deref(),
            Some("whatsapp:+549111")
        );
    }

    #[test]
    fn reply_destination_falls_back_to_key_digits() {
        let bare = event(SourceKind::Recovered, &[]);
        let user = UserKey("wa:549111".into());
        assert_eq!(reply_destination(&bare, &user).as_deref(), Some("549111"));
        assert!(reply_destination(&bare, &UserKey::anon()).is_none());
    }
}
