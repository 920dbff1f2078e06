// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity resolution: raw provider sender fields to the canonical user key.
//!
//! Precedence, first match wins:
//! 1. Twilio `From` (stripping the `whatsapp:` channel prefix tag)
//! 2. Twilio `WaId`
//! 3. fields scraped back out of a malformed payload (same names, delivered
//!    with `SourceKind::Recovered`, so they ride the two rules above)
//! 4. Cloud nested sender (`from`, then `contact_wa_id`)
//!
//! Normalization strips every non-digit character, so `whatsapp:+54 9 11
//! 2233-4455` and `5491122334455` address the same session.

use palaver_core::UserKey;

use crate::detect::WireEvent;

/// Resolve the canonical user key for an event.
///
/// Unresolvable identities collapse onto [`UserKey::anon`]; callers must
/// treat those sessions as best-effort only.
pub fn resolve(event: &WireEvent) -> UserKey {
    let candidates = [
        event.field("From").map(strip_channel_prefix),
        event.field("WaId"),
        event.field("from"),
        event.field("contact_wa_id"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(canonical_key)
        .unwrap_or_else(UserKey::anon)
}

/// Drop a leading channel tag such as `whatsapp:` from a sender field.
fn strip_channel_prefix(raw: &str) -> &str {
    match raw.split_once(':') {
        Some((_, rest)) => rest,
        None => raw,
    }
}

/// Normalize a raw identifier into the canonical `wa:` key.
///
/// Returns `None` when no digits remain after stripping formatting.
pub fn canonical_key(raw: &str) -> Option<UserKey> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(UserKey(format!("wa:{digits}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{FlatMap, SourceKind};

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
    fn from_field_with_prefix_resolves() {
        let event = event(
            SourceKind::Twilio,
            &[("From", "whatsapp:+5491122334455"), ("Body", "hola")],
        );
        assert_eq!(resolve(&event).as_str(), "wa:5491122334455");
    }

    #[test]
    fn formatting_variants_yield_same_key() {
        let variants = [
            "whatsapp:+5491122334455",
            "+54 9 11 2233-4455",
            "5491122334455",
            "(54) 9-11-2233.4455",
        ];
        for variant in variants {
            let event = event(SourceKind::Twilio, &[("From", variant)]);
            assert_eq!(
                resolve(&event).as_str(),
                "wa:5491122334455",
                "variant {variant:?} did not normalize"
            );
        }
    }

    #[test]
    fn wa_id_used_when_from_absent() {
        let event = event(SourceKind::Twilio, &[("WaId", "5491122334455")]);
        assert_eq!(resolve(&event).as_str(), "wa:5491122334455");
    }

    #[test]
    fn from_takes_precedence_over_wa_id() {
        let event = event(
            SourceKind::Twilio,
            &[("From", "whatsapp:+111"), ("WaId", "222")],
        );
        assert_eq!(resolve(&event).as_str(), "wa:111");
    }

    #[test]
    fn cloud_nested_sender_resolves() {
        let event = event(
            SourceKind::Cloud,
            &[("from", "5491122334455"), ("text_body", "hola")],
        );
        assert_eq!(resolve(&event).as_str(), "wa:5491122334455");
    }

    #[test]
    fn cloud_contact_wa_id_is_last_resort() {
        let event = event(SourceKind::Cloud, &[("contact_wa_id", "549999")]);
        assert_eq!(resolve(&event).as_str(), "wa:549999");
    }

    #[test]
    fn recovered_fields_resolve_like_form_fields() {
        let event = event(SourceKind::Recovered, &[("From", "whatsapp:+549112233")]);
        assert_eq!(resolve(&event).as_str(), "wa:549112233");
    }

    #[test]
    fn digitless_identity_is_anon() {
        let event = event(SourceKind::Twilio, &[("From", "whatsapp:nobody")]);
        assert!(resolve(&event).is_anon());
    }

    #[test]
    fn empty_event_is_anon() {
        let event = event(SourceKind::Recovered, &[]);
        assert!(resolve(&event).is_anon());
    }
}
