// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered recovery chain for double-encoded webhook bodies.
//!
//! Some deliveries arrive with the entire form string encoded one extra time,
//! so the real payload ends up inside a single long key. Each strategy here
//! is a pure function `&[u8] -> Option<FlatMap>`, tried in a fixed order;
//! the first one producing a recognizable identity or body field wins.
//! Failures are non-fatal and fall through to the next strategy.

use base64::Engine;
use regex::Regex;
use std::sync::LazyLock;

use crate::detect::{parse_form, FlatMap};

/// One recovery strategy. Pure: same bytes in, same fields out.
pub type Recovery = fn(&[u8]) -> Option<FlatMap>;

/// The fixed recovery order: base64 guess, percent-decode guess, regex scrape.
pub const CHAIN: &[(&str, Recovery)] = &[
    ("base64", recover_base64),
    ("percent", recover_percent),
    ("scrape", recover_scrape),
];

/// Field names that count as a successful recovery.
const RECOGNIZABLE: &[&str] = &["From", "WaId", "Body", "from", "text_body"];

/// Run the chain in order and return the first recognizable result.
pub fn run_chain(body: &[u8]) -> Option<FlatMap> {
    for (name, recovery) in CHAIN {
        if let Some(fields) = recovery(body) {
            tracing::debug!(strategy = name, fields = fields.len(), "recovery succeeded");
            return Some(fields);
        }
    }
    None
}

/// Whether a recovered map contains at least one identity or body field.
fn recognizable(fields: &FlatMap) -> bool {
    RECOGNIZABLE.iter().any(|name| fields.contains_key(*name))
}

/// (a) The body is the base64 encoding of the real form string.
fn recover_base64(body: &[u8]) -> Option<FlatMap> {
    let trimmed = std::str::from_utf8(body).ok()?.trim();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(trimmed)
        .or_else(|_| {
            base64::engine::general_purpose::STANDARD_NO_PAD
                .decode(trimmed.trim_end_matches('='))
        })
        .ok()?;
    let fields = parse_form(&decoded);
    recognizable(&fields).then_some(fields)
}

/// (b) The body is the form string percent-encoded one extra time.
fn recover_percent(body: &[u8]) -> Option<FlatMap> {
    let text = std::str::from_utf8(body).ok()?;
    let decoded = urlencoding::decode(text).ok()?;
    let fields = parse_form(decoded.as_bytes());
    recognizable(&fields).then_some(fields)
}

static SCRAPE_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Body=([^&]*)").expect("static regex"));
static SCRAPE_FROM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"From=([^&]*)").expect("static regex"));
static SCRAPE_WA_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"WaId=([^&]*)").expect("static regex"));

/// (c) Last resort: pull known field names straight out of the raw bytes.
fn recover_scrape(body: &[u8]) -> Option<FlatMap> {
    let text = String::from_utf8_lossy(body);
    let mut fields = FlatMap::new();

    for (name, pattern) in [
        ("Body", &*SCRAPE_BODY),
        ("From", &*SCRAPE_FROM),
        ("WaId", &*SCRAPE_WA_ID),
    ] {
        if let Some(captures) = pattern.captures(&text) {
            let raw = captures.get(1).map(|m| m.as_str()).unwrap_or("");
            let value = urlencoding::decode(raw)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            fields.insert(name.to_string(), value);
        }
    }

    recognizable(&fields).then_some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_recovers_form_fields() {
        let inner = "From=whatsapp%3A%2B5491122334455&Body=hola&MessageSid=SM1";
        let encoded = base64::engine::general_purpose::STANDARD.encode(inner);
        let fields = recover_base64(encoded.as_bytes()).unwrap();
        assert_eq!(fields.get("From").unwrap(), "whatsapp:+5491122334455");
        assert_eq!(fields.get("Body").unwrap(), "hola");
        assert_eq!(fields.get("MessageSid").unwrap(), "SM1");
    }

    #[test]
    fn base64_rejects_non_base64_bytes() {
        assert!(recover_base64(b"this is %%% not base64").is_none());
    }

    #[test]
    fn base64_rejects_decodable_but_unrecognizable_content() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("a=b&c=d");
        assert!(recover_base64(encoded.as_bytes()).is_none());
    }

    #[test]
    fn percent_recovers_double_encoded_form() {
        let body = b"WaId%3D5491122334455%26Body%3Dhola";
        let fields = recover_percent(body).unwrap();
        assert_eq!(fields.get("WaId").unwrap(), "5491122334455");
        assert_eq!(fields.get("Body").unwrap(), "hola");
    }

    #[test]
    fn scrape_pulls_known_fields_from_garbage() {
        let body = b"x\xffgarbageBody=hola%20che&moreFrom=whatsapp%3A%2B549112233&";
        let fields = recover_scrape(body).unwrap();
        assert_eq!(fields.get("Body").unwrap(), "hola che");
        assert_eq!(fields.get("From").unwrap(), "whatsapp:+549112233");
    }

    #[test]
    fn scrape_without_known_fields_fails() {
        assert!(recover_scrape(b"nothing useful here").is_none());
    }

    #[test]
    fn chain_resolves_base64_first() {
        let inner = "From=111&Body=first";
        let encoded = base64::engine::general_purpose::STANDARD.encode(inner);
        let fields = run_chain(encoded.as_bytes()).unwrap();
        assert_eq!(fields.get("Body").unwrap(), "first");
        assert_eq!(fields.get("From").unwrap(), "111");
    }

    #[test]
    fn chain_is_pure_and_repeatable() {
        let body = b"WaId%3D549%26Body%3Dhola";
        assert_eq!(run_chain(body), run_chain(body));
    }

    #[test]
    fn chain_exhaustion_returns_none() {
        assert!(run_chain(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaa!!!!").is_none());
    }
}
