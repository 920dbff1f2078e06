// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook signature verification.
//!
//! Twilio signs `X-Twilio-Signature` as base64(HMAC-SHA1) over the public
//! webhook URL followed by the form parameters concatenated in sorted key
//! order. The Cloud API signs `X-Hub-Signature-256` as `sha256=` plus the
//! hex HMAC-SHA256 of the raw body. Verification is config-gated at the
//! handler; an unset secret skips the check entirely.

use std::collections::BTreeMap;

use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Compute the expected Twilio signature for a webhook request.
pub fn twilio_signature(auth_token: &str, url: &str, params: &BTreeMap<String, String>) -> String {
    let mut data = url.to_string();
    // BTreeMap iteration is already in sorted key order.
    for (key, value) in params {
        data.push_str(key);
        data.push_str(value);
    }

    let mut mac =
        HmacSha1::new_from_slice(auth_token.as_bytes()).expect("HMAC accepts any key length");
    mac.update(data.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

/// Verify a Twilio-signed form body against its signature header.
pub fn verify_twilio(auth_token: &str, url: &str, body: &[u8], header: &str) -> bool {
    let params: BTreeMap<String, String> =
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
            Ok(pairs) => pairs.into_iter().collect(),
            Err(_) => return false,
        };
    twilio_signature(auth_token, url, &params) == header
}

/// Verify a Cloud-signed raw body against its `sha256=` signature header.
pub fn verify_cloud(app_secret: &str, body: &[u8], header: &str) -> bool {
    let Some(received) = header.strip_prefix("sha256=") else {
        return false;
    };

    let mut mac =
        HmacSha256::new_from_slice(app_secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes()) == received.to_ascii_lowercase()
}
