// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deduplication of provider webhook redeliveries.
//!
//! A candidate event is a duplicate iff a user-role turn in the recent
//! window matches BOTH its provider message id AND its text. Matching id
//! alone is insufficient (providers have been observed to resend edited
//! bodies under the same id); matching text alone is insufficient (users
//! legitimately repeat themselves).
//!
//! Events without a provider id skip dedup by default. The content-hash
//! fallback is an explicit configuration choice: identical text hashes
//! within a bounded time window count as duplicates.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use palaver_config::model::DedupFallback;
use palaver_core::{Turn, TurnRole};

/// Dedup settings derived from config.
#[derive(Debug, Clone)]
pub struct DedupPolicy {
    /// How many of the most recent turns to inspect.
    pub recent_window: usize,
    /// Behavior for id-less events.
    pub fallback: DedupFallback,
    /// Time window for the content-hash fallback.
    pub window: Duration,
}

impl DedupPolicy {
    pub fn new(recent_window: usize, fallback: DedupFallback, window_secs: u64) -> Self {
        Self {
            recent_window,
            fallback,
            window: Duration::seconds(window_secs as i64),
        }
    }
}

/// Decide whether this exact inbound event was already applied.
pub fn is_duplicate(
    policy: &DedupPolicy,
    turns: &[Turn],
    candidate_id: Option<&str>,
    candidate_text: &str,
    now: DateTime<Utc>,
) -> bool {
    let start = turns.len().saturating_sub(policy.recent_window);
    let recent = &turns[start..];

    match candidate_id {
        Some(id) => recent.iter().any(|turn| {
            turn.role == TurnRole::User
                && turn.external_message_id.as_deref() == Some(id)
                && turn.text() == candidate_text
        }),
        None => match policy.fallback {
            DedupFallback::Off => false,
            DedupFallback::ContentHash => {
                content_hash_match(policy, recent, candidate_text, now)
            }
        },
    }
}

/// Fallback heuristic: same text hash from the same user within the window.
fn content_hash_match(
    policy: &DedupPolicy,
    recent: &[Turn],
    candidate_text: &str,
    now: DateTime<Utc>,
) -> bool {
    if candidate_text.is_empty() {
        return false;
    }
    let candidate_hash = text_hash(candidate_text);

    recent.iter().any(|turn| {
        if turn.role != TurnRole::User {
            return false;
        }
        let Some(timestamp) = turn
            .metadata
            .as_ref()
            .and_then(|meta| meta.timestamp.as_deref())
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        else {
            // Turns without a parseable timestamp never match; better a
            // missed dedup than a dropped message.
            return false;
        };
        if now.signed_duration_since(timestamp.with_timezone(&Utc)) > policy.window {
            return false;
        }
        let matched = text_hash(&turn.text()) == candidate_hash;
        if matched {
            debug!("content-hash dedup matched a recent turn");
        }
        matched
    })
}

fn text_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
