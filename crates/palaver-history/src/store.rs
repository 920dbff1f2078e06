// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable per-user conversation history over the blob store.
//!
//! One JSON document per user at `history/{user}.json`, read and written
//! whole. The durable log is unbounded; the context window is applied only
//! when composing the downstream payload, never to the stored document.
//! There is no optimistic concurrency on the document itself -- callers
//! serialize writers per user through [`UserLocks`](crate::locks::UserLocks).

use std::sync::Arc;

use tracing::{debug, warn};

use palaver_core::{BlobStore, PalaverError, Turn, UserKey};

use crate::backup;

/// Conversation history store with snapshot-based disaster recovery.
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn BlobStore>,
    bucket: String,
    context_turns: usize,
    backup_keep: usize,
}

/// Primary document key for a user's history.
pub fn history_key(user: &UserKey) -> String {
    format!("history/{user}.json")
}

impl HistoryStore {
    pub fn new(
        store: Arc<dyn BlobStore>,
        bucket: impl Into<String>,
        context_turns: usize,
        backup_keep: usize,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            context_turns,
            backup_keep,
        }
    }

    /// Load a user's full turn log.
    ///
    /// An empty or missing primary document falls back to the most recent
    /// snapshot; when both miss, the result is an empty fresh log, not an
    /// error. A corrupt primary document is treated as missing.
    pub async fn load(&self, user: &UserKey) -> Result<Vec<Turn>, PalaverError> {
        let primary = self.read_primary(user).await?;
        if let Some(turns) = primary
            && !turns.is_empty()
        {
            return Ok(turns);
        }

        match backup::restore_latest(self.store.as_ref(), &self.bucket, user).await? {
            Some(turns) if !turns.is_empty() => {
                debug!(user = %user, turns = turns.len(), "primary history missing, restored from backup");
                Ok(turns)
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn read_primary(&self, user: &UserKey) -> Result<Option<Vec<Turn>>, PalaverError> {
        let Some(bytes) = self.store.get(&self.bucket, &history_key(user)).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(turns) => Ok(Some(turns)),
            Err(err) => {
                warn!(user = %user, error = %err, "history document unparseable, treating as missing");
                Ok(None)
            }
        }
    }

    /// Write the full turn log back to the primary document.
    pub async fn save(&self, user: &UserKey, turns: &[Turn]) -> Result<(), PalaverError> {
        let bytes = serde_json::to_vec(turns).map_err(PalaverError::storage)?;
        self.store
            .put(&self.bucket, &history_key(user), bytes, "application/json")
            .await?;
        debug!(user = %user, turns = turns.len(), "history saved");
        Ok(())
    }

    /// Snapshot the full log after a successful reply-commit, enforcing the
    /// per-user retention cap.
    pub async fn backup(&self, user: &UserKey, turns: &[Turn]) -> Result<(), PalaverError> {
        backup::write_snapshot(
            self.store.as_ref(),
            &self.bucket,
            user,
            turns,
            self.backup_keep,
        )
        .await
    }

    /// The read-time context window: the most recent N turns.
    ///
    /// Older turns stay in the durable log; they are only excluded from the
    /// payload handed to the generation backend.
    pub fn context_window<'a>(&self, turns: &'a [Turn]) -> &'a [Turn] {
        let start = turns.len().saturating_sub(self.context_turns);
        &turns[start..]
    }
}
