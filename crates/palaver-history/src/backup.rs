// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session snapshot management.
//!
//! After every successful reply-commit the full turn log is snapshotted
//! under a timestamped key; only the K most recent snapshots per user
//! survive. Snapshot keys sort lexicographically in time order, so "most
//! recent" is simply the greatest key.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use palaver_core::{BlobStore, PalaverError, Turn, UserKey};

/// Key prefix for one user's snapshots.
pub fn backup_prefix(user: &UserKey) -> String {
    format!("backups/{user}/")
}

/// Timestamped snapshot key; the format collates lexicographically.
pub fn backup_key(user: &UserKey, at: DateTime<Utc>) -> String {
    format!("{}{}.json", backup_prefix(user), at.format("%Y%m%dT%H%M%S%3f"))
}

/// Write a snapshot of the full turn log and evict snapshots beyond `keep`.
pub async fn write_snapshot(
    store: &dyn BlobStore,
    bucket: &str,
    user: &UserKey,
    turns: &[Turn],
    keep: usize,
) -> Result<(), PalaverError> {
    let bytes = serde_json::to_vec(turns).map_err(PalaverError::storage)?;
    let key = backup_key(user, Utc::now());
    store
        .put(bucket, &key, bytes, "application/json")
        .await?;
    debug!(user = %user, key = %key, turns = turns.len(), "session snapshot written");

    // Retention: keys sort oldest-first, so everything before the last
    // `keep` entries goes.
    let keys = store.list(bucket, &backup_prefix(user)).await?;
    if keys.len() > keep {
        for stale in &keys[..keys.len() - keep] {
            store.delete(bucket, stale).await?;
            debug!(user = %user, key = %stale, "stale snapshot evicted");
        }
    }

    Ok(())
}

/// Load the most recent snapshot's turns, if any snapshot exists.
pub async fn restore_latest(
    store: &dyn BlobStore,
    bucket: &str,
    user: &UserKey,
) -> Result<Option<Vec<Turn>>, PalaverError> {
    let keys = store.list(bucket, &backup_prefix(user)).await?;
    let Some(latest) = keys.last() else {
        return Ok(None);
    };

    let Some(bytes) = store.get(bucket, latest).await? else {
        return Ok(None);
    };

    match serde_json::from_slice::<Vec<Turn>>(&bytes) {
        Ok(turns) => {
            debug!(user = %user, key = %latest, turns = turns.len(), "session restored from snapshot");
            Ok(Some(turns))
        }
        Err(err) => {
            warn!(user = %user, key = %latest, error = %err, "snapshot unparseable, ignoring");
            Ok(None)
        }
    }
}
