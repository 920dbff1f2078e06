// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user single-writer serialization.
//!
//! The history document is read-modify-written whole, so two concurrent
//! requests for the same user would silently drop whichever write lands
//! first. Requests are serialized through one async mutex per canonical user
//! key. The `anon` sentinel is exempt: those sessions are best-effort by
//! contract, and serializing them would couple unrelated senders.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use palaver_core::UserKey;

/// Keyed lock table. Entries are created on first use and kept for the
/// process lifetime; user cardinality is low-frequency by design.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the single-writer lock for a user.
    ///
    /// Returns `None` for the anonymous sentinel, which is processed
    /// without serialization.
    pub async fn acquire(&self, user: &UserKey) -> Option<OwnedMutexGuard<()>> {
        if user.is_anon() {
            return None;
        }
        let lock = self
            .locks
            .entry(user.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Some(lock.lock_owned().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let user = UserKey("wa:1".into());

        let guard = locks.acquire(&user).await;
        assert!(guard.is_some());

        // A second acquire for the same user must wait.
        let locks_clone = locks.clone();
        let user_clone = user.clone();
        let pending = tokio::spawn(async move { locks_clone.acquire(&user_clone).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        drop(guard);
        let second = pending.await.unwrap();
        assert!(second.is_some());
    }

    #[tokio::test]
    async fn different_users_do_not_block_each_other() {
        let locks = UserLocks::new();
        let first = locks.acquire(&UserKey("wa:1".into())).await;
        let second = locks.acquire(&UserKey("wa:2".into())).await;
        assert!(first.is_some() && second.is_some());
    }

    #[tokio::test]
    async fn anon_is_exempt() {
        let locks = UserLocks::new();
        assert!(locks.acquire(&UserKey::anon()).await.is_none());
        assert!(locks.acquire(&UserKey::anon()).await.is_none());
    }
}
