// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`BlobStore`] for deterministic testing.
//!
//! Mirrors the contract of the filesystem store (miss is `Ok(None)`, list is
//! sorted, delete is idempotent) without touching disk.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use palaver_core::{BlobStore, PalaverError};

type Objects = BTreeMap<(String, String), Vec<u8>>;

/// Blob store backed by a mutex-guarded map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<Mutex<Objects>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects, for assertions.
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), PalaverError> {
        self.objects
            .lock()
            .await
            .insert((bucket.to_string(), key.to_string()), bytes);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, PalaverError> {
        Ok(self
            .objects
            .lock()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, PalaverError> {
        Ok(self
            .objects
            .lock()
            .await
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), PalaverError> {
        self.objects
            .lock()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}
