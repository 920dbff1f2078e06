// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem-backed [`BlobStore`].
//!
//! Objects live at `{root}/{bucket}/{key}`; keys may contain `/` to form
//! subdirectories (`history/wa:123.json`, `uploads/2026/08/...`). The store
//! is intentionally non-transactional: a put is one whole-file write, and
//! read-modify-write coordination belongs to the caller.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use palaver_core::{BlobStore, PalaverError};

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve and validate the path for a bucket/key pair.
    ///
    /// Rejects empty and traversal-prone segments so a hostile key can never
    /// escape the root directory.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, PalaverError> {
        if bucket.is_empty() || key.is_empty() {
            return Err(PalaverError::Internal(
                "blob bucket and key must be non-empty".to_string(),
            ));
        }
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(PalaverError::Internal(format!(
                    "invalid blob key `{key}`"
                )));
            }
        }
        if bucket.contains('/') || bucket.contains("..") {
            return Err(PalaverError::Internal(format!(
                "invalid blob bucket `{bucket}`"
            )));
        }
        Ok(self.root.join(bucket).join(key))
    }

    fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PalaverError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(PalaverError::storage)?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(PalaverError::storage)?;
        debug!(bucket, key, size = bytes.len(), content_type, "blob written");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, PalaverError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PalaverError::storage(err)),
        }
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, PalaverError> {
        let base = self.bucket_path(bucket);
        if !base.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        collect_keys(&base, &mut keys).await?;
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), PalaverError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PalaverError::storage(err)),
        }
    }
}

/// Walk the bucket directory, pushing keys relative to `base`.
///
/// Iterative with an explicit stack; async recursion would need boxing.
async fn collect_keys(base: &Path, keys: &mut Vec<String>) -> Result<(), PalaverError> {
    let mut pending = vec![base.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current)
            .await
            .map_err(PalaverError::storage)?;
        while let Some(entry) = entries.next_entry().await.map_err(PalaverError::storage)? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(PalaverError::storage)?;
            if file_type.is_dir() {
                pending.push(path);
            } else if let Ok(relative) = path.strip_prefix(base) {
                keys.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
    }

    Ok(())
}
