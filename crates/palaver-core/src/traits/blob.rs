// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable blob store contract.
//!
//! Keys are namespaced by purpose within a bucket: `history/{user}.json`,
//! `backups/{user}/{timestamp}.json`, `uploads/{yyyy}/{mm}/{user}/{uuid}.{ext}`.
//! The store is deliberately non-transactional; callers own any
//! read-modify-write coordination.

use async_trait::async_trait;

use crate::error::PalaverError;

/// Storage backend for session history, backups, and persisted media.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write an object, overwriting any existing value under the key.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PalaverError>;

    /// Read an object. A missing key is `Ok(None)`, not an error.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, PalaverError>;

    /// List keys under a prefix, in ascending lexicographic order.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, PalaverError>;

    /// Delete an object. Deleting a missing key is a no-op.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), PalaverError>;
}

/// Render the canonical URI for an object, used in [`MediaReference`]s and
/// transcription job submissions.
///
/// [`MediaReference`]: crate::types::MediaReference
pub fn blob_uri(bucket: &str, key: &str) -> String {
    format!("blob://{bucket}/{key}")
}
