// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob persistence layer for the Palaver webhook bridge.
//!
//! Implements the [`BlobStore`](palaver_core::BlobStore) contract over the
//! local filesystem. History documents, session backups, and persisted media
//! all go through this store under purpose-namespaced keys.

pub mod fs;

pub use fs::FsBlobStore;
