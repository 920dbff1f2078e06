// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session persistence for the Palaver webhook bridge.
//!
//! A per-user ordered turn log stored whole in the blob store, with
//! snapshot backups for disaster recovery, provider-redelivery
//! deduplication, and per-user single-writer serialization.

pub mod backup;
pub mod dedup;
pub mod locks;
pub mod store;

pub use dedup::{is_duplicate, DedupPolicy};
pub use locks::UserLocks;
pub use store::HistoryStore;
