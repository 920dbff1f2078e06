// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for Palaver's external collaborators.
//!
//! The blob store and the transcription service are the two seams the
//! pipeline depends on through dynamic dispatch, so tests can swap in
//! in-memory fakes.

pub mod blob;
pub mod transcription;

pub use blob::BlobStore;
pub use transcription::{JobPoll, TranscriptionClient, TranscriptionRequest};
