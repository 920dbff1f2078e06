// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Palaver integration tests.
//!
//! In-memory doubles for the two external seams: blob storage and the
//! transcription service. Fast, deterministic, CI-runnable.

pub mod memory_blob;
pub mod mock_transcription;

pub use memory_blob::MemoryBlobStore;
pub use mock_transcription::MockTranscriptionClient;
