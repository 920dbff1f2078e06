// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media transcription orchestration for the Palaver webhook bridge.
//!
//! Turns one inbound audio attachment into text within a single request
//! lifecycle: authenticated download from the originating provider, durable
//! persist into blob storage, one transcription job submission, and a
//! bounded poll to a terminal state.

pub mod client;
pub mod fetch;
pub mod formats;
pub mod orchestrator;

pub use client::HttpTranscriptionClient;
pub use fetch::{FetchAuth, MediaFetcher};
pub use orchestrator::{
    JobStatus, Orchestrator, OrchestratorConfig, TranscribedAudio, TranscriptionJob,
};
