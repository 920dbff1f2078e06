// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Asynchronous transcription service contract.
//!
//! The service is job-based: submit once, poll until a terminal state, then
//! fetch the transcript from the result URI. Job submission is never retried
//! by callers since a duplicate upload double-bills the service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PalaverError;

/// Parameters for submitting one transcription job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionRequest {
    /// Caller-chosen unique job name.
    pub job_id: String,
    /// URI of the persisted audio object.
    pub source_uri: String,
    /// Source language code (e.g. `es-US`).
    pub language_code: String,
    /// Audio codec/container format understood by the service.
    pub format: String,
}

/// Service-side job status as reported by one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPoll {
    /// Accepted, not yet started.
    Pending,
    /// Actively transcribing.
    InProgress,
    /// Terminal: transcript available at the given URI.
    Completed { result_uri: String },
    /// Terminal: job failed on the service side.
    Failed { reason: String },
}

impl JobPoll {
    /// Whether no further transition will occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPoll::Completed { .. } | JobPoll::Failed { .. })
    }
}

/// Client for the external speech-to-text service.
#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    /// Submit a job. Single attempt; callers must not retry.
    async fn start(&self, request: &TranscriptionRequest) -> Result<(), PalaverError>;

    /// Poll the current status of a previously submitted job.
    async fn poll(&self, job_id: &str) -> Result<JobPoll, PalaverError>;

    /// Fetch and parse the transcript text from a completed job's result URI.
    async fn fetch_transcript(&self, result_uri: &str) -> Result<String, PalaverError>;
}
