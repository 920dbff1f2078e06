// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end transcription of one audio attachment within one request.
//!
//! Download -> durable persist -> single job submission -> bounded poll ->
//! transcript fetch. The job is ephemeral: nothing about it survives the
//! request, and a job that outlives the poll budget is abandoned, not
//! cancelled (the service offers no cancellation).
//!
//! Failure semantics: download and persist get one inline retry each (inside
//! [`MediaFetcher`] and here); submission is a single attempt because a
//! duplicate upload double-bills the service. Any terminal outcome without
//! usable text yields `None`, which the caller maps to a fallback reply.

use std::sync::Arc;

use chrono::Datelike;
use strum::Display;
use tracing::{debug, info, warn};
use uuid::Uuid;

use palaver_core::traits::blob::blob_uri;
use palaver_core::{
    BlobStore, JobPoll, MediaReference, PalaverError, TranscriptionClient, TranscriptionRequest,
    UserKey,
};
use palaver_resilience::{poll_until, retry_once, PollOutcome, PollPolicy};
use palaver_wire::MediaDescriptor;

use crate::fetch::MediaFetcher;
use crate::formats;

/// Orchestrator settings derived from config.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Blob bucket for persisted uploads.
    pub bucket: String,
    /// Language code submitted with every job.
    pub language: String,
    /// Poll pacing and budget.
    pub poll: PollPolicy,
}

/// Terminal disposition of one transcription job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    TimedOut,
}

/// Ephemeral per-request job record. Discarded after resolution; never
/// retried across invocations.
#[derive(Debug, Clone)]
pub struct TranscriptionJob {
    pub job_id: String,
    pub source_uri: String,
    pub format: String,
    pub status: JobStatus,
    /// Trimmed transcript on success; `None` covers failure, timeout, and
    /// the empty-transcript case (recoverable, not a job failure).
    pub result_text: Option<String>,
    pub failure_reason: Option<String>,
}

/// Result of transcribing one audio attachment.
#[derive(Debug, Clone)]
pub struct TranscribedAudio {
    /// The durably persisted media, referenced by the user turn.
    pub media: MediaReference,
    /// Transcript text, or `None` when the caller should substitute the
    /// fallback reply.
    pub text: Option<String>,
}

/// Turns one audio media descriptor into text, end to end.
pub struct Orchestrator {
    fetcher: MediaFetcher,
    store: Arc<dyn BlobStore>,
    client: Arc<dyn TranscriptionClient>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        fetcher: MediaFetcher,
        store: Arc<dyn BlobStore>,
        client: Arc<dyn TranscriptionClient>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            fetcher,
            store,
            client,
            config,
        }
    }

    /// Download, persist, and transcribe one audio attachment.
    ///
    /// Errors only when the media never made it into durable storage; once a
    /// [`MediaReference`] exists, every job outcome is folded into
    /// `text: None` instead of an error.
    pub async fn transcribe_audio(
        &self,
        user: &UserKey,
        descriptor: &MediaDescriptor,
    ) -> Result<TranscribedAudio, PalaverError> {
        let bytes = self.fetcher.fetch(descriptor).await?;
        let media = self.persist(user, descriptor, bytes).await?;
        let job = self.run_job(&media).await;

        if let Some(reason) = &job.failure_reason {
            warn!(job_id = %job.job_id, status = %job.status, reason = %reason, "transcription unusable");
        }

        Ok(TranscribedAudio {
            media,
            text: job.result_text,
        })
    }

    /// Persist downloaded bytes under a per-user, randomly-keyed upload path.
    async fn persist(
        &self,
        user: &UserKey,
        descriptor: &MediaDescriptor,
        bytes: Vec<u8>,
    ) -> Result<MediaReference, PalaverError> {
        let now = chrono::Utc::now();
        let extension = formats::extension_for(&descriptor.content_type);
        let key = format!(
            "uploads/{:04}/{:02}/{}/{}.{extension}",
            now.year(),
            now.month(),
            user,
            Uuid::new_v4()
        );
        let size = bytes.len() as u64;

        retry_once(|| {
            self.store
                .put(&self.config.bucket, &key, bytes.clone(), &descriptor.content_type)
        })
        .await?;

        debug!(key = %key, size, "media persisted");
        Ok(MediaReference {
            uri: blob_uri(&self.config.bucket, &key),
            content_type: descriptor.content_type.clone(),
            size,
        })
    }

    /// Submit and poll one job to a terminal state.
    pub async fn run_job(&self, media: &MediaReference) -> TranscriptionJob {
        let extension = media.uri.rsplit('.').next().unwrap_or_default();
        let request = TranscriptionRequest {
            job_id: format!("palaver-{}", Uuid::new_v4()),
            source_uri: media.uri.clone(),
            language_code: self.config.language.clone(),
            format: formats::format_for_extension(extension).to_string(),
        };

        let mut job = TranscriptionJob {
            job_id: request.job_id.clone(),
            source_uri: request.source_uri.clone(),
            format: request.format.clone(),
            status: JobStatus::Pending,
            result_text: None,
            failure_reason: None,
        };

        // Single submission attempt. A retry here would upload the audio
        // twice and double-bill the transcription service.
        if let Err(err) = self.client.start(&request).await {
            job.status = JobStatus::Failed;
            job.failure_reason = Some(err.to_string());
            return job;
        }
        job.status = JobStatus::InProgress;

        let outcome = poll_until(
            self.config.poll,
            |_attempt| {
                let client = self.client.clone();
                let job_id = request.job_id.clone();
                async move { client.poll(&job_id).await }
            },
            JobPoll::is_terminal,
        )
        .await;

        match outcome {
            Err(err) => {
                job.status = JobStatus::Failed;
                job.failure_reason = Some(err.to_string());
            }
            Ok(PollOutcome::Exhausted) => {
                job.status = JobStatus::TimedOut;
                job.failure_reason = Some(format!(
                    "no terminal state after {} polls",
                    self.config.poll.max_attempts
                ));
            }
            Ok(PollOutcome::Terminal(JobPoll::Failed { reason })) => {
                job.status = JobStatus::Failed;
                job.failure_reason = Some(reason);
            }
            Ok(PollOutcome::Terminal(JobPoll::Completed { result_uri })) => {
                job.status = JobStatus::Completed;
                match self.client.fetch_transcript(&result_uri).await {
                    Ok(text) => {
                        let trimmed = text.trim();
                        if trimmed.is_empty() {
                            // Recoverable: the job succeeded but heard nothing.
                            job.failure_reason = Some("empty transcript".to_string());
                        } else {
                            info!(job_id = %job.job_id, chars = trimmed.len(), "transcription completed");
                            job.result_text = Some(trimmed.to_string());
                        }
                    }
                    Err(err) => {
                        job.status = JobStatus::Failed;
                        job.failure_reason = Some(err.to_string());
                    }
                }
            }
            Ok(PollOutcome::Terminal(other)) => {
                // is_terminal admits only Completed/Failed; anything else is
                // a contract violation on the client side.
                job.status = JobStatus::Failed;
                job.failure_reason = Some(format!("non-terminal state reported terminal: {other:?}"));
            }
        }

        job
    }
}
