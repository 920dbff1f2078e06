// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted [`TranscriptionClient`] for deterministic testing.
//!
//! Poll responses are popped from a FIFO queue, so tests can stage an exact
//! pending/in-progress/terminal sequence without a real service.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use palaver_core::{JobPoll, PalaverError, TranscriptionClient, TranscriptionRequest};

/// A transcription client that replays a scripted poll sequence.
#[derive(Clone, Default)]
pub struct MockTranscriptionClient {
    polls: Arc<Mutex<VecDeque<JobPoll>>>,
    transcript: Arc<Mutex<Option<String>>>,
    started: Arc<Mutex<Vec<TranscriptionRequest>>>,
    poll_count: Arc<AtomicU32>,
    fail_start: Arc<Mutex<Option<String>>>,
}

impl MockTranscriptionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the poll sequence. When the queue runs dry the last staged
    /// status repeats; an empty queue reports `InProgress` forever.
    pub async fn script_polls(&self, polls: Vec<JobPoll>) {
        *self.polls.lock().await = polls.into();
    }

    /// Set the transcript served for any result URI.
    pub async fn set_transcript(&self, text: impl Into<String>) {
        *self.transcript.lock().await = Some(text.into());
    }

    /// Make `start` fail with the given message.
    pub async fn fail_start(&self, message: impl Into<String>) {
        *self.fail_start.lock().await = Some(message.into());
    }

    /// Requests submitted so far.
    pub async fn started_jobs(&self) -> Vec<TranscriptionRequest> {
        self.started.lock().await.clone()
    }

    /// Number of polls performed.
    pub fn poll_count(&self) -> u32 {
        self.poll_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionClient for MockTranscriptionClient {
    async fn start(&self, request: &TranscriptionRequest) -> Result<(), PalaverError> {
        if let Some(message) = self.fail_start.lock().await.clone() {
            return Err(PalaverError::Transcription {
                message,
                source: None,
            });
        }
        self.started.lock().await.push(request.clone());
        Ok(())
    }

    async fn poll(&self, _job_id: &str) -> Result<JobPoll, PalaverError> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        let mut polls = self.polls.lock().await;
        match polls.len() {
            0 => Ok(JobPoll::InProgress),
            1 => Ok(polls.front().cloned().unwrap_or(JobPoll::InProgress)),
            _ => Ok(polls.pop_front().unwrap_or(JobPoll::InProgress)),
        }
    }

    async fn fetch_transcript(&self, _result_uri: &str) -> Result<String, PalaverError> {
        Ok(self.transcript.lock().await.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_polls_replay_in_order() {
        let client = MockTranscriptionClient::new();
        client
            .script_polls(vec![
                JobPoll::Pending,
                JobPoll::InProgress,
                JobPoll::Completed {
                    result_uri: "mock://result".into(),
                },
            ])
            .await;

        assert_eq!(client.poll("j").await.unwrap(), JobPoll::Pending);
        assert_eq!(client.poll("j").await.unwrap(), JobPoll::InProgress);
        let terminal = client.poll("j").await.unwrap();
        assert!(terminal.is_terminal());
        // The last staged status repeats.
        assert_eq!(client.poll("j").await.unwrap(), terminal);
        assert_eq!(client.poll_count(), 4);
    }

    #[tokio::test]
    async fn unscripted_client_stays_in_progress() {
        let client = MockTranscriptionClient::new();
        assert_eq!(client.poll("j").await.unwrap(), JobPoll::InProgress);
        assert_eq!(client.poll("j").await.unwrap(), JobPoll::InProgress);
    }

    #[tokio::test]
    async fn start_failure_is_scriptable() {
        let client = MockTranscriptionClient::new();
        client.fail_start("quota exceeded").await;
        let request = TranscriptionRequest {
            job_id: "j".into(),
            source_uri: "blob://b/k".into(),
            language_code: "es-US".into(),
            format: "ogg-opus".into(),
        };
        assert!(client.start(&request).await.is_err());
        assert!(client.started_jobs().await.is_empty());
    }
}
