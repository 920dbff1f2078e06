// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP implementation of the [`TranscriptionClient`] contract.
//!
//! Job lifecycle against the service API:
//! - `POST {base}/jobs` submits a job,
//! - `GET {base}/jobs/{id}` reports `{status, result_uri?, failure_reason?}`,
//! - the transcript itself is a plain GET of the result URI returning
//!   `results.transcripts[0].transcript`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use palaver_core::{JobPoll, PalaverError, TranscriptionClient, TranscriptionRequest};

/// Client for the transcription job API.
#[derive(Debug, Clone)]
pub struct HttpTranscriptionClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    status: String,
    #[serde(default)]
    result_uri: Option<String>,
    #[serde(default)]
    failure_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptDocument {
    #[serde(default)]
    results: TranscriptResults,
}

#[derive(Debug, Default, Deserialize)]
struct TranscriptResults {
    #[serde(default)]
    transcripts: Vec<TranscriptEntry>,
}

#[derive(Debug, Deserialize)]
struct TranscriptEntry {
    #[serde(default)]
    transcript: String,
}

impl HttpTranscriptionClient {
    pub fn new(api_base: String, token: Option<String>) -> Result<Self, PalaverError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PalaverError::Transcription {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            api_base,
            token,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl TranscriptionClient for HttpTranscriptionClient {
    async fn start(&self, request: &TranscriptionRequest) -> Result<(), PalaverError> {
        let url = format!("{}/jobs", self.api_base);
        let response = self
            .authorized(self.client.post(&url))
            .json(request)
            .send()
            .await
            .map_err(|e| PalaverError::Transcription {
                message: format!("job submission failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PalaverError::Transcription {
                message: format!("job submission returned {status}: {body}"),
                source: None,
            });
        }

        debug!(job_id = %request.job_id, format = %request.format, "transcription job submitted");
        Ok(())
    }

    async fn poll(&self, job_id: &str) -> Result<JobPoll, PalaverError> {
        let url = format!("{}/jobs/{job_id}", self.api_base);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| PalaverError::Transcription {
                message: format!("job poll failed: {e}"),
                source: Some(Box::new(e)),
            })?
            .error_for_status()
            .map_err(|e| PalaverError::Transcription {
                message: format!("job poll rejected: {e}"),
                source: Some(Box::new(e)),
            })?;

        let body: JobStatusResponse =
            response.json().await.map_err(|e| PalaverError::Transcription {
                message: format!("job poll body unparseable: {e}"),
                source: Some(Box::new(e)),
            })?;

        match body.status.to_ascii_lowercase().as_str() {
            "pending" | "queued" => Ok(JobPoll::Pending),
            "in_progress" | "running" => Ok(JobPoll::InProgress),
            "completed" => {
                let result_uri = body.result_uri.ok_or_else(|| PalaverError::Transcription {
                    message: "completed job reported no result_uri".to_string(),
                    source: None,
                })?;
                Ok(JobPoll::Completed { result_uri })
            }
            "failed" => Ok(JobPoll::Failed {
                reason: body
                    .failure_reason
                    .unwrap_or_else(|| "unspecified".to_string()),
            }),
            other => Err(PalaverError::Transcription {
                message: format!("job reported unknown status `{other}`"),
                source: None,
            }),
        }
    }

    async fn fetch_transcript(&self, result_uri: &str) -> Result<String, PalaverError> {
        // Result URIs are pre-signed; no auth header.
        let response = self
            .client
            .get(result_uri)
            .send()
            .await
            .map_err(|e| PalaverError::Transcription {
                message: format!("transcript fetch failed: {e}"),
                source: Some(Box::new(e)),
            })?
            .error_for_status()
            .map_err(|e| PalaverError::Transcription {
                message: format!("transcript fetch rejected: {e}"),
                source: Some(Box::new(e)),
            })?;

        let document: TranscriptDocument =
            response.json().await.map_err(|e| PalaverError::Transcription {
                message: format!("transcript body unparseable: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(document
            .results
            .transcripts
            .into_iter()
            .next()
            .map(|entry| entry.transcript)
            .unwrap_or_default())
    }
}
