// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Palaver webhook bridge.

use thiserror::Error;

/// The primary error type used across all Palaver crates.
///
/// Most failures in the inbound pipeline are deliberately non-fatal: wire
/// recovery exhaustion degrades to empty fields, transcription failures map
/// to a fallback reply, and per-fragment send failures never abort the
/// remaining fragments. The variants here exist so call sites can make those
/// decisions explicitly instead of panicking.
#[derive(Debug, Error)]
pub enum PalaverError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Blob store errors (I/O failure, serialization, invalid key).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Wire payload could not be decoded by any recovery strategy.
    #[error("wire recovery exhausted: {0}")]
    Wire(String),

    /// No sender identity could be resolved from the request.
    #[error("no sender identity in request")]
    IdentityMissing,

    /// Transcription job submission, polling, or result fetch failed.
    #[error("transcription error: {message}")]
    Transcription {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generation backend call failed or returned an unusable response.
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Outbound channel errors (send failure, provider rejection, media fetch).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation exceeded its bounded wait.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PalaverError {
    /// Wrap an I/O or serialization error as a storage error.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PalaverError::Storage {
            source: Box::new(source),
        }
    }

    /// Build a channel error with a source.
    pub fn channel<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PalaverError::Channel {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_variants_construct() {
        let _config = PalaverError::Config("test".into());
        let _storage = PalaverError::storage(std::io::Error::other("test"));
        let _wire = PalaverError::Wire("unrecognized body".into());
        let _identity = PalaverError::IdentityMissing;
        let _transcription = PalaverError::Transcription {
            message: "test".into(),
            source: None,
        };
        let _backend = PalaverError::Backend {
            message: "test".into(),
            source: None,
        };
        let _channel = PalaverError::channel("test", std::io::Error::other("test"));
        let _timeout = PalaverError::Timeout {
            duration: std::time::Duration::from_secs(60),
        };
        let _internal = PalaverError::Internal("test".into());
    }

    #[test]
    fn display_includes_message() {
        let err = PalaverError::Backend {
            message: "connection refused".into(),
            source: None,
        };
        assert!(err.to_string().contains("connection refused"));

        let err = PalaverError::Timeout {
            duration: std::time::Duration::from_secs(60),
        };
        assert!(err.to_string().contains("60"));
    }
}
