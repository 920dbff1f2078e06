// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths, sane bounds, and cross-field
//! requirements.

use crate::diagnostic::ConfigError;
use crate::model::PalaverConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PalaverConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    if config.storage.root.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.root must not be empty".to_string(),
        });
    }

    if config.storage.bucket.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.bucket must not be empty".to_string(),
        });
    }

    if config.history.backup_keep == 0 {
        errors.push(ConfigError::Validation {
            message: "history.backup_keep must be at least 1".to_string(),
        });
    }

    if config.history.recent_window == 0 {
        errors.push(ConfigError::Validation {
            message: "history.recent_window must be at least 1".to_string(),
        });
    }

    if config.transcribe.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "transcribe.max_attempts must be at least 1".to_string(),
        });
    }

    if config.transcribe.poll_interval_ms < 100 {
        errors.push(ConfigError::Validation {
            message: format!(
                "transcribe.poll_interval_ms must be at least 100, got {}",
                config.transcribe.poll_interval_ms
            ),
        });
    }

    if config.dispatch.soft_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatch.soft_limit must be at least 1".to_string(),
        });
    }

    if config.backend.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "backend.timeout_secs must be at least 1".to_string(),
        });
    }

    // Signature verification needs the signing key.
    if config.twilio.validate_signature && config.twilio.auth_token.is_none() {
        errors.push(ConfigError::Validation {
            message: "twilio.validate_signature requires twilio.auth_token".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
