// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Palaver configuration system.

use palaver_config::diagnostic::{suggest_key, ConfigError};
use palaver_config::model::{DedupFallback, PalaverConfig};
use palaver_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_palaver_config() {
    let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
log_level = "debug"

[twilio]
account_sid = "AC123"
auth_token = "tok-abc"
from_number = "whatsapp:+14155238886"

[cloud]
access_token = "EAAB123"
phone_number_id = "1098765"
verify_token = "hook-check"

[backend]
url = "http://backend.internal/generate"
timeout_secs = 20

[storage]
root = "/var/lib/palaver"
bucket = "prod"

[history]
context_turns = 12
backup_keep = 5

[dedup]
fallback = "content-hash"
window_secs = 300

[transcribe]
api_base = "http://stt.internal"
language = "en-US"
max_attempts = 30

[dispatch]
soft_limit = 280
delay_ms = 650
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.twilio.account_sid.as_deref(), Some("AC123"));
    assert_eq!(config.twilio.auth_token.as_deref(), Some("tok-abc"));
    assert_eq!(config.cloud.access_token.as_deref(), Some("EAAB123"));
    assert_eq!(config.cloud.verify_token.as_deref(), Some("hook-check"));
    assert_eq!(config.backend.url, "http://backend.internal/generate");
    assert_eq!(config.backend.timeout_secs, 20);
    assert_eq!(config.storage.root, "/var/lib/palaver");
    assert_eq!(config.storage.bucket, "prod");
    assert_eq!(config.history.context_turns, 12);
    assert_eq!(config.history.backup_keep, 5);
    assert_eq!(config.dedup.fallback, DedupFallback::ContentHash);
    assert_eq!(config.dedup.window_secs, 300);
    assert_eq!(config.transcribe.language, "en-US");
    assert_eq!(config.transcribe.max_attempts, 30);
    assert_eq!(config.dispatch.soft_limit, 280);
    assert_eq!(config.dispatch.delay_ms, 650);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert!(config.twilio.account_sid.is_none());
    assert!(config.cloud.access_token.is_none());
    assert_eq!(config.backend.timeout_secs, 15);
    assert_eq!(config.storage.bucket, "palaver");
    assert_eq!(config.history.context_turns, 20);
    assert_eq!(config.dedup.fallback, DedupFallback::Off);
    assert_eq!(config.transcribe.language, "es-US");
    assert_eq!(config.dispatch.soft_limit, 300);
    assert!(!config.replies.transcription_fallback.is_empty());
    assert!(!config.replies.backend_failure.is_empty());
}

/// Unknown field in a section is rejected by deny_unknown_fields.
#[test]
fn unknown_field_in_twilio_produces_error() {
    let toml = r#"
[twilio]
auth_tokn = "abc"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("auth_tokn"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err =
        load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Dotted-key overrides (as produced by the env provider) take precedence.
#[test]
fn override_takes_precedence_over_toml() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let toml_content = r#"
[server]
port = 8080
"#;

    let config: PalaverConfig = Figment::new()
        .merge(Serialized::defaults(PalaverConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("server.port", 9999))
        .extract()
        .expect("should merge override");

    assert_eq!(config.server.port, 9999);
}

/// PALAVER_TWILIO_AUTH_TOKEN maps to twilio.auth_token (not twilio.auth.token).
#[test]
fn dotted_override_maps_underscore_keys() {
    use figment::{providers::Serialized, Figment};

    let config: PalaverConfig = Figment::new()
        .merge(Serialized::defaults(PalaverConfig::default()))
        .merge(("twilio.auth_token", "tok-from-env"))
        .extract()
        .expect("should set auth_token via dot notation");

    assert_eq!(config.twilio.auth_token.as_deref(), Some("tok-from-env"));
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: PalaverConfig = Figment::new()
        .merge(Serialized::defaults(PalaverConfig::default()))
        .merge(Toml::file("/nonexistent/path/palaver.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.server.port, 8080);
}

/// Unknown key produces a suggestion via fuzzy matching.
#[test]
fn diagnostic_error_includes_unknown_key() {
    let toml = r#"
[server]
prot = 9000
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    assert!(!errors.is_empty());

    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys } if {
            key == "prot"
                && suggestion.as_deref() == Some("port")
                && valid_keys.contains("host")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'prot' with suggestion 'port', got: {errors:?}"
    );
}

/// Distant typos do not get a suggestion.
#[test]
fn diagnostic_no_suggestion_for_distant_typo() {
    let suggestion = suggest_key("zzzzzz", &["host", "port", "log_level"]);
    assert!(suggestion.is_none());
}

/// Invalid type (string where number expected) produces a clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[server]
port = "not_a_number"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("port"),
        "error should mention type mismatch, got: {err_str}"
    );
}

/// Validation catches semantic errors after successful deserialization.
#[test]
fn validation_catches_zero_max_attempts() {
    let toml = r#"
[transcribe]
max_attempts = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero attempts should fail");
    let has_validation_error = errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("max_attempts"))
    });
    assert!(has_validation_error);
}

/// load_and_validate_str with valid TOML returns Ok config.
#[test]
fn load_and_validate_valid_toml() {
    let toml = r#"
[server]
port = 8081
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.server.port, 8081);
}
