// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Palaver webhook bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Palaver configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PalaverConfig {
    /// HTTP server bind settings and log level.
    #[serde(default)]
    pub server: ServerConfig,

    /// Twilio webhook and outbound send settings.
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// WhatsApp Cloud API webhook and outbound send settings.
    #[serde(default)]
    pub cloud: CloudConfig,

    /// Generation backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Blob storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Conversation history window and backup retention.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Deduplication behavior for events without a provider message id.
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Transcription service settings.
    #[serde(default)]
    pub transcribe: TranscribeConfig,

    /// Outbound reply splitting and pacing.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Fixed user-facing fallback replies.
    #[serde(default)]
    pub replies: RepliesConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Twilio provider configuration.
///
/// `auth_token` doubles as the signing key for `X-Twilio-Signature`
/// verification when `validate_signature` is enabled.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TwilioConfig {
    /// Account SID used for basic-auth media fetch and outbound sends.
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Auth token paired with the account SID.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sender number for outbound messages (e.g. `whatsapp:+14155238886`).
    #[serde(default)]
    pub from_number: Option<String>,

    /// API base URL, overridable for tests.
    #[serde(default = "default_twilio_api_base")]
    pub api_base: String,

    /// Reject webhook requests whose `X-Twilio-Signature` does not verify.
    #[serde(default)]
    pub validate_signature: bool,

    /// Public URL of the webhook endpoint as Twilio sees it, required for
    /// signature verification behind proxies.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_number: None,
            api_base: default_twilio_api_base(),
            validate_signature: false,
            webhook_url: None,
        }
    }
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com/2010-04-01".to_string()
}

/// WhatsApp Cloud API provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CloudConfig {
    /// Bearer token for Graph API calls.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Phone number id used in outbound send URLs.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Token echoed during the GET webhook verification handshake.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// App secret for `X-Hub-Signature-256` verification; unset skips the check.
    #[serde(default)]
    pub app_secret: Option<String>,

    /// Graph API base URL, overridable for tests.
    #[serde(default = "default_graph_base")]
    pub graph_base: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            verify_token: None,
            app_secret: None,
            graph_base: default_graph_base(),
        }
    }
}

fn default_graph_base() -> String {
    "https://graph.facebook.com/v19.0".to_string()
}

/// Generation backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Endpoint receiving `{input, history, phone, user_id}`.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Hard timeout for one backend call.
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_secs: default_backend_timeout_secs(),
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:9090/generate".to_string()
}

fn default_backend_timeout_secs() -> u64 {
    15
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Root directory of the filesystem blob store.
    #[serde(default = "default_storage_root")]
    pub root: String,

    /// Bucket name; history, backup, and upload keys live under it.
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            bucket: default_bucket(),
        }
    }
}

fn default_storage_root() -> String {
    "./data".to_string()
}

fn default_bucket() -> String {
    "palaver".to_string()
}

/// Conversation history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Read-time window of turns passed downstream; the durable log is unbounded.
    #[serde(default = "default_context_turns")]
    pub context_turns: usize,

    /// How many recent turns the dedup guard inspects.
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,

    /// Snapshots retained per user; older ones are evicted.
    #[serde(default = "default_backup_keep")]
    pub backup_keep: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            context_turns: default_context_turns(),
            recent_window: default_recent_window(),
            backup_keep: default_backup_keep(),
        }
    }
}

fn default_context_turns() -> usize {
    20
}

fn default_recent_window() -> usize {
    10
}

fn default_backup_keep() -> usize {
    3
}

/// Fallback strategy when a provider supplies no message id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupFallback {
    /// Skip deduplication entirely for id-less events.
    #[default]
    Off,
    /// Treat an identical text hash within the time window as a duplicate.
    ContentHash,
}

/// Deduplication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DedupConfig {
    /// Behavior for events without a provider message id.
    #[serde(default)]
    pub fallback: DedupFallback,

    /// Time window for the content-hash fallback.
    #[serde(default = "default_dedup_window_secs")]
    pub window_secs: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            fallback: DedupFallback::default(),
            window_secs: default_dedup_window_secs(),
        }
    }
}

fn default_dedup_window_secs() -> u64 {
    600
}

/// Transcription service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TranscribeConfig {
    /// Base URL of the transcription job API.
    #[serde(default = "default_transcribe_api_base")]
    pub api_base: String,

    /// Bearer token for the job API, if required.
    #[serde(default)]
    pub token: Option<String>,

    /// Source language submitted with each job.
    #[serde(default = "default_language")]
    pub language: String,

    /// Poll interval between job status checks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Bounded number of polls before the job is abandoned as timed out.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            api_base: default_transcribe_api_base(),
            token: None,
            language: default_language(),
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_transcribe_api_base() -> String {
    "http://127.0.0.1:8300".to_string()
}

fn default_language() -> String {
    "es-US".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1500
}

fn default_max_attempts() -> u32 {
    40
}

/// Outbound dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Soft per-fragment character limit.
    #[serde(default = "default_soft_limit")]
    pub soft_limit: usize,

    /// Delay between consecutive fragments; not applied after the last.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            soft_limit: default_soft_limit(),
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_soft_limit() -> usize {
    300
}

fn default_delay_ms() -> u64 {
    700
}

/// Fixed user-facing replies for degraded paths.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RepliesConfig {
    /// Sent when audio could not be transcribed.
    #[serde(default = "default_transcription_fallback")]
    pub transcription_fallback: String,

    /// Sent when the generation backend is unreachable or times out.
    #[serde(default = "default_backend_failure")]
    pub backend_failure: String,
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self {
            transcription_fallback: default_transcription_fallback(),
            backend_failure: default_backend_failure(),
        }
    }
}

fn default_transcription_fallback() -> String {
    "Sorry, I couldn't make out that audio. Could you type it instead?".to_string()
}

fn default_backend_failure() -> String {
    "We're having a technical problem right now. Please try again in a moment.".to_string()
}
