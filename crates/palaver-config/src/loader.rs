// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./palaver.toml` > `~/.config/palaver/palaver.toml`
//! > `/etc/palaver/palaver.toml` with environment variable overrides via the
//! `PALAVER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PalaverConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/palaver/palaver.toml` (system-wide)
/// 3. `~/.config/palaver/palaver.toml` (user XDG config)
/// 4. `./palaver.toml` (local directory)
/// 5. `PALAVER_*` environment variables
pub fn load_config() -> Result<PalaverConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PalaverConfig::default()))
        .merge(Toml::file("/etc/palaver/palaver.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("palaver/palaver.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("palaver.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<PalaverConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PalaverConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PalaverConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PalaverConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `PALAVER_TWILIO_AUTH_TOKEN` must map to
/// `twilio.auth_token`, not `twilio.auth.token`.
fn env_provider() -> Env {
    Env::prefixed("PALAVER_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: PALAVER_TWILIO_AUTH_TOKEN -> "twilio_auth_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("twilio_", "twilio.", 1)
            .replacen("cloud_", "cloud.", 1)
            .replacen("backend_", "backend.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("history_", "history.", 1)
            .replacen("dedup_", "dedup.", 1)
            .replacen("transcribe_", "transcribe.", 1)
            .replacen("dispatch_", "dispatch.", 1)
            .replacen("replies_", "replies.", 1);
        mapped.into()
    })
}
