// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `serve` subcommand: wire the real backends and run the gateway.

use std::sync::Arc;

use palaver_config::PalaverConfig;
use palaver_core::PalaverError;
use palaver_gateway::{build_state, start_server};
use palaver_storage::FsBlobStore;
use palaver_transcribe::HttpTranscriptionClient;

/// Run the webhook bridge until the process is stopped.
pub async fn run(config: PalaverConfig) -> Result<(), PalaverError> {
    let store = Arc::new(FsBlobStore::new(config.storage.root.clone()));
    let transcription = Arc::new(HttpTranscriptionClient::new(
        config.transcribe.api_base.clone(),
        config.transcribe.token.clone(),
    )?);

    let server = config.server.clone();
    let state = build_state(config, store, transcription)?;

    tracing::info!(
        twilio = state.twilio.is_some(),
        cloud = state.cloud.is_some(),
        "starting palaver webhook bridge"
    );
    start_server(&server, state).await
}
