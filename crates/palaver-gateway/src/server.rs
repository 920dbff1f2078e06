// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Assembles the shared pipeline state from configuration and serves the
//! webhook routes. The blob store and transcription client are injected so
//! the binary can wire real backends while tests use in-memory fakes.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use palaver_config::model::ServerConfig;
use palaver_config::PalaverConfig;
use palaver_core::{BlobStore, PalaverError, TranscriptionClient};
use palaver_dispatch::{CloudSender, Dispatcher, ReplyTransport, TwilioSender};
use palaver_history::{dedup::DedupPolicy, HistoryStore, UserLocks};
use palaver_resilience::PollPolicy;
use palaver_transcribe::{FetchAuth, MediaFetcher, Orchestrator, OrchestratorConfig};
use palaver_wire::SourceKind;

use crate::backend::BackendClient;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<PalaverConfig>,
    pub history: HistoryStore,
    pub locks: Arc<UserLocks>,
    pub dedup: DedupPolicy,
    pub orchestrator: Arc<Orchestrator>,
    pub backend: BackendClient,
    pub dispatcher: Dispatcher,
    pub twilio: Option<Arc<TwilioSender>>,
    pub cloud: Option<Arc<CloudSender>>,
}

impl GatewayState {
    /// The outbound transport matching an event's originating provider.
    ///
    /// Recovered payloads arrived over the form webhook, so they reply
    /// through Twilio.
    pub(crate) fn transport_for(&self, source: SourceKind) -> Option<Arc<dyn ReplyTransport>> {
        match source {
            SourceKind::Cloud => self
                .cloud
                .clone()
                .map(|sender| sender as Arc<dyn ReplyTransport>),
            SourceKind::Twilio | SourceKind::Recovered => self
                .twilio
                .clone()
                .map(|sender| sender as Arc<dyn ReplyTransport>),
        }
    }
}

/// Build the gateway state from configuration and injected backends.
pub fn build_state(
    config: PalaverConfig,
    store: Arc<dyn BlobStore>,
    transcription: Arc<dyn TranscriptionClient>,
) -> Result<GatewayState, PalaverError> {
    let fetcher = MediaFetcher::new(FetchAuth {
        twilio_account_sid: config.twilio.account_sid.clone(),
        twilio_auth_token: config.twilio.auth_token.clone(),
        cloud_access_token: config.cloud.access_token.clone(),
        graph_base: config.cloud.graph_base.clone(),
    })?;
    let orchestrator = Orchestrator::new(
        fetcher,
        store.clone(),
        transcription,
        OrchestratorConfig {
            bucket: config.storage.bucket.clone(),
            language: config.transcribe.language.clone(),
            poll: PollPolicy::new(
                Duration::from_millis(config.transcribe.poll_interval_ms),
                config.transcribe.max_attempts,
            ),
        },
    );

    let history = HistoryStore::new(
        store,
        config.storage.bucket.clone(),
        config.history.context_turns,
        config.history.backup_keep,
    );
    let dedup = DedupPolicy::new(
        config.history.recent_window,
        config.dedup.fallback,
        config.dedup.window_secs,
    );
    let backend = BackendClient::new(
        config.backend.url.clone(),
        Duration::from_secs(config.backend.timeout_secs),
    )?;
    let dispatcher = Dispatcher::new(
        config.dispatch.soft_limit,
        Duration::from_millis(config.dispatch.delay_ms),
    );

    let twilio = match (
        &config.twilio.account_sid,
        &config.twilio.auth_token,
        &config.twilio.from_number,
    ) {
        (Some(sid), Some(token), Some(from)) => Some(Arc::new(TwilioSender::new(
            config.twilio.api_base.clone(),
            sid,
            token,
            from,
        )?)),
        _ => None,
    };
    let cloud = match (&config.cloud.access_token, &config.cloud.phone_number_id) {
        (Some(token), Some(id)) => Some(Arc::new(CloudSender::new(
            config.cloud.graph_base.clone(),
            id,
            token,
        )?)),
        _ => None,
    };

    Ok(GatewayState {
        config: Arc::new(config),
        history,
        locks: Arc::new(UserLocks::new()),
        dedup,
        orchestrator: Arc::new(orchestrator),
        backend,
        dispatcher,
        twilio,
        cloud,
    })
}

/// Build the webhook router over the shared state.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route(
            "/webhook",
            get(handlers::get_webhook_verify).post(handlers::post_webhook),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve the gateway until the process is stopped.
pub async fn start_server(server: &ServerConfig, state: GatewayState) -> Result<(), PalaverError> {
    let app = build_router(state);

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PalaverError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| PalaverError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(config: PalaverConfig) -> GatewayState {
        build_state(
            config,
            Arc::new(palaver_test_utils::MemoryBlobStore::new()),
            Arc::new(palaver_test_utils::MockTranscriptionClient::new()),
        )
        .unwrap()
    }

    #[test]
    fn default_config_builds_without_senders() {
        let state = state_with(PalaverConfig::default());
        assert!(state.twilio.is_none());
        assert!(state.cloud.is_none());
        assert!(state.transport_for(SourceKind::Twilio).is_none());
    }

    #[test]
    fn configured_providers_get_transports() {
        let mut config = PalaverConfig::default();
        config.twilio.account_sid = Some("AC1".into());
        config.twilio.auth_token = Some("tok".into());
        config.twilio.from_number = Some("whatsapp:+1".into());
        config.cloud.access_token = Some("cloud-tok".into());
        config.cloud.phone_number_id = Some("10987".into());

        let state = state_with(config);
        assert!(state.transport_for(SourceKind::Twilio).is_some());
        assert!(state.transport_for(SourceKind::Recovered).is_some());
        assert!(state.transport_for(SourceKind::Cloud).is_some());
    }
}
