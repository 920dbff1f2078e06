// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP handlers for the webhook routes.
//!
//! POST /webhook acknowledges every non-fatal outcome with 200 so providers
//! do not retry deliveries the pipeline already absorbed. 400 is reserved
//! for requests with no resolvable identity at all, 403 for signature
//! failures, and 500 for unexpected internal errors.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use palaver_wire::{detect, resolve, SourceKind};

use crate::pipeline;
use crate::server::GatewayState;
use crate::signature;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Small JSON acknowledgment for Cloud deliveries.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub status: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Empty TwiML document: receipt acknowledged, no immediate reply content.
const TWIML_ACK: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response></Response>";

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /webhook
///
/// Cloud verification handshake: echo `hub.challenge` when `hub.mode` is
/// `subscribe` and `hub.verify_token` matches the configured token.
pub async fn get_webhook_verify(
    State(state): State<GatewayState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token");
    let challenge = params.get("hub.challenge");

    match (mode, token, challenge, &state.config.cloud.verify_token) {
        (Some("subscribe"), Some(token), Some(challenge), Some(expected)) if token == expected => {
            (StatusCode::OK, challenge.clone()).into_response()
        }
        _ => {
            warn!("webhook verification handshake rejected");
            (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: "verification failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /webhook
///
/// The single inbound entry point for both providers.
pub async fn post_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    if let Err(rejection) = check_signature(&state, &headers, content_type, &body) {
        return rejection;
    }

    let event = detect(&body, content_type);
    let user = resolve(&event);
    if user.is_anon() {
        warn!(source = %event.source, "request carried no resolvable identity");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "no sender identity in request".to_string(),
            }),
        )
            .into_response();
    }

    match pipeline::handle_event(&state, &event, &user).await {
        Ok(_outcome) => ack_for(event.source),
        Err(err) => {
            error!(user = %user, error = %err, "pipeline failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal error".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Verify the provider signature matching the body shape, when configured.
fn check_signature(
    state: &GatewayState,
    headers: &HeaderMap,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<(), Response> {
    let is_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);

    if is_json {
        if let Some(secret) = &state.config.cloud.app_secret {
            let header = headers
                .get("x-hub-signature-256")
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();
            if !signature::verify_cloud(secret, body, header) {
                warn!("cloud webhook signature rejected");
                return Err(signature_rejection());
            }
        }
        return Ok(());
    }

    if state.config.twilio.validate_signature {
        match (
            &state.config.twilio.auth_token,
            &state.config.twilio.webhook_url,
        ) {
            (Some(token), Some(url)) => {
                let header = headers
                    .get("x-twilio-signature")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default();
                if !signature::verify_twilio(token, url, body, header) {
                    warn!("twilio webhook signature rejected");
                    return Err(signature_rejection());
                }
            }
            _ => {
                warn!("twilio signature validation enabled without auth token and webhook URL, skipping");
            }
        }
    }

    Ok(())
}

fn signature_rejection() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse {
            error: "invalid signature".to_string(),
        }),
    )
        .into_response()
}

/// Channel-appropriate 200 acknowledgment.
fn ack_for(source: SourceKind) -> Response {
    match source {
        SourceKind::Cloud => (
            StatusCode::OK,
            Json(AckResponse {
                status: "received".to_string(),
            }),
        )
            .into_response(),
        SourceKind::Twilio | SourceKind::Recovered => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/xml")],
            TWIML_ACK,
        )
            .into_response(),
    }
}
