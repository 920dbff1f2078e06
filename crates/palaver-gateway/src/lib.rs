// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook gateway for the Palaver bridge.
//!
//! Serves the inbound webhook for both providers over one route, verifies
//! signatures when configured, runs each delivery through the end-to-end
//! pipeline (normalize, transcribe, dedup, persist, generate, dispatch), and
//! acknowledges with the channel-appropriate body so providers do not retry.

pub mod backend;
pub mod handlers;
pub mod pipeline;
pub mod server;
pub mod signature;

pub use backend::BackendClient;
pub use pipeline::{handle_event, PipelineOutcome};
pub use server::{build_router, build_state, start_server, GatewayState};
