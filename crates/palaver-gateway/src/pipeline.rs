// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The end-to-end inbound pipeline.
//!
//! One sequential pass per webhook delivery: extract the message (running
//! audio through the transcription orchestrator), serialize on the per-user
//! lock, dedup against the recent window, append the user turn, obtain a
//! reply (backend, or a fixed fallback on degraded paths), commit the reply,
//! snapshot, and dispatch fragments back out.
//!
//! After identity resolution every failure still produces SOME reply to the
//! user wherever a destination is known; only storage failures before the
//! user turn is committed abort the request.

use chrono::Utc;
use tracing::{debug, info, warn};

use palaver_core::{MediaReference, PalaverError, Turn, TurnMetadata, UserKey};
use palaver_history::is_duplicate;
use palaver_transcribe::TranscribedAudio;
use palaver_wire::{
    extract, external_message_id, origin_phone, provider_label, reply_destination,
    ExtractedMessage, WireEvent,
};

use crate::server::GatewayState;

/// What one pipeline pass did, for the handler's acknowledgment and logs.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub user: UserKey,
    /// The event was a provider redelivery; nothing was appended or sent.
    pub duplicate: bool,
    /// The reply text committed/sent, absent for duplicates.
    pub reply: Option<String>,
    /// Fragments actually delivered to the provider.
    pub fragments_sent: usize,
}

/// The user's input after media handling: the text that stands in for what
/// they said, and whether transcription had to give up.
struct ResolvedInput {
    text: String,
    kind: &'static str,
    media: Option<MediaReference>,
    transcription_failed: bool,
}

/// Run one inbound event through the full pipeline.
pub async fn handle_event(
    state: &GatewayState,
    event: &WireEvent,
    user: &UserKey,
) -> Result<PipelineOutcome, PalaverError> {
    let message = extract(event);
    let message_id = external_message_id(event);
    let phone = origin_phone(event);
    let destination = reply_destination(event, user);

    let input = resolve_input(state, user, &message).await;

    // All history mutation happens under the per-user writer lock; `anon`
    // is exempt and processed best-effort.
    let _guard = state.locks.acquire(user).await;

    let mut turns = state.history.load(user).await?;

    if !user.is_anon()
        && is_duplicate(
            &state.dedup,
            &turns,
            message_id.as_deref(),
            &input.text,
            Utc::now(),
        )
    {
        info!(user = %user, id = ?message_id, "duplicate delivery ignored");
        return Ok(PipelineOutcome {
            user: user.clone(),
            duplicate: true,
            reply: None,
            fragments_sent: 0,
        });
    }

    let metadata = TurnMetadata {
        phone: phone.clone(),
        provider: Some(provider_label(event).to_string()),
        timestamp: Some(Utc::now().to_rfc3339()),
    };
    let mut user_turn = Turn::user(input.text.clone(), message_id, Some(metadata));
    if let Some(media) = input.media.clone() {
        user_turn = user_turn.with_media(media);
    }
    turns.push(user_turn);
    state.history.save(user, &turns).await?;

    let reply = if input.transcription_failed {
        state.config.replies.transcription_fallback.clone()
    } else {
        match state
            .backend
            .generate(
                input.kind,
                &input.text,
                state.history.context_window(&turns),
                phone.as_deref(),
                user,
            )
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                warn!(user = %user, error = %err, "backend call failed, sending fixed reply");
                state.config.replies.backend_failure.clone()
            }
        }
    };

    // Reply-commit: the reply enters the durable log whether it came from
    // the backend or a degraded path, so the log matches what the user saw.
    turns.push(Turn::assistant(reply.clone()));
    state.history.save(user, &turns).await?;
    if !user.is_anon() {
        if let Err(err) = state.history.backup(user, &turns).await {
            warn!(user = %user, error = %err, "snapshot failed after reply-commit");
        }
    }

    let fragments_sent = match &destination {
        Some(to) => match state.transport_for(event.source) {
            Some(transport) => {
                state
                    .dispatcher
                    .dispatch(transport.as_ref(), to, &reply)
                    .await
            }
            None => {
                warn!(source = %event.source, "no outbound transport configured, reply not sent");
                0
            }
        },
        None => {
            debug!(user = %user, "no reply destination resolvable");
            0
        }
    };

    Ok(PipelineOutcome {
        user: user.clone(),
        duplicate: false,
        reply: Some(reply),
        fragments_sent,
    })
}

/// Turn the extracted message into the pipeline's input text.
///
/// Audio goes through the orchestrator; its transcript replaces the input
/// text exactly as if the user had typed it. Any unusable outcome marks the
/// input so the caller substitutes the fixed apology instead of calling the
/// backend.
async fn resolve_input(
    state: &GatewayState,
    user: &UserKey,
    message: &ExtractedMessage,
) -> ResolvedInput {
    let Some(descriptor) = message.first_audio() else {
        return ResolvedInput {
            text: message.text.clone(),
            kind: "text",
            media: None,
            transcription_failed: false,
        };
    };

    match state.orchestrator.transcribe_audio(user, descriptor).await {
        Ok(TranscribedAudio {
            media,
            text: Some(text),
        }) => ResolvedInput {
            text,
            kind: "audio",
            media: Some(media),
            transcription_failed: false,
        },
        Ok(TranscribedAudio { media, text: None }) => ResolvedInput {
            text: message.text.clone(),
            kind: "audio",
            media: Some(media),
            transcription_failed: true,
        },
        Err(err) => {
            // The media never made it into durable storage; the event is
            // still acknowledged and the user still gets the apology.
            warn!(user = %user, error = %err, "audio handling failed before transcription");
            ResolvedInput {
                text: message.text.clone(),
                kind: "audio",
                media: None,
                transcription_failed: true,
            }
        }
    }
}
