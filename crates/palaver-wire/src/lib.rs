// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook wire normalization for the Palaver bridge.
//!
//! Two providers deliver the same logical "user sent a message" event in
//! different wire formats: Twilio as a flat URL-encoded form, the Cloud API
//! as nested JSON. Occasionally a delivery arrives double-encoded, its real
//! payload trapped inside a single form key. This crate turns all of those
//! into one flat, provider-agnostic view:
//!
//! 1. [`detect`](detect::detect) classifies and flattens the body,
//! 2. [`identity::resolve`] derives the canonical user key,
//! 3. [`extract`](extract::extract) pulls out text and media descriptors.

pub mod detect;
pub mod extract;
pub mod identity;
pub mod recover;

pub use detect::{detect, FlatMap, SourceKind, WireEvent};
pub use extract::{
    extract, external_message_id, origin_phone, provider_label, reply_destination,
    ExtractedMessage, MediaDescriptor, MediaLocator,
};
pub use identity::{canonical_key, resolve};
