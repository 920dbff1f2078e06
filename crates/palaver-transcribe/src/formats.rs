// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content-type and extension mapping for audio transcription jobs.
//!
//! The job API wants an explicit codec/container name per submission. The
//! mapping is a fixed table; anything unrecognized falls back to the voice
//! note default since both providers deliver voice messages as OGG/Opus.

/// Codec submitted when the extension is not in the table.
pub const FALLBACK_FORMAT: &str = "ogg-opus";

/// File extension inferred from a provider content type.
///
/// Parameters such as `; codecs=opus` are ignored.
pub fn extension_for(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "audio/ogg" | "application/ogg" => "ogg",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        "audio/amr" => "amr",
        "audio/webm" => "webm",
        "audio/flac" | "audio/x-flac" => "flac",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        _ => "bin",
    }
}

/// Job codec name for a file extension. Unrecognized extensions get the
/// safe fallback.
pub fn format_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "ogg" | "oga" | "opus" => "ogg-opus",
        "mp3" => "mp3",
        "wav" => "wav",
        "mp4" | "m4a" => "mp4",
        "amr" => "amr",
        "webm" => "webm",
        "flac" => "flac",
        _ => FALLBACK_FORMAT,
    }
}
