// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply fragmentation.
//!
//! Long replies are split into channel-size-safe fragments: paragraph
//! breaks first, then sentence boundaries inside oversized paragraphs,
//! greedily packed up to the soft limit. A single sentence longer than the
//! limit stays whole -- the limit is soft, and splitting mid-sentence reads
//! worse than an occasional long message.

/// Split a reply into ordered fragments of at most `soft_limit` characters
/// (modulo oversized single sentences). Empty input yields no fragments.
pub fn split_reply(text: &str, soft_limit: usize) -> Vec<String> {
    let mut fragments = Vec::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        if char_len(paragraph) <= soft_limit {
            fragments.push(paragraph.to_string());
            continue;
        }
        fragments.extend(pack_sentences(paragraph, soft_limit));
    }

    fragments
}

/// Greedily pack a paragraph's sentences into fragments up to the limit.
fn pack_sentences(paragraph: &str, soft_limit: usize) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(paragraph) {
        if current.is_empty() {
            current = sentence;
            continue;
        }
        if char_len(&current) + 1 + char_len(&sentence) <= soft_limit {
            current.push(' ');
            current.push_str(&sentence);
        } else {
            fragments.push(std::mem::take(&mut current));
            current = sentence;
        }
    }
    if !current.is_empty() {
        fragments.push(current);
    }

    fragments
}

/// Split on sentence-final punctuation followed by whitespace.
fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = paragraph.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?')
            && chars.peek().is_none_or(|next| next.is_whitespace())
        {
            // Consume the separating whitespace.
            while chars.peek().is_some_and(|next| next.is_whitespace()) {
                chars.next();
            }
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
