// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded polling and inline retry primitives.
//!
//! The transcription job poll loop and the media download retry are both
//! expressed through the utilities here instead of inline loops duplicated
//! per call site. Every wait is bounded: `poll_until` runs at most
//! `max_attempts` polls at a fixed interval, so callers terminate within
//! `attempts x interval` wall-clock time regardless of what the polled
//! service does.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Fixed-interval polling policy.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Sleep between consecutive polls.
    pub interval: Duration,
    /// Bounded number of polls before giving up.
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Upper bound on the total wall-clock time one `poll_until` call can take,
    /// excluding the duration of the poll operations themselves.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Outcome of a bounded poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The predicate accepted a polled value as terminal.
    Terminal(T),
    /// All attempts were used without reaching a terminal value.
    Exhausted,
}

/// Poll `op` at a fixed interval until `terminal` accepts a value or the
/// attempt budget is spent.
///
/// The sleep is placed between polls, never after the last one. Errors from
/// `op` propagate immediately; an erroring poll does not consume the
/// remaining budget.
pub async fn poll_until<T, E, F, Fut, P>(
    policy: PollPolicy,
    mut op: F,
    terminal: P,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    for attempt in 0..policy.max_attempts {
        let value = op(attempt).await?;
        if terminal(&value) {
            return Ok(PollOutcome::Terminal(value));
        }
        if attempt + 1 < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Ok(PollOutcome::Exhausted)
}

/// Run `op`, retrying exactly once on failure with no backoff.
///
/// Used for idempotent network fetches where a second attempt is cheap and a
/// third is not worth the added latency. The first failure is logged, the
/// second is returned.
pub async fn retry_once<T, E, F, Fut>(mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(first) => {
            warn!(error = %first, "operation failed, retrying once");
            op().await
        }
    }
}
