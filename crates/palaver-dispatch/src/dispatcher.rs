// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered fragment delivery with fixed pacing.
//!
//! Fragments go out strictly in order with a fixed delay between consecutive
//! sends (none after the last), matching channel rate expectations. A failed
//! fragment is logged and skipped; the rest are still attempted, since a
//! partial reply beats silence.

use std::time::Duration;

use tracing::{debug, warn};

use crate::split::split_reply;
use crate::transport::ReplyTransport;

/// Splits a reply and delivers its fragments over one transport.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    soft_limit: usize,
    delay: Duration,
}

impl Dispatcher {
    pub fn new(soft_limit: usize, delay: Duration) -> Self {
        Self { soft_limit, delay }
    }

    /// Send a reply as ordered fragments. Returns how many were delivered.
    pub async fn dispatch(
        &self,
        transport: &dyn ReplyTransport,
        to: &str,
        reply: &str,
    ) -> usize {
        let fragments = split_reply(reply, self.soft_limit);
        let total = fragments.len();
        let mut delivered = 0;

        for (index, fragment) in fragments.iter().enumerate() {
            match transport.send_fragment(to, fragment).await {
                Ok(()) => delivered += 1,
                Err(err) => {
                    warn!(
                        to,
                        fragment = index + 1,
                        total,
                        error = %err,
                        "fragment delivery failed, continuing"
                    );
                }
            }
            if index + 1 < total {
                tokio::time::sleep(self.delay).await;
            }
        }

        debug!(to, delivered, total, "reply dispatched");
        delivered
    }
}
