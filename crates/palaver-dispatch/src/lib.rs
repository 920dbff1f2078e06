// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound reply dispatch for the Palaver webhook bridge.
//!
//! A generated reply is split into channel-size-safe fragments and delivered
//! strictly in order over the originating provider's send API. Individual
//! fragment failures are logged and never abort the remaining fragments.

pub mod dispatcher;
pub mod split;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use split::split_reply;
pub use transport::{CloudSender, ReplyTransport, TwilioSender};
