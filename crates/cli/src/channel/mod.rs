// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Real-time event channel.
//!
//! A long-lived push connection carrying presence updates and domain
//! notifications. Independent of the sync engine: losing the channel never
//! affects queued work.

mod client;
mod transport;

pub use client::{
    channel_url, ChannelConfig, ChannelError, ChannelEvent, ChannelHandle, ChannelResult,
    EventChannel, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_RECONNECT_DELAY,
};
pub use transport::{
    Transport, TransportError, TransportFuture, TransportResult, WebSocketTransport,
};
