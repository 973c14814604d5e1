// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnecting event channel.
//!
//! Keeps a push connection to the server open for as long as the client
//! runs:
//! - Reconnects a fixed delay after every close or failed connect, forever
//! - Sends a heartbeat on a fixed interval while connected
//! - Tracks online users and keeps the most recent notifications
//! - Republishes everything to subscribers as [`ChannelEvent`]s

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cw_core::{
    ClientMessage, NotificationEvent, NotificationLog, PresenceSet, ServerMessage, SessionInfo,
    UserId,
};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use super::transport::{Transport, TransportError, WebSocketTransport};

/// Delay before each reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Interval between heartbeats while connected.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

const EVENT_CAPACITY: usize = 256;

/// Configuration for the event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// `ws://` or `wss://` endpoint, without credentials.
    pub url: String,
    pub reconnect_delay: Duration,
    pub heartbeat_interval: Duration,
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        ChannelConfig {
            url: url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

/// Error type for event channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("invalid channel url '{0}'")]
    InvalidUrl(String),

    #[error("event channel is not connected")]
    NotConnected,

    #[error("event channel has shut down")]
    Closed,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for event channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Something subscribers may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Session(SessionInfo),
    Disconnected,
    /// Online users after a snapshot or a delta.
    PresenceChanged(Vec<UserId>),
    Notification(NotificationEvent),
}

/// Builds the connect URL carrying `credential` as the `token` parameter.
pub fn channel_url(base: &str, credential: &str) -> ChannelResult<String> {
    let mut url = url::Url::parse(base).map_err(|_| ChannelError::InvalidUrl(base.to_string()))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(ChannelError::InvalidUrl(base.to_string()));
    }
    if !credential.is_empty() {
        url.query_pairs_mut().append_pair("token", credential);
    }
    Ok(url.into())
}

#[derive(Default)]
struct ChannelState {
    connected: AtomicBool,
    connects: AtomicU64,
    presence: Mutex<PresenceSet>,
    notifications: Mutex<NotificationLog>,
    session: Mutex<Option<SessionInfo>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable view of a running channel.
#[derive(Clone)]
pub struct ChannelHandle {
    state: Arc<ChannelState>,
    events: broadcast::Sender<ChannelEvent>,
    commands: mpsc::UnboundedSender<ClientMessage>,
}

impl ChannelHandle {
    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::Acquire)
    }

    /// Number of times the channel has opened.
    pub fn connect_count(&self) -> u64 {
        self.state.connects.load(Ordering::Acquire)
    }

    /// Online users, sorted.
    pub fn presence(&self) -> Vec<UserId> {
        lock(&self.state.presence).members()
    }

    /// Recent notifications, newest first.
    pub fn notifications(&self) -> Vec<NotificationEvent> {
        lock(&self.state.notifications).recent()
    }

    /// Session details from the latest `connection` message.
    pub fn session(&self) -> Option<SessionInfo> {
        lock(&self.state.session).clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }

    /// Sends a tenant-wide broadcast message.
    pub fn broadcast(&self, message: impl Into<String>) -> ChannelResult<()> {
        if !self.is_connected() {
            return Err(ChannelError::NotConnected);
        }
        self.commands
            .send(ClientMessage::broadcast(message))
            .map_err(|_| ChannelError::Closed)
    }

    fn emit(&self, event: ChannelEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

enum SessionEnd {
    Closed,
    Cancelled,
}

/// Push channel to the server.
pub struct EventChannel<T: Transport = WebSocketTransport> {
    config: ChannelConfig,
    transport: T,
    handle: ChannelHandle,
    commands: mpsc::UnboundedReceiver<ClientMessage>,
}

impl EventChannel<WebSocketTransport> {
    pub fn new(config: ChannelConfig) -> Self {
        Self::with_transport(config, WebSocketTransport::new())
    }
}

impl<T: Transport> EventChannel<T> {
    /// Create a channel over a custom transport (for testing).
    pub fn with_transport(config: ChannelConfig, transport: T) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (command_tx, commands) = mpsc::unbounded_channel();
        EventChannel {
            config,
            transport,
            handle: ChannelHandle {
                state: Arc::new(ChannelState::default()),
                events,
                commands: command_tx,
            },
            commands,
        }
    }

    pub fn handle(&self) -> ChannelHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.handle.subscribe()
    }

    /// Runs the channel with a fixed credential until `cancel` fires.
    pub async fn connect(self, credential: &str, cancel: CancellationToken) -> ChannelResult<()> {
        self.connect_with(|| credential.to_owned(), cancel).await
    }

    /// Runs the channel until `cancel` fires, asking `credential` for the
    /// current token before every connect attempt.
    ///
    /// Only an unusable URL is an error; connection failures and closes are
    /// retried after the reconnect delay without limit.
    pub async fn connect_with<F>(mut self, credential: F, cancel: CancellationToken) -> ChannelResult<()>
    where
        F: Fn() -> String + Send,
    {
        loop {
            let url = channel_url(&self.config.url, &credential())?;
            let attempt = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.transport.connect(&url) => result,
            };

            match attempt {
                Ok(()) => {
                    self.opened();
                    let end = self.run_session(&cancel).await;
                    self.closed();
                    if let SessionEnd::Cancelled = end {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "event channel connect failed"),
            }

            tracing::debug!(delay = ?self.config.reconnect_delay, "event channel reconnecting");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }

        if self.transport.is_connected() {
            if let Err(e) = self.transport.disconnect().await {
                tracing::debug!(error = %e, "error closing event channel");
            }
        }
        tracing::debug!("event channel stopped");
        Ok(())
    }

    async fn run_session(&mut self, cancel: &CancellationToken) -> SessionEnd {
        let period = self.config.heartbeat_interval;
        let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return SessionEnd::Cancelled,
                _ = heartbeat.tick() => {
                    if let Err(e) = self.transport.send(ClientMessage::ping()).await {
                        tracing::warn!(error = %e, "heartbeat failed");
                        return SessionEnd::Closed;
                    }
                }
                Some(msg) = self.commands.recv() => {
                    if let Err(e) = self.transport.send(msg).await {
                        tracing::warn!(error = %e, "failed to send on event channel");
                        return SessionEnd::Closed;
                    }
                }
                received = self.transport.recv() => match received {
                    Ok(Some(msg)) => self.dispatch(msg),
                    Ok(None) => return SessionEnd::Closed,
                    Err(TransportError::Decode(e)) => {
                        tracing::warn!(error = %e, "ignoring undecodable channel message");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "event channel receive failed");
                        return SessionEnd::Closed;
                    }
                },
            }
        }
    }

    fn opened(&self) {
        let state = &self.handle.state;
        lock(&state.presence).clear();
        lock(&state.notifications).clear();
        state.connects.fetch_add(1, Ordering::AcqRel);
        state.connected.store(true, Ordering::Release);
        tracing::info!("event channel connected");
        self.handle.emit(ChannelEvent::Connected);
    }

    fn closed(&self) {
        let state = &self.handle.state;
        state.connected.store(false, Ordering::Release);
        lock(&state.presence).clear();
        tracing::info!("event channel disconnected");
        self.handle.emit(ChannelEvent::Disconnected);
    }

    fn dispatch(&self, msg: ServerMessage) {
        let state = &self.handle.state;
        match msg {
            ServerMessage::Connection(info) => {
                tracing::debug!(user = ?info.user_id, "session established");
                *lock(&state.session) = Some(info.clone());
                self.handle.emit(ChannelEvent::Session(info));
            }
            ServerMessage::Presence { online_users } => {
                let members = {
                    let mut presence = lock(&state.presence);
                    presence.resync(online_users);
                    presence.members()
                };
                self.handle.emit(ChannelEvent::PresenceChanged(members));
            }
            ServerMessage::UserPresence { action, user_id } => {
                let members = {
                    let mut presence = lock(&state.presence);
                    presence.apply(action, user_id).then(|| presence.members())
                };
                if let Some(members) = members {
                    self.handle.emit(ChannelEvent::PresenceChanged(members));
                }
            }
            ServerMessage::Pong => tracing::trace!("pong"),
            ServerMessage::Notification(event) => {
                tracing::debug!(kind = %event.kind, action = ?event.action, "notification");
                lock(&state.notifications).push(event.clone());
                self.handle.emit(ChannelEvent::Notification(event));
            }
            ServerMessage::Unknown { kind } => {
                tracing::debug!(%kind, "ignoring unrecognized channel message");
            }
        }
    }
}
