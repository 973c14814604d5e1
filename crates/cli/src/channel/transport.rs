// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport for the event channel.
//!
//! The channel only depends on the [`Transport`] trait, so tests can drive
//! it with scripted sessions instead of sockets.

use std::future::Future;
use std::pin::Pin;

use cw_core::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Failure on the push connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot open event channel: {0}")]
    Connect(String),

    /// No connection is open.
    #[error("event channel is closed")]
    Closed,

    #[error("event channel write failed: {0}")]
    Write(String),

    #[error("event channel read failed: {0}")]
    Read(String),

    /// A frame could not be encoded or decoded. The connection stays open.
    #[error("malformed channel frame: {0}")]
    Decode(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Transport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// A message connection to the push endpoint.
pub trait Transport: Send + Sync {
    /// Opens a connection to `url`, replacing any previous one.
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()>;

    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()>;

    /// Waits for the next decodable message. `None` once the peer has
    /// closed the connection.
    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>>;

    fn is_connected(&self) -> bool;
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// [`Transport`] over a tokio-tungstenite WebSocket.
#[derive(Default)]
pub struct WebSocketTransport {
    socket: Option<Socket>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn socket(&mut self) -> TransportResult<&mut Socket> {
        self.socket.as_mut().ok_or(TransportError::Closed)
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            self.socket = None;
            let (socket, response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            tracing::trace!(status = %response.status(), "event channel handshake complete");
            self.socket = Some(socket);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let Some(mut socket) = self.socket.take() else {
                return Ok(());
            };
            socket
                .close(None)
                .await
                .map_err(|e| TransportError::Write(e.to_string()))
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let text = msg
                .to_json()
                .map_err(|e| TransportError::Decode(e.to_string()))?;
            let result = self.socket()?.send(Message::text(text)).await;
            // send() flushes, so a dead peer surfaces here.
            result.map_err(|e| {
                self.socket = None;
                TransportError::Write(e.to_string())
            })
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            loop {
                let frame = self.socket()?.next().await;
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        return ServerMessage::from_json(text.as_str())
                            .map(Some)
                            .map_err(|e| TransportError::Decode(e.to_string()));
                    }
                    Some(Ok(Message::Close(close))) => {
                        tracing::debug!(?close, "server closed the event channel");
                        self.socket = None;
                        return Ok(None);
                    }
                    // Control frames are answered by tungstenite itself.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        self.socket = None;
                        return Err(TransportError::Read(e.to_string()));
                    }
                    None => {
                        self.socket = None;
                        return Ok(None);
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }
}
