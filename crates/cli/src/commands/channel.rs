// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::channel::{ChannelError, ChannelEvent, EventChannel};
use crate::cli::{GlobalArgs, OutputFormat};
use crate::config::Config;
use crate::error::Result;

use super::load_config;

/// Time given to the session loop to send a queued broadcast before shutdown.
const FLUSH_GRACE: Duration = Duration::from_millis(250);

fn open_channel(config: &Config) -> Result<(EventChannel, String)> {
    let channel = EventChannel::new(config.channel_config()?);
    let credential = config.api.access_token.clone().unwrap_or_default();
    Ok((channel, credential))
}

/// Prints channel events until interrupted.
pub async fn listen(global: &GlobalArgs, output: OutputFormat) -> Result<()> {
    let config = load_config(global)?;
    let (channel, credential) = open_channel(&config)?;
    let mut events = channel.subscribe();
    let cancel = CancellationToken::new();
    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move { channel.connect(&credential, cancel).await }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = events.recv() => match received {
                Ok(event) => match output {
                    OutputFormat::Text => println!("{}", event_line(&event)),
                    OutputFormat::Json => println!("{}", event_json(&event)),
                },
                Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "event output lagging"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    cancel.cancel();
    match task.await {
        Ok(result) => result?,
        Err(e) => tracing::warn!(error = %e, "event channel task failed"),
    }
    Ok(())
}

/// Connects, sends one tenant broadcast and disconnects.
pub async fn broadcast(global: &GlobalArgs, message: &str, timeout: Duration) -> Result<()> {
    let config = load_config(global)?;
    let (channel, credential) = open_channel(&config)?;
    let handle = channel.handle();
    let mut events = channel.subscribe();
    let cancel = CancellationToken::new();
    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move { channel.connect(&credential, cancel).await }
    });

    let connected = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(ChannelEvent::Connected) => return true,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return false,
            }
        }
    })
    .await
    .unwrap_or(false);

    let sent = if connected {
        handle.broadcast(message)
    } else {
        Err(ChannelError::NotConnected)
    };
    if sent.is_ok() {
        tokio::time::sleep(FLUSH_GRACE).await;
    }

    cancel.cancel();
    match task.await {
        Ok(result) => result?,
        Err(e) => tracing::warn!(error = %e, "event channel task failed"),
    }
    sent?;
    println!("Broadcast sent.");
    Ok(())
}

pub(crate) fn event_line(event: &ChannelEvent) -> String {
    match event {
        ChannelEvent::Connected => "connected".to_string(),
        ChannelEvent::Disconnected => "disconnected; reconnecting".to_string(),
        ChannelEvent::Session(info) => match &info.user_id {
            Some(user) => format!("session established for user {}", user),
            None => "session established".to_string(),
        },
        ChannelEvent::PresenceChanged(users) => {
            let names: Vec<&str> = users.iter().map(|u| u.as_str()).collect();
            format!("online ({}): {}", users.len(), names.join(", "))
        }
        ChannelEvent::Notification(event) => {
            let mut line = format!(
                "[{}] {}",
                event.timestamp.format("%H:%M:%S"),
                event.kind
            );
            if let Some(action) = &event.action {
                line.push(' ');
                line.push_str(action);
            }
            if let Some(message) = event.payload.get("message").and_then(|m| m.as_str()) {
                line.push_str(": ");
                line.push_str(message);
            }
            line
        }
    }
}

pub(crate) fn event_json(event: &ChannelEvent) -> serde_json::Value {
    match event {
        ChannelEvent::Connected => json!({ "event": "connected" }),
        ChannelEvent::Disconnected => json!({ "event": "disconnected" }),
        ChannelEvent::Session(info) => json!({ "event": "session", "session": info }),
        ChannelEvent::PresenceChanged(users) => json!({ "event": "presence", "online_users": users }),
        ChannelEvent::Notification(event) => json!({ "event": "notification", "notification": event }),
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
