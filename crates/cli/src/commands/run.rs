// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::channel::{ChannelEvent, EventChannel};
use crate::cli::GlobalArgs;
use crate::error::Result;
use crate::sync::{spawn_probe, SyncEvent, TcpProbe};

use super::App;

/// Runs the sync worker, the reachability probe and the event channel
/// until interrupted.
pub async fn run(global: &GlobalArgs) -> Result<()> {
    let app = App::open(global).await?;
    let cancel = CancellationToken::new();

    tracing::info!(
        state_dir = %app.state_dir.display(),
        online = app.is_online(),
        pending = app.service.pending_count(),
        "starting"
    );

    let mut tasks = app.service.spawn(cancel.clone());
    tasks.push(log_sync_events(app.service.engine().subscribe(), cancel.clone()));

    if !global.offline {
        match TcpProbe::for_url(&app.config.api.base_url, app.config.probe_timeout()) {
            Some(probe) => tasks.push(spawn_probe(
                Arc::clone(app.service.connectivity()),
                probe,
                app.config.probe_interval(),
                cancel.clone(),
            )),
            None => tracing::warn!(url = %app.config.api.base_url, "cannot probe API host"),
        }
    }

    let channel = EventChannel::new(app.config.channel_config()?);
    tasks.push(log_channel_events(channel.subscribe(), cancel.clone()));
    let executor = Arc::clone(app.service.engine().executor());
    let channel_task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            channel
                .connect_with(move || executor.access_token().unwrap_or_default(), cancel)
                .await
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    cancel.cancel();

    for task in tasks {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "background task failed");
        }
    }
    match channel_task.await {
        Ok(result) => result?,
        Err(e) => tracing::warn!(error = %e, "event channel task failed"),
    }
    Ok(())
}

fn log_sync_events(mut events: broadcast::Receiver<SyncEvent>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
            };
            match event {
                SyncEvent::Delivered { id, endpoint, .. } => {
                    tracing::info!(%id, %endpoint, "delivered");
                }
                SyncEvent::Retrying { id, retry_count, error } => {
                    tracing::warn!(%id, retry_count, %error, "delivery failed; will retry");
                }
                SyncEvent::Dropped { operation, reason } => match reason.error() {
                    Some(error) => tracing::warn!(
                        id = %operation.id,
                        operation = %operation.describe(),
                        %error,
                        "dropped"
                    ),
                    None => tracing::info!(
                        id = %operation.id,
                        operation = %operation.describe(),
                        "discarded"
                    ),
                },
            }
        }
    })
}

fn log_channel_events(
    mut events: broadcast::Receiver<ChannelEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
            };
            match event {
                ChannelEvent::PresenceChanged(users) => {
                    tracing::info!(online = users.len(), "presence changed");
                }
                ChannelEvent::Notification(event) => {
                    tracing::info!(kind = %event.kind, action = ?event.action, "notification");
                }
                ChannelEvent::Connected | ChannelEvent::Disconnected | ChannelEvent::Session(_) => {}
            }
        }
    })
}
