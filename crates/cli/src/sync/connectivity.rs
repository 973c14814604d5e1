// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network reachability tracking.
//!
//! Platform signals (probe results, OS notifications) are fed into
//! [`ConnectivityMonitor::observe`], which normalizes them into a single
//! reachable flag. Reconnect callbacks are edge-triggered: they run once per
//! offline-to-online transition, never while the state stays online.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Snapshot of reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectivityState {
    pub reachable: bool,
    /// Number of reachability changes observed so far.
    pub transitions: u64,
}

/// Direction of a reachability change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentOnline,
    WentOffline,
}

type ReconnectCallback = Box<dyn Fn() + Send + Sync>;

/// Tracks whether the remote API is reachable.
pub struct ConnectivityMonitor {
    state: watch::Sender<ConnectivityState>,
    on_reconnect: Mutex<Vec<ReconnectCallback>>,
}

impl ConnectivityMonitor {
    pub fn new(initially_reachable: bool) -> Self {
        let (state, _) = watch::channel(ConnectivityState {
            reachable: initially_reachable,
            transitions: 0,
        });
        ConnectivityMonitor {
            state,
            on_reconnect: Mutex::new(Vec::new()),
        }
    }

    pub fn is_online(&self) -> bool {
        self.state.borrow().reachable
    }

    pub fn state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    /// Receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state.subscribe()
    }

    /// Registers a callback run on each offline-to-online edge.
    pub fn on_reconnect<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_reconnect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(callback));
    }

    /// Feeds one reachability signal into the monitor.
    ///
    /// Returns the transition it caused, if any. Repeated signals with the
    /// same value are ignored.
    pub fn observe(&self, reachable: bool) -> Option<Transition> {
        let changed = self.state.send_if_modified(|state| {
            if state.reachable == reachable {
                return false;
            }
            state.reachable = reachable;
            state.transitions += 1;
            true
        });
        if !changed {
            return None;
        }

        if reachable {
            tracing::info!("network reachable");
            let callbacks = self
                .on_reconnect
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            for callback in callbacks.iter() {
                callback();
            }
            Some(Transition::WentOnline)
        } else {
            tracing::info!("network unreachable, operations will be queued");
            Some(Transition::WentOffline)
        }
    }
}

/// A source of reachability signals.
pub trait ReachabilityProbe: Send + Sync {
    /// Checks reachability once.
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Considers the API reachable when a TCP connection to its host succeeds.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    /// Probe for `host:port`.
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        TcpProbe {
            addr: addr.into(),
            timeout,
        }
    }

    /// Probe for the host and port of an http(s) or ws(s) URL.
    pub fn for_url(url: &str, timeout: Duration) -> Option<Self> {
        let parsed = url::Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        let port = parsed.port_or_known_default()?;
        Some(TcpProbe::new(format!("{host}:{port}"), timeout))
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl ReachabilityProbe for TcpProbe {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            let connect = tokio::net::TcpStream::connect(self.addr.as_str());
            match tokio::time::timeout(self.timeout, connect).await {
                Ok(Ok(_)) => true,
                Ok(Err(e)) => {
                    tracing::debug!(addr = %self.addr, error = %e, "probe failed");
                    false
                }
                Err(_) => {
                    tracing::debug!(addr = %self.addr, "probe timed out");
                    false
                }
            }
        })
    }
}

/// Polls `probe` every `interval`, feeding results into `monitor`.
pub fn spawn_probe<P>(
    monitor: Arc<ConnectivityMonitor>,
    probe: P,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()>
where
    P: ReachabilityProbe + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let reachable = probe.check().await;
                    monitor.observe(reachable);
                }
            }
        }
        tracing::debug!("reachability probe stopped");
    })
}
