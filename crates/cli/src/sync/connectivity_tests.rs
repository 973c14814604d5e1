// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the connectivity module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::connectivity::*;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn counting_monitor(initial: bool) -> (ConnectivityMonitor, Arc<AtomicUsize>) {
    let monitor = ConnectivityMonitor::new(initial);
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    monitor.on_reconnect(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (monitor, fired)
}

#[test]
fn test_initial_state() {
    let monitor = ConnectivityMonitor::new(false);
    assert!(!monitor.is_online());
    assert_eq!(monitor.state(), ConnectivityState::default());
}

#[test]
fn test_callback_fires_once_per_online_edge() {
    let (monitor, fired) = counting_monitor(false);

    assert_eq!(monitor.observe(true), Some(Transition::WentOnline));
    assert_eq!(monitor.observe(true), None);
    assert_eq!(monitor.observe(true), None);

    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_callback_not_fired_going_offline() {
    let (monitor, fired) = counting_monitor(true);

    assert_eq!(monitor.observe(false), Some(Transition::WentOffline));
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn test_each_reconnect_fires_again() {
    let (monitor, fired) = counting_monitor(false);

    for _ in 0..3 {
        monitor.observe(true);
        monitor.observe(false);
    }

    assert_eq!(fired.load(Ordering::SeqCst), 3);
    assert_eq!(monitor.state().transitions, 6);
    assert!(!monitor.is_online());
}

#[test]
fn test_starting_online_does_not_fire() {
    let (monitor, fired) = counting_monitor(true);
    monitor.observe(true);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(monitor.state().transitions, 0);
}

#[tokio::test]
async fn test_subscribers_see_changes() {
    let monitor = ConnectivityMonitor::new(false);
    let mut rx = monitor.subscribe();

    monitor.observe(true);
    rx.changed().await.unwrap();

    let state = *rx.borrow_and_update();
    assert!(state.reachable);
    assert_eq!(state.transitions, 1);
}

#[test]
fn test_tcp_probe_for_url() {
    let timeout = Duration::from_millis(100);

    let probe = TcpProbe::for_url("https://api.example.com/api", timeout).unwrap();
    assert_eq!(probe.addr(), "api.example.com:443");

    let probe = TcpProbe::for_url("http://127.0.0.1:8080/api", timeout).unwrap();
    assert_eq!(probe.addr(), "127.0.0.1:8080");

    assert!(TcpProbe::for_url("not a url", timeout).is_none());
}

#[tokio::test]
async fn test_tcp_probe_reachable_listener() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let probe = TcpProbe::new(addr.to_string(), Duration::from_secs(1));
    assert!(probe.check().await);
}

#[tokio::test]
async fn test_tcp_probe_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let probe = TcpProbe::new(addr.to_string(), Duration::from_secs(1));
    assert!(!probe.check().await);
}

struct FlagProbe(Arc<AtomicBool>);

impl ReachabilityProbe for FlagProbe {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let value = self.0.load(Ordering::SeqCst);
        Box::pin(async move { value })
    }
}

#[tokio::test(start_paused = true)]
async fn test_spawn_probe_feeds_monitor() {
    let monitor = Arc::new(ConnectivityMonitor::new(false));
    let flag = Arc::new(AtomicBool::new(false));
    let cancel = CancellationToken::new();

    let handle = spawn_probe(
        Arc::clone(&monitor),
        FlagProbe(Arc::clone(&flag)),
        Duration::from_secs(10),
        cancel.clone(),
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!monitor.is_online());

    flag.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(monitor.is_online());

    cancel.cancel();
    handle.await.unwrap();
}
