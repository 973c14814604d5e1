// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine: drains the durable queue through the remote executor.
//!
//! Operations are delivered one at a time in insertion order. A drain stops
//! at the first retryable failure so no later operation overtakes an
//! earlier unresolved one; drops (rejections, exhausted retries) let the
//! drain move on. Concurrent triggers collapse into the active drain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cw_core::{OpId, QueuedOperation};
use tokio::sync::{broadcast, Notify};
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::connectivity::ConnectivityMonitor;
use super::executor::{execute_with_refresh, ExecError, Executor, Payload, Request};
use super::queue::{DurableQueue, FailureOutcome, QueueError, QueueResult, SharedQueue};
use super::store::Store;

const EVENT_CAPACITY: usize = 64;

/// Why an operation left the queue undelivered.
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    /// Failed with a retryable error once too often.
    RetriesExhausted(ExecError),
    /// Rejected by the API; retrying would not help.
    Rejected(ExecError),
    /// Cleared from the queue by the user.
    Discarded,
}

impl DropReason {
    pub fn error(&self) -> Option<&ExecError> {
        match self {
            DropReason::RetriesExhausted(e) | DropReason::Rejected(e) => Some(e),
            DropReason::Discarded => None,
        }
    }
}

/// Per-operation outcome of a drain.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Delivered {
        id: OpId,
        endpoint: String,
        payload: Payload,
    },
    Retrying {
        id: OpId,
        retry_count: u32,
        error: ExecError,
    },
    Dropped {
        operation: QueuedOperation,
        reason: DropReason,
    },
}

/// Receives every outcome synchronously, in order, before it is broadcast.
///
/// Unlike broadcast subscribers, an observer can never miss an event.
pub trait SyncObserver: Send + Sync {
    fn on_sync_event(&self, event: &SyncEvent);
}

/// Totals for one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub delivered: usize,
    pub retried: usize,
    pub dropped: usize,
    /// Operations still queued when the drain ended.
    pub remaining: usize,
}

impl SyncReport {
    /// Whether the drain attempted anything.
    pub fn is_noop(&self) -> bool {
        self.delivered == 0 && self.retried == 0 && self.dropped == 0
    }
}

/// Result of [`SyncEngine::trigger_sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another drain was active; this trigger joined it.
    AlreadyRunning,
    /// The API is unreachable; nothing was attempted.
    Offline,
    Completed(SyncReport),
}

/// Wakes the engine's worker loop.
#[derive(Debug, Clone, Default)]
pub struct SyncWaker(Arc<Notify>);

impl SyncWaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a drain. Wakes sent while a drain runs cause one more.
    pub fn wake(&self) {
        self.0.notify_one();
    }

    async fn notified(&self) {
        self.0.notified().await;
    }
}

struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

enum Step {
    Continue,
    Stop,
}

/// Drains a [`DurableQueue`] through an [`Executor`].
pub struct SyncEngine<S: Store, E: Executor> {
    queue: SharedQueue<S>,
    executor: Arc<E>,
    connectivity: Arc<ConnectivityMonitor>,
    in_flight: AtomicBool,
    events: broadcast::Sender<SyncEvent>,
    observers: Mutex<Vec<Arc<dyn SyncObserver>>>,
    waker: SyncWaker,
}

impl<S: Store, E: Executor> SyncEngine<S, E> {
    pub fn new(
        queue: SharedQueue<S>,
        executor: Arc<E>,
        connectivity: Arc<ConnectivityMonitor>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        SyncEngine {
            queue,
            executor,
            connectivity,
            in_flight: AtomicBool::new(false),
            events,
            observers: Mutex::new(Vec::new()),
            waker: SyncWaker::new(),
        }
    }

    /// Registers an observer called inside the drain for every outcome.
    pub fn add_observer(&self, observer: Arc<dyn SyncObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Receiver for per-operation outcomes. Lossy under load; use
    /// [`SyncEngine::add_observer`] where every event matters.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn waker(&self) -> SyncWaker {
        self.waker.clone()
    }

    pub fn queue(&self) -> &SharedQueue<S> {
        &self.queue
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn pending_count(&self) -> usize {
        self.lock_queue().len()
    }

    /// Snapshot of the queue in delivery order.
    pub fn pending_operations(&self) -> Vec<QueuedOperation> {
        self.lock_queue().peek_ordered()
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Drops every queued operation without delivering it.
    ///
    /// Each one is reported as [`DropReason::Discarded`]. Returns how many
    /// were removed.
    pub fn discard_all(&self) -> QueueResult<usize> {
        let removed = self.lock_queue().clear()?;
        if !removed.is_empty() {
            tracing::warn!(count = removed.len(), "discarded queued operations");
        }
        let count = removed.len();
        for operation in removed {
            self.emit(SyncEvent::Dropped {
                operation,
                reason: DropReason::Discarded,
            });
        }
        Ok(count)
    }

    /// Drains the queue unless offline or already draining.
    ///
    /// Operations enqueued during the drain are picked up after the current
    /// snapshot. An empty queue makes no executor calls.
    pub async fn trigger_sync(&self) -> QueueResult<DrainOutcome> {
        if !self.connectivity.is_online() {
            return Ok(DrainOutcome::Offline);
        }
        let Some(_guard) = FlightGuard::acquire(&self.in_flight) else {
            tracing::trace!("drain already running");
            return Ok(DrainOutcome::AlreadyRunning);
        };

        let mut report = SyncReport::default();
        'drain: loop {
            let snapshot = self.lock_queue().peek_ordered();
            if snapshot.is_empty() {
                break;
            }
            for op in snapshot {
                if !self.connectivity.is_online() {
                    tracing::debug!("went offline mid-drain");
                    break 'drain;
                }
                let still_queued = self.lock_queue().get(op.id).is_some();
                if !still_queued {
                    continue;
                }
                if let Step::Stop = self.deliver(&op, &mut report).await? {
                    break 'drain;
                }
            }
        }

        report.remaining = self.pending_count();
        if !report.is_noop() {
            tracing::info!(
                delivered = report.delivered,
                retried = report.retried,
                dropped = report.dropped,
                remaining = report.remaining,
                "sync pass finished"
            );
        }
        Ok(DrainOutcome::Completed(report))
    }

    async fn deliver(&self, op: &QueuedOperation, report: &mut SyncReport) -> QueueResult<Step> {
        let request = Request::from_queued(op);
        let result = execute_with_refresh(self.executor.as_ref(), &request).await;

        match result {
            Ok(payload) => {
                self.lock_queue().mark_succeeded(op.id)?;
                report.delivered += 1;
                tracing::debug!(op = %op.id, request = %op.describe(), "delivered");
                self.emit(SyncEvent::Delivered {
                    id: op.id,
                    endpoint: op.endpoint.clone(),
                    payload,
                });
                Ok(Step::Continue)
            }
            Err(error) if !error.is_retryable() => {
                let removed = self.lock_queue().discard(op.id)?;
                report.dropped += 1;
                tracing::warn!(
                    op = %op.id,
                    request = %op.describe(),
                    %error,
                    "operation rejected, dropping"
                );
                self.emit(SyncEvent::Dropped {
                    operation: removed.unwrap_or_else(|| op.clone()),
                    reason: DropReason::Rejected(error),
                });
                Ok(Step::Continue)
            }
            Err(error) => {
                let outcome = self.lock_queue().mark_failed(op.id);
                match outcome {
                    Ok(FailureOutcome::Retrying { retry_count }) => {
                        report.retried += 1;
                        tracing::debug!(op = %op.id, retry_count, %error, "delivery failed");
                        self.emit(SyncEvent::Retrying {
                            id: op.id,
                            retry_count,
                            error,
                        });
                        Ok(Step::Stop)
                    }
                    Ok(FailureOutcome::Dropped(operation)) => {
                        report.dropped += 1;
                        self.emit(SyncEvent::Dropped {
                            operation,
                            reason: DropReason::RetriesExhausted(error),
                        });
                        Ok(Step::Continue)
                    }
                    // Discarded while the request was in flight.
                    Err(QueueError::NotFound(_)) => Ok(Step::Continue),
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Worker loop: drains on start, on every wake, and on the periodic
    /// interval, until cancelled.
    ///
    /// Cancellation abandons an in-flight request without recording a
    /// failure, so that operation is retried from the same state later.
    pub async fn run(self: Arc<Self>, periodic: Option<Duration>, cancel: CancellationToken) {
        let mut ticker = periodic.map(|period| {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.drain_logged() => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.waker.notified() => {}
                _ = tick(&mut ticker) => {}
            }
        }
        tracing::debug!("sync worker stopped");
    }

    async fn drain_logged(&self) {
        if let Err(e) = self.trigger_sync().await {
            tracing::error!(error = %e, "sync pass failed");
        }
    }

    fn emit(&self, event: SyncEvent) {
        let observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in &observers {
            observer.on_sync_event(&event);
        }
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn lock_queue(&self) -> MutexGuard<'_, DurableQueue<S>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
