// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Optimistic state coordinator.
//!
//! User actions take effect locally at once: the new clock state and the
//! queued remote call that confirms it are both persisted before the call
//! returns. Sync outcomes are reconciled afterwards. A delivered call clears
//! the pending marker; a dropped one is handled per [`DropPolicy`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use cw_core::{ClockAction, ClockState, NewOperation, OpId, SystemTime, TimeSource};
use serde::{Deserialize, Serialize};

use super::connectivity::ConnectivityMonitor;
use super::engine::{DropReason, SyncEngine, SyncEvent, SyncObserver, SyncWaker};
use super::error::{SyncError, SyncResult};
use super::executor::{execute_with_refresh, Executor, Payload, Request};
use super::queue::{DurableQueue, SharedQueue};
use super::store::{Store, CLOCK_BLOB};

/// What happens to local state when its pending clock operation is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Roll the clock state back to before the dropped transition.
    Revert,
    /// Keep the local state and record a persistent sync error.
    #[default]
    Surface,
}

/// Result of [`OptimisticCoordinator::execute_or_queue`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome {
    /// The call went through directly.
    Completed(Payload),
    /// Offline: the call was queued without being attempted.
    Queued(OpId),
}

/// Owns the clock state and mediates every write to it.
pub struct OptimisticCoordinator<S: Store, E: Executor> {
    store: S,
    queue: SharedQueue<S>,
    executor: Arc<E>,
    connectivity: Arc<ConnectivityMonitor>,
    waker: SyncWaker,
    clock: Mutex<ClockState>,
    policy: DropPolicy,
    time: Arc<dyn TimeSource>,
}

impl<S: Store, E: Executor> OptimisticCoordinator<S, E> {
    /// Loads persisted clock state and attaches to `engine`'s queue.
    pub fn open(store: S, engine: &SyncEngine<S, E>, policy: DropPolicy) -> SyncResult<Self> {
        Self::with_time(store, engine, policy, Arc::new(SystemTime))
    }

    pub fn with_time(
        store: S,
        engine: &SyncEngine<S, E>,
        policy: DropPolicy,
        time: Arc<dyn TimeSource>,
    ) -> SyncResult<Self> {
        let clock = match store.load(CLOCK_BLOB)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(cw_core::Error::from)?,
            None => ClockState::default(),
        };

        Ok(OptimisticCoordinator {
            store,
            queue: Arc::clone(engine.queue()),
            executor: Arc::clone(engine.executor()),
            connectivity: Arc::clone(engine.connectivity()),
            waker: engine.waker(),
            clock: Mutex::new(clock),
            policy,
            time,
        })
    }

    /// Snapshot of the current clock state.
    pub fn clock_state(&self) -> ClockState {
        self.lock_clock().clone()
    }

    pub fn policy(&self) -> DropPolicy {
        self.policy
    }

    /// Applies a local transition and queues the remote call confirming it.
    ///
    /// `mutate` computes the next state from the current one. On return,
    /// both the new state (linked to the queued call) and the queue are
    /// persisted; on error, neither changed.
    pub fn apply_optimistic<F>(&self, op: NewOperation, mutate: F) -> SyncResult<OpId>
    where
        F: FnOnce(&ClockState, DateTime<Utc>) -> cw_core::Result<ClockState>,
    {
        let mut clock = self.lock_clock();
        let mut next = mutate(&clock, self.time.now())?;

        let id = self.lock_queue().enqueue(op)?;
        next.pending_operation_id = Some(id);

        if let Err(e) = self.persist(&next) {
            if let Err(undo) = self.lock_queue().discard(id) {
                tracing::error!(op = %id, error = %undo, "failed to withdraw queued operation");
            }
            return Err(e);
        }
        *clock = next;
        drop(clock);

        if self.connectivity.is_online() {
            self.waker.wake();
        }
        Ok(id)
    }

    pub fn clock_in(&self, location: &str) -> SyncResult<OpId> {
        self.apply_clock(ClockAction::ClockIn, location)
    }

    pub fn clock_out(&self, location: &str) -> SyncResult<OpId> {
        self.apply_clock(ClockAction::ClockOut, location)
    }

    fn apply_clock(&self, action: ClockAction, location: &str) -> SyncResult<OpId> {
        let id = self.apply_optimistic(action.operation(location), |state, now| {
            state.transition(action, now)
        })?;
        tracing::info!(op = %id, %action, location, "applied locally");
        Ok(id)
    }

    /// Performs a call directly when online, queueing it otherwise.
    ///
    /// Offline, the call is queued unattempted and `Queued` is returned.
    /// Online, a transient failure queues the call and still returns the
    /// error (as [`SyncError::Deferred`]) so the caller can undo its own
    /// optimistic change. Rejections are returned without queueing.
    pub async fn execute_or_queue(&self, op: NewOperation) -> SyncResult<ExecuteOutcome> {
        if !self.connectivity.is_online() {
            let id = self.lock_queue().enqueue(op)?;
            tracing::info!(op = %id, "offline, queued");
            return Ok(ExecuteOutcome::Queued(id));
        }

        let request = Request::from_new(&op);
        match execute_with_refresh(self.executor.as_ref(), &request).await {
            Ok(payload) => Ok(ExecuteOutcome::Completed(payload)),
            Err(error) if error.is_retryable() => {
                let id = self.lock_queue().enqueue(op)?;
                tracing::warn!(op = %id, %error, "direct call failed, queued for retry");
                Err(SyncError::Deferred { id, error })
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Applies one sync outcome to the clock state.
    ///
    /// Returns whether the state changed.
    pub fn reconcile(&self, event: &SyncEvent) -> SyncResult<bool> {
        let mut clock = self.lock_clock();

        let next = match event {
            SyncEvent::Delivered { id, .. } if clock.pending_operation_id == Some(*id) => {
                tracing::debug!(op = %id, "clock operation confirmed");
                ClockState {
                    pending_operation_id: None,
                    prior_start_time: None,
                    ..clock.clone()
                }
            }
            SyncEvent::Dropped { operation, reason } => {
                let Some(action) = ClockAction::from_endpoint(&operation.endpoint) else {
                    return Ok(false);
                };
                let message = drop_message(action, reason);
                if clock.pending_operation_id == Some(operation.id) {
                    match self.policy {
                        DropPolicy::Revert => {
                            tracing::warn!(op = %operation.id, %action, "reverting dropped clock operation");
                            clock.revert(action)
                        }
                        DropPolicy::Surface => {
                            tracing::warn!(op = %operation.id, %message, "clock operation dropped");
                            ClockState {
                                pending_operation_id: None,
                                prior_start_time: None,
                                sync_error: Some(message),
                                ..clock.clone()
                            }
                        }
                    }
                } else {
                    // Superseded by a later transition; reverting would undo that one.
                    tracing::warn!(op = %operation.id, %message, "earlier clock operation dropped");
                    ClockState {
                        sync_error: Some(message),
                        ..clock.clone()
                    }
                }
            }
            _ => return Ok(false),
        };

        self.persist(&next)?;
        *clock = next;
        Ok(true)
    }

    /// Clears a surfaced sync error.
    ///
    /// Returns whether there was one.
    pub fn dismiss_error(&self) -> SyncResult<bool> {
        let mut clock = self.lock_clock();
        if clock.sync_error.is_none() {
            return Ok(false);
        }
        let next = ClockState {
            sync_error: None,
            ..clock.clone()
        };
        self.persist(&next)?;
        *clock = next;
        Ok(true)
    }

    fn persist(&self, state: &ClockState) -> SyncResult<()> {
        let bytes = serde_json::to_vec_pretty(state).map_err(cw_core::Error::from)?;
        self.store.save(CLOCK_BLOB, &bytes)?;
        Ok(())
    }

    fn lock_clock(&self) -> MutexGuard<'_, ClockState> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_queue(&self) -> MutexGuard<'_, DurableQueue<S>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Store, E: Executor> SyncObserver for OptimisticCoordinator<S, E> {
    fn on_sync_event(&self, event: &SyncEvent) {
        if let Err(e) = self.reconcile(event) {
            tracing::error!(error = %e, "failed to reconcile sync outcome");
        }
    }
}

fn drop_message(action: ClockAction, reason: &DropReason) -> String {
    match reason {
        DropReason::Rejected(e) => format!("server rejected {action}: {}", e.message),
        DropReason::RetriesExhausted(e) => {
            format!("could not {action} after repeated failures: {}", e.message)
        }
        DropReason::Discarded => format!("{action} was discarded before delivery"),
    }
}
