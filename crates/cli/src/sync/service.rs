// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The sync service: one object wiring the sync components together over
//! an injected store, executor and connectivity monitor.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Duration as MaxAge;
use cw_core::{ClockState, QueuedOperation, SystemTime, TimeSource};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::cache::{Fetched, ReadCache};
use super::connectivity::ConnectivityMonitor;
use super::engine::{DrainOutcome, SyncEngine, SyncObserver};
use super::error::SyncResult;
use super::executor::Executor;
use super::optimistic::{DropPolicy, OptimisticCoordinator};
use super::queue::{DurableQueue, RetryPolicy};
use super::store::Store;

/// Default interval of the foreground sync pass.
pub const DEFAULT_PERIODIC_SYNC: Duration = Duration::from_secs(60);

/// Tunables for [`SyncService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub retry: RetryPolicy,
    pub drop_policy: DropPolicy,
    /// Interval of the periodic pass; `None` drains only when woken.
    pub periodic_sync: Option<Duration>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            retry: RetryPolicy::default(),
            drop_policy: DropPolicy::default(),
            periodic_sync: Some(DEFAULT_PERIODIC_SYNC),
        }
    }
}

pub struct SyncService<S: Store + Clone, E: Executor> {
    engine: Arc<SyncEngine<S, E>>,
    coordinator: Arc<OptimisticCoordinator<S, E>>,
    cache: ReadCache<S>,
    connectivity: Arc<ConnectivityMonitor>,
    options: SyncOptions,
}

impl<S, E> SyncService<S, E>
where
    S: Store + Clone + 'static,
    E: Executor + 'static,
{
    pub fn open(
        store: S,
        executor: Arc<E>,
        connectivity: Arc<ConnectivityMonitor>,
        options: SyncOptions,
    ) -> SyncResult<Self> {
        Self::with_time(store, executor, connectivity, options, Arc::new(SystemTime))
    }

    /// Loads persisted state, links the coordinator to the engine's
    /// outcomes and registers the reconnect wake-up.
    pub fn with_time(
        store: S,
        executor: Arc<E>,
        connectivity: Arc<ConnectivityMonitor>,
        options: SyncOptions,
        time: Arc<dyn TimeSource>,
    ) -> SyncResult<Self> {
        let queue = DurableQueue::with_time(store.clone(), options.retry, Arc::clone(&time))?;
        let engine = Arc::new(SyncEngine::new(
            Arc::new(Mutex::new(queue)),
            executor,
            Arc::clone(&connectivity),
        ));
        let coordinator = Arc::new(OptimisticCoordinator::with_time(
            store.clone(),
            &engine,
            options.drop_policy,
            Arc::clone(&time),
        )?);
        engine.add_observer(Arc::clone(&coordinator) as Arc<dyn SyncObserver>);
        let cache = ReadCache::with_time(store, time);

        let waker = engine.waker();
        connectivity.on_reconnect(move || waker.wake());

        Ok(SyncService {
            engine,
            coordinator,
            cache,
            connectivity,
            options,
        })
    }

    pub fn engine(&self) -> &Arc<SyncEngine<S, E>> {
        &self.engine
    }

    pub fn coordinator(&self) -> &Arc<OptimisticCoordinator<S, E>> {
        &self.coordinator
    }

    pub fn cache(&self) -> &ReadCache<S> {
        &self.cache
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    pub fn clock_state(&self) -> ClockState {
        self.coordinator.clock_state()
    }

    pub fn pending_count(&self) -> usize {
        self.engine.pending_count()
    }

    pub fn pending_operations(&self) -> Vec<QueuedOperation> {
        self.engine.pending_operations()
    }

    /// Runs one drain. Outcomes are reconciled as they happen, so the
    /// clock state is current when this returns.
    pub async fn sync_now(&self) -> SyncResult<DrainOutcome> {
        Ok(self.engine.trigger_sync().await?)
    }

    /// Discards every queued operation. A pending clock change is settled
    /// under the drop policy like any other undelivered one.
    pub fn clear_queue(&self) -> SyncResult<usize> {
        Ok(self.engine.discard_all()?)
    }

    /// Reads `endpoint` through the cache.
    pub async fn fetch(&self, endpoint: &str, max_age: MaxAge) -> SyncResult<Fetched> {
        self.cache
            .fetch(self.engine.executor().as_ref(), endpoint, max_age)
            .await
    }

    /// Starts the sync worker until `cancel` fires.
    pub fn spawn(&self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        let worker = tokio::spawn(
            Arc::clone(&self.engine).run(self.options.periodic_sync, cancel),
        );
        vec![worker]
    }
}
