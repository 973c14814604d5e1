// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-resilient synchronization engine.
//!
//! Lets a client keep working while disconnected: state-changing calls are
//! applied locally, queued durably, and replayed in order once the remote
//! API is reachable again.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ enqueue ┌──────────────┐ drain  ┌──────────────┐
//! │ Optimistic   │────────►│ DurableQueue │◄───────│  SyncEngine  │
//! │ Coordinator  │         │   (Store)    │        │              │
//! └──────────────┘         └──────────────┘        └──────────────┘
//!        ▲                                           │    ▲
//!        │ SyncEvent                       execute   │    │ wake
//!        └───────────────────────────────────────────┤    │
//!                                                    ▼    │
//!                                           ┌──────────┐ ┌──────────────┐
//!                                           │ Executor │ │ Connectivity │
//!                                           └──────────┘ └──────────────┘
//! ```
//!
//! # Features
//!
//! - Durable queue persisted as JSONL through an injectable [`Store`]
//! - Single-flight, strictly ordered drains with bounded retry
//! - Rejections dropped without retry; one token refresh per 401
//! - Configurable handling of dropped optimistic clock changes
//! - Read-through cache with lazy expiry

mod cache;
mod connectivity;
mod engine;
mod error;
mod executor;
mod optimistic;
mod queue;
mod service;
mod store;

pub use cache::{Fetched, ReadCache};
pub use connectivity::{
    spawn_probe, ConnectivityMonitor, ConnectivityState, ReachabilityProbe, TcpProbe, Transition,
};
pub use engine::{
    DrainOutcome, DropReason, SyncEngine, SyncEvent, SyncObserver, SyncReport, SyncWaker,
};
pub use error::{SyncError, SyncResult};
pub use executor::{
    execute_with_refresh, Credentials, ErrorKind, ExecError, ExecFuture, Executor, HttpExecutor,
    Payload, Request,
};
pub use optimistic::{DropPolicy, ExecuteOutcome, OptimisticCoordinator};
pub use queue::{
    DurableQueue, FailureOutcome, QueueError, QueueResult, RetryPolicy, SharedQueue,
    DEFAULT_MAX_RETRIES,
};
pub use service::{SyncOptions, SyncService, DEFAULT_PERIODIC_SYNC};
pub use store::{
    FileStore, MemoryStore, StateLock, Store, StoreError, StoreResult, CACHE_BLOB, CLOCK_BLOB,
    QUEUE_BLOB,
};

#[cfg(test)]
mod test_helpers;


#[cfg(test)]
mod connectivity_tests;




#[cfg(test)]
mod queue_tests;
