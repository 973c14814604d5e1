// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue of operations awaiting delivery.
//!
//! The queue is stored in JSONL format, one operation per line. Every
//! mutation computes the next snapshot, persists all of it, and only then
//! updates memory, so a failed save leaves both sides unchanged.

use std::sync::{Arc, Mutex};

use cw_core::{jsonl, NewOperation, OpId, QueuedOperation, SystemTime, TimeSource};
use serde::{Deserialize, Serialize};

use super::store::{Store, StoreError, QUEUE_BLOB};

/// Default number of failed attempts before an operation is dropped.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Error type for queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Persistence error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Queue blob could not be encoded or decoded.
    #[error("queue data error: {0}")]
    Data(#[from] cw_core::Error),

    /// No queued operation has this id.
    #[error("no queued operation with id {0}")]
    NotFound(OpId),
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// How many failed deliveries an operation is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        RetryPolicy { max_retries }
    }

    /// Whether an operation that has now failed `retry_count` times is
    /// out of budget.
    pub fn exhausted(&self, retry_count: u32) -> bool {
        retry_count >= self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(DEFAULT_MAX_RETRIES)
    }
}

/// Result of recording a failed delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureOutcome {
    /// The operation stays queued with an incremented retry count.
    Retrying { retry_count: u32 },
    /// The retry budget is spent and the operation was removed.
    Dropped(QueuedOperation),
}

/// Ordered, persisted list of pending operations.
pub struct DurableQueue<S: Store> {
    store: S,
    ops: Vec<QueuedOperation>,
    policy: RetryPolicy,
    time: Arc<dyn TimeSource>,
}

/// A queue shared between the engine and the coordinator.
pub type SharedQueue<S> = Arc<Mutex<DurableQueue<S>>>;

impl<S: Store> DurableQueue<S> {
    /// Loads the queue from `store`, or starts empty if nothing was saved.
    pub fn open(store: S, policy: RetryPolicy) -> QueueResult<Self> {
        Self::with_time(store, policy, Arc::new(SystemTime))
    }

    /// Like [`DurableQueue::open`] with an injected clock for timestamps.
    pub fn with_time(
        store: S,
        policy: RetryPolicy,
        time: Arc<dyn TimeSource>,
    ) -> QueueResult<Self> {
        let ops: Vec<QueuedOperation> = match store.load(QUEUE_BLOB)? {
            Some(bytes) => jsonl::decode(&bytes)?,
            None => Vec::new(),
        };
        if !ops.is_empty() {
            tracing::debug!(count = ops.len(), "loaded offline queue");
        }

        Ok(DurableQueue {
            store,
            ops,
            policy,
            time,
        })
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Appends an operation, persisting it before returning its id.
    pub fn enqueue(&mut self, op: NewOperation) -> QueueResult<OpId> {
        let queued = QueuedOperation::from_new(op, self.time.now());
        let id = queued.id;
        tracing::debug!(op = %id, request = %queued.describe(), "enqueued");

        let mut next = self.ops.clone();
        next.push(queued);
        self.commit(next)?;
        Ok(id)
    }

    /// Snapshot of pending operations in insertion order.
    pub fn peek_ordered(&self) -> Vec<QueuedOperation> {
        self.ops.clone()
    }

    pub fn get(&self, id: OpId) -> Option<&QueuedOperation> {
        self.ops.iter().find(|op| op.id == id)
    }

    /// Removes a delivered operation.
    ///
    /// Returns `false` if it was no longer queued.
    pub fn mark_succeeded(&mut self, id: OpId) -> QueueResult<bool> {
        Ok(self.discard(id)?.is_some())
    }

    /// Records a failed delivery.
    ///
    /// Increments the retry count, or removes the operation once the
    /// policy says its budget is spent.
    pub fn mark_failed(&mut self, id: OpId) -> QueueResult<FailureOutcome> {
        let index = self.position(id).ok_or(QueueError::NotFound(id))?;
        let retry_count = self.ops[index].retry_count.saturating_add(1);
        let mut next = self.ops.clone();

        if self.policy.exhausted(retry_count) {
            let mut dropped = next.remove(index);
            dropped.retry_count = retry_count;
            self.commit(next)?;
            tracing::warn!(
                op = %id,
                request = %dropped.describe(),
                retry_count,
                "retry budget exhausted, dropping operation"
            );
            Ok(FailureOutcome::Dropped(dropped))
        } else {
            next[index].retry_count = retry_count;
            self.commit(next)?;
            Ok(FailureOutcome::Retrying { retry_count })
        }
    }

    /// Removes an operation without delivering it.
    pub fn discard(&mut self, id: OpId) -> QueueResult<Option<QueuedOperation>> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };
        let mut next = self.ops.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        Ok(Some(removed))
    }

    /// Removes every pending operation, returning them in delivery order.
    pub fn clear(&mut self) -> QueueResult<Vec<QueuedOperation>> {
        let removed = self.ops.clone();
        self.commit(Vec::new())?;
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    fn position(&self, id: OpId) -> Option<usize> {
        self.ops.iter().position(|op| op.id == id)
    }

    fn commit(&mut self, next: Vec<QueuedOperation>) -> QueueResult<()> {
        let bytes = jsonl::encode(&next)?;
        self.store.save(QUEUE_BLOB, &bytes)?;
        self.ops = next;
        Ok(())
    }
}
