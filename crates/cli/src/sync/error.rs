// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error type for the sync layer.

use cw_core::OpId;

use super::executor::ExecError;
use super::queue::QueueError;
use super::store::StoreError;

/// Error type for sync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Invalid state transition or undecodable state.
    #[error(transparent)]
    State(#[from] cw_core::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// The API refused or failed a direct call, and nothing was queued.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// A direct call failed transiently and was queued for replay.
    #[error("{error} (queued for retry as {id})")]
    Deferred { id: OpId, error: ExecError },
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
