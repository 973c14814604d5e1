// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use cw_core::OpId;
use thiserror::Error;

use crate::channel::ChannelError;
use crate::sync::{ErrorKind, ExecError, QueueError, StoreError, SyncError};

/// All errors surfaced by the `cw` command line.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    State(cw_core::Error),

    #[error("state directory {} is in use by another process\n  hint: stop the other 'cw' process (such as 'cw run') and try again", .0.display())]
    StateLocked(PathBuf),

    #[error("{0}\n  hint: set CW_ACCESS_TOKEN or api.access_token in the config file")]
    Unauthorized(ExecError),

    #[error("{0}\n  hint: the API refused this request; it will not be retried")]
    Rejected(ExecError),

    #[error("{0}\n  hint: the API may be unreachable; state-changing requests are queued while offline")]
    Remote(ExecError),

    #[error("{error}\n  hint: queued as {id}; it will be retried by 'cw sync' or 'cw run'")]
    Deferred { id: OpId, error: ExecError },

    #[error("invalid request body: {reason}\n  hint: --body takes a JSON document")]
    InvalidBody { reason: String },

    #[error("invalid endpoint '{0}'\n  hint: endpoints are paths relative to the API base URL, e.g. /time/status")]
    InvalidEndpoint(String),

    #[error("event channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("queue error: {0}")]
    Queue(QueueError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<cw_core::Error> for Error {
    fn from(err: cw_core::Error) -> Self {
        Error::State(err)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Locked(path) => Error::StateLocked(path),
            other => Error::Store(other),
        }
    }
}

impl From<QueueError> for Error {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Store(store) => store.into(),
            other => Error::Queue(other),
        }
    }
}

impl From<ExecError> for Error {
    fn from(err: ExecError) -> Self {
        match err.kind {
            ErrorKind::Unauthorized => Error::Unauthorized(err),
            ErrorKind::Validation => Error::Rejected(err),
            ErrorKind::Network | ErrorKind::Server => Error::Remote(err),
        }
    }
}

impl From<SyncError> for Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::State(e) => e.into(),
            SyncError::Store(e) => e.into(),
            SyncError::Queue(e) => e.into(),
            SyncError::Exec(e) => e.into(),
            SyncError::Deferred { id, error } => Error::Deferred { id, error },
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
