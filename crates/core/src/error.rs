// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for cw-core operations.

use thiserror::Error;

/// All possible errors that can occur in cw-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid clock transition: cannot {action} while {state}\n  hint: {hint}")]
    InvalidTransition {
        action: String,
        state: String,
        hint: &'static str,
    },

    #[error("invalid method: '{0}'\n  hint: valid methods are: GET, POST, PUT, DELETE")]
    InvalidMethod(String),

    #[error("invalid operation id: '{0}'")]
    InvalidOpId(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for cw-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
