// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued operations for offline replay.
//!
//! Every state-changing call a client makes is described as an operation:
//! an endpoint, an HTTP method and an optional JSON body. Operations are
//! queued durably while offline and replayed in insertion order once the
//! remote API is reachable again.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Opaque, unique identifier for a queued operation.
///
/// The id is also sent as the idempotency key when the operation is
/// replayed, so a backend that honors it can discard duplicate deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpId(Uuid);

impl OpId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        OpId(Uuid::new_v4())
    }

    /// Returns the id as a hyphenated string, suitable for headers.
    pub fn idempotency_key(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl Default for OpId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for OpId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(OpId)
            .map_err(|_| Error::InvalidOpId(s.to_string()))
    }
}

/// HTTP method of a remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

/// An operation as requested by a caller, before the queue assigns it an
/// id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOperation {
    pub endpoint: String,
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl NewOperation {
    /// Creates a new operation description.
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        NewOperation {
            endpoint: endpoint.into(),
            method,
            body: None,
        }
    }

    /// Attaches a JSON body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A pending operation held by the durable queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOperation {
    pub id: OpId,
    pub endpoint: String,
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    pub enqueued_at: DateTime<Utc>,
    /// Number of failed delivery attempts so far.
    #[serde(default)]
    pub retry_count: u32,
}

impl QueuedOperation {
    /// Stamps a caller's operation with a fresh id and enqueue time.
    pub fn from_new(op: NewOperation, enqueued_at: DateTime<Utc>) -> Self {
        QueuedOperation {
            id: OpId::new(),
            endpoint: op.endpoint,
            method: op.method,
            body: op.body,
            enqueued_at,
            retry_count: 0,
        }
    }

    /// Short human-readable description, e.g. `POST /time/clock-in`.
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.endpoint)
    }
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
