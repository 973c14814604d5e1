// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cached read results and their freshness rule.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default freshness window for cached reads, in milliseconds.
pub const DEFAULT_MAX_AGE_MS: i64 = 3_600_000;

/// Default freshness window for cached reads.
pub fn default_max_age() -> Duration {
    Duration::milliseconds(DEFAULT_MAX_AGE_MS)
}

/// A cached payload with the time it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: serde_json::Value,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, payload: serde_json::Value, stored_at: DateTime<Utc>) -> Self {
        CacheEntry {
            key: key.into(),
            payload,
            stored_at,
        }
    }

    /// An entry is fresh while `now - stored_at < max_age`.
    ///
    /// Entries stamped in the future (clock moved backwards) count as fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now - self.stored_at < max_age
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
