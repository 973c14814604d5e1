// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read-through cache for idempotent reads.
//!
//! Expiry is lazy: freshness is only checked when an entry is read.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Duration;
use cw_core::{CacheEntry, SystemTime, TimeSource};

use super::error::SyncResult;
use super::executor::{execute_with_refresh, Executor, Payload, Request};
use super::store::{Store, CACHE_BLOB};

/// A read served by [`ReadCache::fetch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub payload: Payload,
    pub from_cache: bool,
}

/// Keyed cache of read responses, persisted as one map.
pub struct ReadCache<S: Store> {
    store: S,
    entries: Mutex<HashMap<String, CacheEntry>>,
    time: Arc<dyn TimeSource>,
}

impl<S: Store> ReadCache<S> {
    pub fn open(store: S) -> Self {
        Self::with_time(store, Arc::new(SystemTime))
    }

    /// Loads persisted entries. An unreadable blob is discarded.
    pub fn with_time(store: S, time: Arc<dyn TimeSource>) -> Self {
        let entries = match store.load(CACHE_BLOB) {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding unreadable read cache");
                HashMap::new()
            }),
            Ok(None) => HashMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load read cache");
                HashMap::new()
            }
        };

        ReadCache {
            store,
            entries: Mutex::new(entries),
            time,
        }
    }

    /// Returns the payload for `key` if stored less than `max_age` ago.
    pub fn get(&self, key: &str, max_age: Duration) -> Option<Payload> {
        let now = self.time.now();
        self.lock()
            .get(key)
            .filter(|entry| entry.is_fresh(now, max_age))
            .map(|entry| entry.payload.clone())
    }

    /// Stores `payload` under `key`, stamped with the current time.
    pub fn put(&self, key: &str, payload: Payload) -> SyncResult<()> {
        let entry = CacheEntry::new(key, payload, self.time.now());
        let mut entries = self.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), entry);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Serves `GET endpoint` from cache, or performs it and caches the
    /// result. A failure to save the cache does not fail the read.
    pub async fn fetch<E>(&self, executor: &E, endpoint: &str, max_age: Duration) -> SyncResult<Fetched>
    where
        E: Executor + ?Sized,
    {
        if let Some(payload) = self.get(endpoint, max_age) {
            tracing::debug!(endpoint, "cache hit");
            return Ok(Fetched {
                payload,
                from_cache: true,
            });
        }

        tracing::debug!(endpoint, "cache miss");
        let payload = execute_with_refresh(executor, &Request::get(endpoint)).await?;
        if let Err(e) = self.put(endpoint, payload.clone()) {
            tracing::warn!(endpoint, error = %e, "failed to cache response");
        }
        Ok(Fetched {
            payload,
            from_cache: false,
        })
    }

    fn persist(&self, entries: &HashMap<String, CacheEntry>) -> SyncResult<()> {
        let bytes = serde_json::to_vec(entries).map_err(cw_core::Error::from)?;
        self.store.save(CACHE_BLOB, &bytes)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
