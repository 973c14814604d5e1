// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use cw_core::{ManualTime, Method, NewOperation};
use tokio::sync::Semaphore;

use super::executor::{ErrorKind, ExecError, ExecFuture, Executor, Payload, Request};

/// Fixed starting instant for manual clocks.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

/// A manual clock starting at [`start_time`].
pub fn manual_time() -> Arc<ManualTime> {
    Arc::new(ManualTime::new(start_time()))
}

/// Create a POST operation against the given endpoint.
pub fn make_test_op(endpoint: &str) -> NewOperation {
    NewOperation::new(Method::Post, endpoint).with_body(serde_json::json!({ "source": "test" }))
}

/// Scripted executor recording every request it receives.
///
/// Responses are scripted per endpoint and consumed in order; an endpoint
/// with no scripted response succeeds with `null`.
#[derive(Default)]
pub struct MockExecutor {
    calls: Mutex<Vec<Request>>,
    responses: Mutex<HashMap<String, VecDeque<Result<Payload, ExecError>>>>,
    refresh_results: Mutex<VecDeque<Result<(), ExecError>>>,
    refreshes: AtomicUsize,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next call to `endpoint`.
    pub fn respond(&self, endpoint: &str, result: Result<Payload, ExecError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(result);
    }

    /// Queue `count` failures of the given kind for `endpoint`.
    pub fn fail(&self, endpoint: &str, kind: ErrorKind, count: usize) {
        for _ in 0..count {
            self.respond(endpoint, Err(ExecError::new(kind, "scripted failure")));
        }
    }

    /// Queue the outcome of the next refresh. Refreshes succeed by default.
    pub fn respond_refresh(&self, result: Result<(), ExecError>) {
        self.refresh_results.lock().unwrap().push_back(result);
    }

    /// Make every call wait for a permit from `gate`.
    pub fn set_gate(&self, gate: Arc<Semaphore>) {
        *self.gate.lock().unwrap() = Some(gate);
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    /// Endpoints called so far, in order.
    pub fn endpoints(&self) -> Vec<String> {
        self.calls().into_iter().map(|r| r.endpoint).collect()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl Executor for MockExecutor {
    fn execute<'a>(&'a self, request: &'a Request) -> ExecFuture<'a, Payload> {
        Box::pin(async move {
            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.acquire().await.unwrap().forget();
            }
            self.calls.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .get_mut(&request.endpoint)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Ok(Payload::Null))
        })
    }

    fn refresh_auth(&self) -> ExecFuture<'_, ()> {
        Box::pin(async move {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            self.refresh_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(()))
        })
    }
}
