// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote executor: performs one request against the remote API.
//!
//! The sync engine only depends on the [`Executor`] trait. Failures carry
//! an [`ErrorKind`] so callers can tell transient errors (worth retrying)
//! from rejections (never worth retrying).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use cw_core::{Method, NewOperation, QueuedOperation};
use serde_json::Value;

/// Response body of a successful request.
pub type Payload = Value;

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or timeout.
    Network,
    /// 401 from the API.
    Unauthorized,
    /// Any other 4xx: the request itself is wrong.
    Validation,
    /// 5xx from the API, or a 408/429 asking the client to come back later.
    Server,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => f.write_str("network error"),
            ErrorKind::Unauthorized => f.write_str("unauthorized"),
            ErrorKind::Validation => f.write_str("rejected"),
            ErrorKind::Server => f.write_str("server error"),
        }
    }
}

/// A failed request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ExecError {
    pub kind: ErrorKind,
    /// HTTP status, when the API answered.
    pub status: Option<u16>,
    pub message: String,
}

impl ExecError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ExecError {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Server, message)
    }

    /// Builds the error for a non-success HTTP response.
    ///
    /// The message is the API's `detail` field when present, else the raw
    /// body, else a generic text naming the status.
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            401 => ErrorKind::Unauthorized,
            408 | 429 => ErrorKind::Server,
            400..=499 => ErrorKind::Validation,
            _ => ErrorKind::Server,
        };
        ExecError {
            kind,
            status: Some(status),
            message: error_detail(body).unwrap_or_else(|| format!("HTTP error {status}")),
        }
    }

    /// Whether the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind, ErrorKind::Validation)
    }
}

fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
            None => Some(trimmed.to_string()),
        },
        _ => Some(trimmed.to_string()),
    }
}

/// One request to the remote API.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub endpoint: String,
    pub method: Method,
    pub body: Option<Value>,
    /// Sent as `Idempotency-Key` so replays can be deduplicated.
    pub idempotency_key: Option<String>,
}

impl Request {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Request {
            endpoint: endpoint.into(),
            method,
            body: None,
            idempotency_key: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    pub fn from_new(op: &NewOperation) -> Self {
        Request {
            endpoint: op.endpoint.clone(),
            method: op.method,
            body: op.body.clone(),
            idempotency_key: None,
        }
    }

    /// Replay request for a queued operation, keyed by its id.
    pub fn from_queued(op: &QueuedOperation) -> Self {
        Request {
            endpoint: op.endpoint.clone(),
            method: op.method,
            body: op.body.clone(),
            idempotency_key: Some(op.id.idempotency_key()),
        }
    }
}

/// Boxed future returned by executor methods.
pub type ExecFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ExecError>> + Send + 'a>>;

/// Performs requests against the remote API.
pub trait Executor: Send + Sync {
    /// Performs one request.
    fn execute<'a>(&'a self, request: &'a Request) -> ExecFuture<'a, Payload>;

    /// Obtains a fresh access token.
    fn refresh_auth(&self) -> ExecFuture<'_, ()>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute<'a>(&'a self, request: &'a Request) -> ExecFuture<'a, Payload> {
        (**self).execute(request)
    }

    fn refresh_auth(&self) -> ExecFuture<'_, ()> {
        (**self).refresh_auth()
    }
}

/// Performs `request`, refreshing credentials and retrying once on 401.
///
/// A failed refresh returns the original 401, and a second 401 is returned
/// as is, so a logical call makes at most two requests and one refresh.
pub async fn execute_with_refresh<E>(executor: &E, request: &Request) -> Result<Payload, ExecError>
where
    E: Executor + ?Sized,
{
    match executor.execute(request).await {
        Err(e) if e.kind == ErrorKind::Unauthorized => {
            tracing::debug!(endpoint = %request.endpoint, "unauthorized, refreshing token");
            if let Err(refresh) = executor.refresh_auth().await {
                tracing::warn!(error = %refresh, "token refresh failed");
                return Err(e);
            }
            executor.execute(request).await
        }
        other => other,
    }
}

/// API credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// [`Executor`] speaking JSON over HTTP with bearer-token auth.
pub struct HttpExecutor {
    client: reqwest::Client,
    base_url: String,
    credentials: RwLock<Credentials>,
}

impl HttpExecutor {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ExecError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExecError::network(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpExecutor {
            client,
            base_url: base_url.into(),
            credentials: RwLock::new(credentials),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path.
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    pub fn access_token(&self) -> Option<String> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token
            .clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .refresh_token
            .clone()
    }

    async fn send(&self, request: &Request) -> Result<Payload, ExecError> {
        let url = self.url(&request.endpoint);
        let mut builder = self.client.request(to_reqwest(request.method), &url);

        if let Some(token) = self.access_token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(key) = &request.idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = %request.method, %url, "request");
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(ExecError::from_status(status.as_u16(), &text));
        }
        Ok(parse_payload(&text))
    }

    async fn refresh(&self) -> Result<(), ExecError> {
        let refresh_token = self
            .refresh_token()
            .ok_or_else(|| ExecError::unauthorized("no refresh token available"))?;

        let response = self
            .client
            .post(self.url("/auth/refresh"))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(ExecError::from_status(status.as_u16(), &text));
        }

        let access_token = parse_payload(&text)
            .get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ExecError::unauthorized("refresh response has no access_token"))?;

        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token = Some(access_token);
        tracing::info!("access token refreshed");
        Ok(())
    }
}

impl Executor for HttpExecutor {
    fn execute<'a>(&'a self, request: &'a Request) -> ExecFuture<'a, Payload> {
        Box::pin(self.send(request))
    }

    fn refresh_auth(&self) -> ExecFuture<'_, ()> {
        Box::pin(self.refresh())
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn transport_error(e: reqwest::Error) -> ExecError {
    if e.is_timeout() {
        ExecError::network(format!("request timed out: {e}"))
    } else {
        ExecError::network(e.to_string())
    }
}

/// Empty bodies become `null`; non-JSON bodies are kept as a string.
fn parse_payload(text: &str) -> Payload {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
