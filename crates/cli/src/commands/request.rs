// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use cw_core::{Method, NewOperation};
use serde_json::{json, Value};

use crate::cli::{GlobalArgs, OutputFormat};
use crate::config::max_age_from_secs;
use crate::error::{Error, Result};
use crate::sync::{ExecuteOutcome, Fetched};

use super::{print_json, App};

/// Sends a request now, or queues it when the API is unreachable.
pub async fn request(
    global: &GlobalArgs,
    method: Method,
    endpoint: &str,
    body: Option<&str>,
    output: OutputFormat,
) -> Result<()> {
    let endpoint = validate_endpoint(endpoint)?;
    let mut op = NewOperation::new(method, endpoint);
    if let Some(body) = body {
        op = op.with_body(parse_body(body)?);
    }

    let app = App::open(global).await?;
    let outcome = app.service.coordinator().execute_or_queue(op).await?;

    match (outcome, output) {
        (ExecuteOutcome::Completed(payload), OutputFormat::Text) => print_payload(&payload)?,
        (ExecuteOutcome::Completed(payload), OutputFormat::Json) => {
            print_json(&json!({ "status": "completed", "payload": payload }))?
        }
        (ExecuteOutcome::Queued(id), OutputFormat::Text) => {
            println!("API unreachable; queued as {}.", id)
        }
        (ExecuteOutcome::Queued(id), OutputFormat::Json) => {
            print_json(&json!({ "status": "queued", "id": id }))?
        }
    }
    Ok(())
}

/// Reads `endpoint` through the cache.
pub async fn get(
    global: &GlobalArgs,
    endpoint: &str,
    max_age_secs: Option<u64>,
    output: OutputFormat,
) -> Result<()> {
    let endpoint = validate_endpoint(endpoint)?;
    let app = App::open(global).await?;
    let max_age = match max_age_secs {
        Some(secs) => max_age_from_secs(secs),
        None => app.config.cache_max_age(),
    };

    let Fetched {
        payload,
        from_cache,
    } = app.service.fetch(endpoint, max_age).await?;

    match output {
        OutputFormat::Text => {
            if from_cache {
                eprintln!("(cached)");
            }
            print_payload(&payload)?;
        }
        OutputFormat::Json => print_json(&json!({ "from_cache": from_cache, "payload": payload }))?,
    }
    Ok(())
}

/// Endpoints are paths relative to the API base URL.
pub(crate) fn validate_endpoint(endpoint: &str) -> Result<&str> {
    let endpoint = endpoint.trim();
    if !endpoint.starts_with('/') || endpoint.contains("://") || endpoint.contains(char::is_whitespace)
    {
        return Err(Error::InvalidEndpoint(endpoint.to_string()));
    }
    Ok(endpoint)
}

pub(crate) fn parse_body(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| Error::InvalidBody {
        reason: e.to_string(),
    })
}

fn print_payload(payload: &Value) -> Result<()> {
    match payload {
        Value::Null => {}
        Value::String(text) => println!("{}", text),
        other => print_json(other)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
