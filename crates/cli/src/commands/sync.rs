// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use cw_core::QueuedOperation;
use serde_json::json;

use crate::cli::{GlobalArgs, OutputFormat};
use crate::error::Result;
use crate::sync::DrainOutcome;

use super::{count_ops, print_json, App};

/// Lists queued operations in delivery order, or discards them all.
pub fn queue(global: &GlobalArgs, clear: bool, output: OutputFormat) -> Result<()> {
    let app = App::open_local(global)?;
    if clear {
        return clear_queue(&app, output);
    }
    let ops = app.service.pending_operations();

    match output {
        OutputFormat::Text => {
            if ops.is_empty() {
                println!("Queue is empty.");
            }
            for op in &ops {
                println!("{}", format_op(op));
            }
        }
        OutputFormat::Json => print_json(&serde_json::to_value(&ops)?)?,
    }
    Ok(())
}

fn clear_queue(app: &App, output: OutputFormat) -> Result<()> {
    let cleared = app.service.clear_queue()?;
    match output {
        OutputFormat::Text => {
            println!("Discarded {}.", count_ops(cleared));
            if let Some(error) = app.service.clock_state().sync_error {
                println!("warning: {}", error);
            }
        }
        OutputFormat::Json => print_json(&json!({ "cleared": cleared }))?,
    }
    Ok(())
}

/// Delivers queued operations now.
pub async fn sync(global: &GlobalArgs, output: OutputFormat) -> Result<()> {
    let app = App::open(global).await?;
    let outcome = app.service.sync_now().await?;
    let remaining = app.service.pending_count();

    match output {
        OutputFormat::Text => {
            println!("{}", format_outcome(&outcome, remaining));
            if let Some(error) = app.service.clock_state().sync_error {
                println!("warning: {}", error);
            }
        }
        OutputFormat::Json => print_json(&outcome_json(&outcome, remaining))?,
    }
    Ok(())
}

pub(crate) fn format_op(op: &QueuedOperation) -> String {
    let mut line = format!(
        "{}  {:<28}  queued {}",
        op.id,
        op.describe(),
        op.enqueued_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if op.retry_count > 0 {
        line.push_str(&format!("  ({} failed)", op.retry_count));
    }
    line
}

pub(crate) fn format_outcome(outcome: &DrainOutcome, remaining: usize) -> String {
    match outcome {
        DrainOutcome::Offline => format!(
            "API unreachable; {} still queued.",
            count_ops(remaining)
        ),
        DrainOutcome::AlreadyRunning => "A sync is already in progress.".to_string(),
        DrainOutcome::Completed(report) if report.is_noop() && remaining == 0 => {
            "Nothing to sync.".to_string()
        }
        DrainOutcome::Completed(report) => format!(
            "Delivered {}, retrying {}, dropped {}; {} remaining.",
            report.delivered,
            report.retried,
            report.dropped,
            count_ops(report.remaining)
        ),
    }
}

pub(crate) fn outcome_json(outcome: &DrainOutcome, remaining: usize) -> serde_json::Value {
    match outcome {
        DrainOutcome::Offline => json!({ "outcome": "offline", "remaining": remaining }),
        DrainOutcome::AlreadyRunning => {
            json!({ "outcome": "already_running", "remaining": remaining })
        }
        DrainOutcome::Completed(report) => json!({
            "outcome": "completed",
            "delivered": report.delivered,
            "retried": report.retried,
            "dropped": report.dropped,
            "remaining": report.remaining,
        }),
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
