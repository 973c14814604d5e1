// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Local, Utc};
use cw_core::{ClockAction, ClockState};
use serde_json::json;

use crate::cli::{GlobalArgs, OutputFormat};
use crate::error::Result;
use crate::sync::DrainOutcome;

use super::{count_ops, format_elapsed, print_json, App};

pub async fn clock_in(global: &GlobalArgs, location: &str, output: OutputFormat) -> Result<()> {
    apply(global, ClockAction::ClockIn, location, output).await
}

pub async fn clock_out(global: &GlobalArgs, location: &str, output: OutputFormat) -> Result<()> {
    apply(global, ClockAction::ClockOut, location, output).await
}

/// Applies a clock change locally, then tries to deliver it at once.
async fn apply(
    global: &GlobalArgs,
    action: ClockAction,
    location: &str,
    output: OutputFormat,
) -> Result<()> {
    let app = App::open(global).await?;
    let coordinator = app.service.coordinator();
    match action {
        ClockAction::ClockIn => coordinator.clock_in(location)?,
        ClockAction::ClockOut => coordinator.clock_out(location)?,
    };

    if app.is_online() {
        match app.service.sync_now().await {
            Ok(DrainOutcome::Completed(report)) => {
                tracing::debug!(?report, "delivered after clock change");
            }
            Ok(outcome) => tracing::debug!(?outcome, "clock change left queued"),
            Err(e) => tracing::warn!(error = %e, "sync after clock change failed"),
        }
    }

    let state = app.service.clock_state();
    let pending = app.service.pending_count();
    match output {
        OutputFormat::Text => {
            println!("{}", describe_change(action, &state, location));
            if let Some(note) = pending_note(&state, pending) {
                println!("{}", note);
            }
            if let Some(error) = &state.sync_error {
                println!("warning: {}", error);
            }
        }
        OutputFormat::Json => print_json(&status_json(
            &state,
            pending,
            Some(app.is_online()),
            Utc::now(),
        ))?,
    }
    Ok(())
}

pub fn status(global: &GlobalArgs, output: OutputFormat) -> Result<()> {
    let app = App::open_local(global)?;
    let state = app.service.clock_state();
    let pending = app.service.pending_count();
    let now = Utc::now();

    match output {
        OutputFormat::Text => print!("{}", format_status(&state, pending, now)),
        OutputFormat::Json => print_json(&status_json(&state, pending, None, now))?,
    }
    Ok(())
}

pub fn dismiss(global: &GlobalArgs) -> Result<()> {
    let app = App::open_local(global)?;
    if app.service.coordinator().dismiss_error()? {
        println!("Sync error cleared.");
    } else {
        println!("No sync error to clear.");
    }
    Ok(())
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub(crate) fn describe_change(action: ClockAction, state: &ClockState, location: &str) -> String {
    match (action, state.start_time) {
        (ClockAction::ClockIn, Some(start)) => {
            format!("Clocked in at {} ({})", local_time(start), location)
        }
        (ClockAction::ClockIn, None) => format!("Clocked in ({})", location),
        (ClockAction::ClockOut, _) => format!("Clocked out ({})", location),
    }
}

pub(crate) fn pending_note(state: &ClockState, pending: usize) -> Option<String> {
    if !state.is_pending() {
        return None;
    }
    Some(format!(
        "Not yet confirmed by the server; {} queued.",
        count_ops(pending)
    ))
}

pub(crate) fn format_status(state: &ClockState, pending: usize, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    match (state.is_clocked_in, state.start_time) {
        (true, Some(start)) => {
            let elapsed = state.elapsed(now).map(format_elapsed).unwrap_or_default();
            out.push_str(&format!(
                "Clocked in since {} ({})\n",
                local_time(start),
                elapsed
            ));
        }
        (true, None) => out.push_str("Clocked in\n"),
        (false, _) => out.push_str("Clocked out\n"),
    }
    if state.is_pending() {
        out.push_str("Last change: awaiting confirmation\n");
    }
    out.push_str(&format!("Pending: {}\n", count_ops(pending)));
    if let Some(error) = &state.sync_error {
        out.push_str(&format!(
            "Sync error: {}\n  hint: run 'cw dismiss' to clear\n",
            error
        ));
    }
    out
}

pub(crate) fn status_json(
    state: &ClockState,
    pending: usize,
    online: Option<bool>,
    now: DateTime<Utc>,
) -> serde_json::Value {
    json!({
        "is_clocked_in": state.is_clocked_in,
        "start_time": state.start_time,
        "elapsed_secs": state.elapsed(now).map(|d| d.num_seconds()),
        "pending_operation_id": state.pending_operation_id,
        "sync_error": state.sync_error,
        "pending": pending,
        "online": online,
    })
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
