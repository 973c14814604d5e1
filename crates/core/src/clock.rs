// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Clock-in/clock-out state tracked optimistically on the client.
//!
//! ```text
//!   ClockedOut --clock_in--> ClockedIn --clock_out--> ClockedOut
//! ```
//!
//! Transitions apply immediately. The queued remote call that confirms a
//! transition is referenced through `pending_operation_id` until it is
//! delivered or dropped.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::op::{Method, NewOperation, OpId};

/// Location reported with clock operations when the caller gives none.
pub const DEFAULT_LOCATION: &str = "Desktop";

/// A user action that changes the clock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockAction {
    ClockIn,
    ClockOut,
}

impl ClockAction {
    /// Endpoint of the remote call that records this action.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ClockAction::ClockIn => "/time/clock-in",
            ClockAction::ClockOut => "/time/clock-out",
        }
    }

    /// Builds the remote operation for this action.
    pub fn operation(&self, location: &str) -> NewOperation {
        NewOperation::new(Method::Post, self.endpoint())
            .with_body(serde_json::json!({ "location": location }))
    }

    /// Recognizes the action a queued endpoint stands for.
    pub fn from_endpoint(endpoint: &str) -> Option<Self> {
        if endpoint.ends_with("/clock-in") {
            Some(ClockAction::ClockIn)
        } else if endpoint.ends_with("/clock-out") {
            Some(ClockAction::ClockOut)
        } else {
            None
        }
    }
}

impl fmt::Display for ClockAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockAction::ClockIn => f.write_str("clock in"),
            ClockAction::ClockOut => f.write_str("clock out"),
        }
    }
}

/// Persisted clock state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockState {
    pub is_clocked_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Queued operation confirming the latest transition, if undelivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_operation_id: Option<OpId>,
    /// Start time to restore if a pending clock-out is reverted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_start_time: Option<DateTime<Utc>>,
    /// Persistent error banner for a transition the server never accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
}

impl ClockState {
    /// Returns the state after applying `action` at `now`.
    ///
    /// The pending operation id is left for the caller to link once the
    /// remote call has been queued.
    pub fn transition(&self, action: ClockAction, now: DateTime<Utc>) -> Result<ClockState> {
        match (action, self.is_clocked_in) {
            (ClockAction::ClockIn, false) => Ok(ClockState {
                is_clocked_in: true,
                start_time: Some(now),
                pending_operation_id: None,
                prior_start_time: None,
                sync_error: None,
            }),
            (ClockAction::ClockOut, true) => Ok(ClockState {
                is_clocked_in: false,
                start_time: None,
                pending_operation_id: None,
                prior_start_time: self.start_time,
                sync_error: None,
            }),
            (ClockAction::ClockIn, true) => Err(Error::InvalidTransition {
                action: action.to_string(),
                state: "clocked in".to_string(),
                hint: "clock out first",
            }),
            (ClockAction::ClockOut, false) => Err(Error::InvalidTransition {
                action: action.to_string(),
                state: "clocked out".to_string(),
                hint: "clock in first",
            }),
        }
    }

    /// Undoes the transition recorded by a dropped operation.
    pub fn revert(&self, action: ClockAction) -> ClockState {
        match action {
            ClockAction::ClockIn => ClockState::default(),
            ClockAction::ClockOut => ClockState {
                is_clocked_in: true,
                start_time: self.prior_start_time,
                ..ClockState::default()
            },
        }
    }

    /// Time elapsed since clocking in, if clocked in.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        match (self.is_clocked_in, self.start_time) {
            (true, Some(start)) => Some(now - start),
            _ => None,
        }
    }

    /// Whether the latest transition is still awaiting delivery.
    pub fn is_pending(&self) -> bool {
        self.pending_operation_id.is_some()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
