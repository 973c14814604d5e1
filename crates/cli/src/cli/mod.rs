// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use cw_core::Method;

pub use args::{LocationArgs, OutputArgs, OutputFormat};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Parse an HTTP method name, case-insensitively.
fn parse_method(s: &str) -> Result<Method, String> {
    s.parse::<Method>().map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(name = "cw")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first time tracking client")]
#[command(
    long_about = "Offline-first time tracking client.\n\n\
    Clock changes apply locally at once and are queued durably until the API confirms them."
)]
pub struct Cli {
    /// Config file (default: <config dir>/clockwork/config.toml)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Directory holding the queue, clock state and cache
    #[arg(long, global = true, value_name = "path")]
    pub state_dir: Option<PathBuf>,

    /// Treat the API as unreachable and skip the reachability check
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command that touches local state.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
    pub offline: bool,
}

impl Cli {
    /// Splits the global options from the command.
    pub fn into_parts(self) -> (GlobalArgs, Command) {
        (
            GlobalArgs {
                config: self.config,
                state_dir: self.state_dir,
                offline: self.offline,
            },
            self.command,
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    // ─────────────────────────────────────────────────────────────────────────
    // Clock
    // ─────────────────────────────────────────────────────────────────────────
    /// Clock in (applies locally at once, confirmed in the background)
    #[command(after_help = "\
Examples:
  cw clock-in                  Clock in from the default location
  cw clock-in -l Office        Clock in from the office")]
    ClockIn {
        #[command(flatten)]
        location: LocationArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Clock out (applies locally at once, confirmed in the background)
    ClockOut {
        #[command(flatten)]
        location: LocationArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show clock state, pending operations and sync errors
    Status {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Clear a sync error left by a dropped clock change
    Dismiss,

    // ─────────────────────────────────────────────────────────────────────────
    // Sync
    // ─────────────────────────────────────────────────────────────────────────
    /// List operations waiting to be delivered
    Queue {
        /// Discard every queued operation instead of listing them
        #[arg(long)]
        clear: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Deliver queued operations now
    Sync {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Send a request, queueing it if the API is unreachable
    #[command(after_help = "\
Examples:
  cw request POST /time/activity --body '{\"idle\": false}'
  cw request delete /time/entries/42")]
    Request {
        /// HTTP method (GET, POST, PUT, DELETE)
        #[arg(value_parser = parse_method)]
        method: Method,

        /// Endpoint path relative to the API base URL
        #[arg(value_parser = non_empty_string)]
        endpoint: String,

        /// JSON request body
        #[arg(long, short)]
        body: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Read an endpoint through the local cache
    Get {
        /// Endpoint path relative to the API base URL
        #[arg(value_parser = non_empty_string)]
        endpoint: String,

        /// Accept cached data up to this many seconds old (default: from config)
        #[arg(long, value_name = "secs")]
        max_age: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Event channel
    // ─────────────────────────────────────────────────────────────────────────
    /// Print presence changes and notifications until interrupted
    Listen {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Send a message to every user of the tenant
    Broadcast {
        #[arg(value_parser = non_empty_string)]
        message: String,

        /// Seconds to wait for the event channel to connect
        #[arg(long, default_value_t = 10, value_name = "secs")]
        timeout: u64,
    },

    /// Run the sync worker, reachability probe and event channel until interrupted
    Run,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
