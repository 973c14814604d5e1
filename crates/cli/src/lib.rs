// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cwrs - Offline-first client for the clockwork time-tracking API.
//!
//! This crate provides the engine behind the `cw` CLI: state-changing
//! calls are applied locally, persisted in a durable queue, and replayed in
//! order once the API is reachable again.
//!
//! # Main Components
//!
//! - [`sync::SyncService`] - Durable queue, sync engine, optimistic clock state and read cache
//! - [`channel::EventChannel`] - Reconnecting push channel for presence and notifications
//! - [`Config`] - Client configuration (API endpoint, retry policy, intervals)
//! - [`Error`] - Error types for all operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cwrs::sync::{ConnectivityMonitor, FileStore, HttpExecutor, SyncOptions, SyncService};
//!
//! let store = FileStore::open(&state_dir)?;
//! let _lock = store.lock()?;
//! let executor = Arc::new(HttpExecutor::new(base_url, credentials, timeout)?);
//! let online = Arc::new(ConnectivityMonitor::new(false));
//! let service = SyncService::open(store, executor, online, SyncOptions::default())?;
//!
//! service.coordinator().clock_in("Desktop")?;
//! service.sync_now().await?;
//! ```

mod cli;
mod commands;

pub mod channel;
pub mod config;
pub mod env;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, GlobalArgs, LocationArgs, OutputArgs, OutputFormat};
pub use config::Config;
pub use error::{Error, Result};

use std::time::Duration;

use clap::CommandFactory;
use clap_complete::generate;

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let (global, command) = cli.into_parts();

    if let Command::Completion { shell } = command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "cw", &mut std::io::stdout());
        return Ok(());
    }

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))?;
    rt.block_on(run_async(&global, command))
}

async fn run_async(global: &GlobalArgs, command: Command) -> Result<()> {
    match command {
        Command::ClockIn { location, output } => {
            commands::clock::clock_in(global, &location.location, output.output).await
        }
        Command::ClockOut { location, output } => {
            commands::clock::clock_out(global, &location.location, output.output).await
        }
        Command::Status { output } => commands::clock::status(global, output.output),
        Command::Dismiss => commands::clock::dismiss(global),
        Command::Queue { clear, output } => commands::sync::queue(global, clear, output.output),
        Command::Sync { output } => commands::sync::sync(global, output.output).await,
        Command::Request {
            method,
            endpoint,
            body,
            output,
        } => {
            commands::request::request(global, method, &endpoint, body.as_deref(), output.output)
                .await
        }
        Command::Get {
            endpoint,
            max_age,
            output,
        } => commands::request::get(global, &endpoint, max_age, output.output).await,
        Command::Listen { output } => commands::channel::listen(global, output.output).await,
        Command::Broadcast { message, timeout } => {
            commands::channel::broadcast(global, &message, Duration::from_secs(timeout)).await
        }
        Command::Run => commands::run::run(global).await,
        // Handled before the runtime starts.
        Command::Completion { .. } => Ok(()),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
