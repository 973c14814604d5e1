// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod channel;
pub mod clock;
pub mod request;
pub mod run;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::GlobalArgs;
use crate::config::{default_config_path, Config};
use crate::error::Result;
use crate::sync::{
    ConnectivityMonitor, FileStore, HttpExecutor, ReachabilityProbe, StateLock, SyncService,
    TcpProbe,
};

/// The sync service as the CLI runs it: on disk, over HTTP.
pub type Service = SyncService<FileStore, HttpExecutor>;

/// Loads the config file named by `--config` (or the default), then applies
/// credential overrides from the environment.
pub fn load_config(global: &GlobalArgs) -> Result<Config> {
    let path = match &global.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = if global.config.is_some() {
        Config::load(&path)?
    } else {
        Config::load_or_default(&path)?
    };
    config.apply_env();
    Ok(config)
}

/// Local state opened for one command.
///
/// Holds the state directory lock for as long as it lives.
pub struct App {
    pub config: Config,
    pub service: Service,
    pub state_dir: PathBuf,
    _lock: StateLock,
}

impl App {
    /// Opens local state, probing the API once to seed connectivity.
    pub async fn open(global: &GlobalArgs) -> Result<Self> {
        let config = load_config(global)?;
        let online = !global.offline && probe_once(&config).await;
        Self::open_with(global, config, online)
    }

    /// Opens local state without touching the network.
    pub fn open_local(global: &GlobalArgs) -> Result<Self> {
        let config = load_config(global)?;
        Self::open_with(global, config, false)
    }

    fn open_with(global: &GlobalArgs, config: Config, online: bool) -> Result<Self> {
        let state_dir = config.resolve_state_dir(global.state_dir.as_deref())?;
        let store = FileStore::open(&state_dir)?;
        let lock = store.lock()?;

        let executor = Arc::new(HttpExecutor::new(
            config.api.base_url.clone(),
            config.credentials(),
            config.request_timeout(),
        )?);
        let connectivity = Arc::new(ConnectivityMonitor::new(online));
        let service = SyncService::open(store, executor, connectivity, config.sync_options())?;

        tracing::debug!(
            state_dir = %state_dir.display(),
            online,
            pending = service.pending_count(),
            "opened local state"
        );

        Ok(App {
            config,
            service,
            state_dir,
            _lock: lock,
        })
    }

    pub fn is_online(&self) -> bool {
        self.service.connectivity().is_online()
    }
}

/// One reachability check against the API host.
pub async fn probe_once(config: &Config) -> bool {
    match TcpProbe::for_url(&config.api.base_url, config.probe_timeout()) {
        Some(probe) => probe.check().await,
        None => false,
    }
}

/// Prints `value` as pretty JSON.
pub fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Formats a duration as `1h 05m`, or `42s` under a minute.
pub fn format_elapsed(elapsed: chrono::Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    let (hours, minutes) = (secs / 3600, (secs % 3600) / 60);
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", secs)
    }
}

/// `1 operation` / `3 operations`.
pub fn count_ops(n: usize) -> String {
    if n == 1 {
        "1 operation".to_string()
    } else {
        format!("{} operations", n)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
