// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is stored in `<config dir>/clockwork/config.toml` with four
//! optional sections:
//! - `[api]`: base URL, timeouts and credentials of the remote API
//! - `[sync]`: retry cap, drop policy and sync intervals
//! - `[channel]`: event channel endpoint, reconnect delay and heartbeat
//! - `[cache]`: default freshness window of cached reads
//!
//! Every field has a default, so an absent or empty file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::channel::ChannelConfig;
use crate::env;
use crate::error::{Error, Result};
use crate::sync::{Credentials, DropPolicy, RetryPolicy, SyncOptions, DEFAULT_MAX_RETRIES};

const APP_DIR_NAME: &str = "clockwork";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Client configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the queue, clock state and cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub channel: ChannelSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL every endpoint is appended to (default: `http://localhost:8000/api`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Reachability probe timeout in milliseconds (default: 2000).
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Bearer token. Overridden by `CW_ACCESS_TOKEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Token exchanged for a new access token after a 401. Overridden by
    /// `CW_REFRESH_TOKEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Sync engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Failed attempts before a queued operation is dropped (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// What a dropped clock change does to local state (default: `surface`).
    #[serde(default)]
    pub drop_policy: DropPolicy,
    /// Seconds between foreground sync passes (default: 60). 0 = disabled.
    #[serde(default = "default_periodic_sync_secs")]
    pub periodic_sync_secs: u64,
    /// Seconds between reachability probes (default: 10).
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
}

/// Event channel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// `ws://` or `wss://` endpoint. Derived from the API base URL when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Delay before each reconnect in milliseconds (default: 3000).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Heartbeat interval in milliseconds (default: 30000).
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

/// Read cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Default freshness window in seconds (default: 3600).
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_periodic_sync_secs() -> u64 {
    60
}

fn default_probe_interval_secs() -> u64 {
    10
}

fn default_reconnect_delay_ms() -> u64 {
    3_000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_max_age_secs() -> u64 {
    3_600
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            probe_timeout_ms: default_probe_timeout_ms(),
            access_token: None,
            refresh_token: None,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            max_retries: default_max_retries(),
            drop_policy: DropPolicy::default(),
            periodic_sync_secs: default_periodic_sync_secs(),
            probe_interval_secs: default_probe_interval_secs(),
        }
    }
}

impl Default for ChannelSettings {
    fn default() -> Self {
        ChannelSettings {
            url: None,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            max_age_secs: default_max_age_secs(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Config::default())
        }
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Replaces configured credentials with any that are set.
    pub fn override_credentials(&mut self, access: Option<String>, refresh: Option<String>) {
        if access.is_some() {
            self.api.access_token = access;
        }
        if refresh.is_some() {
            self.api.refresh_token = refresh;
        }
    }

    /// Applies `CW_ACCESS_TOKEN` and `CW_REFRESH_TOKEN`.
    pub fn apply_env(&mut self) {
        self.override_credentials(env::access_token(), env::refresh_token());
    }

    fn validate(&self) -> Result<()> {
        match url::Url::parse(&self.api.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(Error::Config(format!(
                    "invalid api.base_url '{}': must be an http:// or https:// URL",
                    self.api.base_url
                )))
            }
        }
        if self.api.request_timeout_secs == 0 {
            return Err(Error::Config(
                "api.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.sync.probe_interval_secs == 0 {
            return Err(Error::Config(
                "sync.probe_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.channel.heartbeat_interval_ms == 0 {
            return Err(Error::Config(
                "channel.heartbeat_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.api.access_token.clone(),
            refresh_token: self.api.refresh_token.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.api.probe_timeout_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.sync.probe_interval_secs)
    }

    pub fn cache_max_age(&self) -> chrono::TimeDelta {
        max_age_from_secs(self.cache.max_age_secs)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            retry: RetryPolicy::new(self.sync.max_retries),
            drop_policy: self.sync.drop_policy,
            periodic_sync: match self.sync.periodic_sync_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    /// Event channel endpoint: the configured URL, or `<base_url>/ws` with
    /// the scheme switched to `ws`/`wss`.
    pub fn channel_url(&self) -> Result<String> {
        if let Some(url) = &self.channel.url {
            return Ok(url.clone());
        }
        let mut url = url::Url::parse(&self.api.base_url)
            .map_err(|e| Error::Config(format!("invalid api.base_url: {}", e)))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| Error::Config(format!("cannot derive channel url from {}", url)))?;
        let path = format!("{}/ws", url.path().trim_end_matches('/'));
        url.set_path(&path);
        Ok(url.into())
    }

    pub fn channel_config(&self) -> Result<ChannelConfig> {
        let mut config = ChannelConfig::new(self.channel_url()?);
        config.reconnect_delay = Duration::from_millis(self.channel.reconnect_delay_ms);
        config.heartbeat_interval = Duration::from_millis(self.channel.heartbeat_interval_ms);
        Ok(config)
    }

    /// Resolves the state directory: `cli_override`, then `CW_STATE_DIR`,
    /// then the config file, then the platform data directory.
    pub fn resolve_state_dir(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = cli_override {
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = env::state_dir() {
            return Ok(dir);
        }
        if let Some(dir) = &self.state_dir {
            return Ok(dir.clone());
        }
        default_state_dir()
    }
}

/// Default config file: `CW_CONFIG`, else `<config dir>/clockwork/config.toml`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(path) = env::config_path() {
        return Ok(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| Error::Config("cannot determine the config directory".to_string()))
}

/// Default state directory: `<local data dir>/clockwork`.
pub fn default_state_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| Error::Config("cannot determine the data directory".to_string()))
}

/// Converts a max age in seconds, saturating at the largest representable
/// span.
pub fn max_age_from_secs(secs: u64) -> chrono::TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::TimeDelta::try_seconds)
        .unwrap_or(chrono::TimeDelta::MAX)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
