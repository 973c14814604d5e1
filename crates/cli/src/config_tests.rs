// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use tempfile::TempDir;
use yare::parameterized;

fn parse(toml_text: &str) -> Result<Config> {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, toml_text).unwrap();
    Config::load(&path)
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.api.request_timeout_secs, 30);
    assert_eq!(config.sync.max_retries, 3);
    assert_eq!(config.sync.drop_policy, DropPolicy::Surface);
    assert_eq!(config.channel.reconnect_delay_ms, 3_000);
    assert_eq!(config.channel.heartbeat_interval_ms, 30_000);
    assert_eq!(config.cache.max_age_secs, 3_600);
    assert!(config.state_dir.is_none());
}

#[test]
fn test_empty_file_uses_defaults() {
    assert_eq!(parse("").unwrap(), Config::default());
}

#[test]
fn test_partial_sections() {
    let config = parse(
        r#"
[api]
base_url = "https://api.example.com/api"

[sync]
max_retries = 5
drop_policy = "revert"
"#,
    )
    .unwrap();

    assert_eq!(config.api.base_url, "https://api.example.com/api");
    assert_eq!(config.api.request_timeout_secs, 30);
    assert_eq!(config.sync.max_retries, 5);
    assert_eq!(config.sync.drop_policy, DropPolicy::Revert);
    assert_eq!(config.sync.periodic_sync_secs, 60);
}

#[test]
fn test_load_missing_file() {
    let temp = TempDir::new().unwrap();
    let result = Config::load(&temp.path().join("missing.toml"));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_load_or_default_missing_file() {
    let temp = TempDir::new().unwrap();
    let config = Config::load_or_default(&temp.path().join("missing.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_invalid_toml() {
    let result = parse("invalid toml {{{");
    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("failed to parse"));
    }
}

#[parameterized(
    bad_scheme = { "[api]\nbase_url = \"ftp://example.com\"" },
    not_a_url = { "[api]\nbase_url = \"example.com\"" },
    zero_timeout = { "[api]\nrequest_timeout_secs = 0" },
    zero_probe_interval = { "[sync]\nprobe_interval_secs = 0" },
    zero_heartbeat = { "[channel]\nheartbeat_interval_ms = 0" },
    unknown_policy = { "[sync]\ndrop_policy = \"ignore\"" },
)]
fn test_rejects_invalid_values(text: &str) {
    assert!(parse(text).is_err());
}

#[test]
fn test_save_and_reload() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.api.refresh_token = Some("r-1".to_string());
    config.sync.drop_policy = DropPolicy::Revert;
    config.channel.url = Some("wss://push.example.com/ws".to_string());
    config.state_dir = Some(temp.path().join("state"));
    config.save(&path).unwrap();

    assert_eq!(Config::load(&path).unwrap(), config);
}

#[test]
fn test_override_credentials() {
    let mut config = Config::default();
    config.api.access_token = Some("from-file".to_string());
    config.api.refresh_token = Some("refresh-file".to_string());

    config.override_credentials(Some("from-env".to_string()), None);

    let credentials = config.credentials();
    assert_eq!(credentials.access_token.as_deref(), Some("from-env"));
    assert_eq!(credentials.refresh_token.as_deref(), Some("refresh-file"));
}

#[parameterized(
    http = { "http://localhost:8000/api", "ws://localhost:8000/api/ws" },
    https = { "https://api.example.com/api", "wss://api.example.com/api/ws" },
    trailing_slash = { "https://api.example.com/api/", "wss://api.example.com/api/ws" },
    root = { "http://10.0.0.5:9000", "ws://10.0.0.5:9000/ws" },
)]
fn test_channel_url_derived(base: &str, expected: &str) {
    let mut config = Config::default();
    config.api.base_url = base.to_string();
    assert_eq!(config.channel_url().unwrap(), expected);
}

#[test]
fn test_channel_url_explicit() {
    let mut config = Config::default();
    config.channel.url = Some("wss://push.example.com/ws".to_string());
    assert_eq!(config.channel_url().unwrap(), "wss://push.example.com/ws");
}

#[test]
fn test_channel_config() {
    let mut config = Config::default();
    config.channel.reconnect_delay_ms = 500;
    let channel = config.channel_config().unwrap();
    assert_eq!(channel.url, "ws://localhost:8000/api/ws");
    assert_eq!(channel.reconnect_delay, Duration::from_millis(500));
    assert_eq!(channel.heartbeat_interval, Duration::from_secs(30));
}

#[test]
fn test_sync_options() {
    let mut config = Config::default();
    let options = config.sync_options();
    assert_eq!(options.retry.max_retries, 3);
    assert_eq!(options.periodic_sync, Some(Duration::from_secs(60)));

    config.sync.periodic_sync_secs = 0;
    assert_eq!(config.sync_options().periodic_sync, None);
}

#[test]
fn test_cache_max_age() {
    let config = Config::default();
    assert_eq!(config.cache_max_age(), cw_core::default_max_age());
}

#[parameterized(
    zero = { 0, chrono::TimeDelta::zero() },
    minute = { 60, chrono::TimeDelta::minutes(1) },
    beyond_range = { i64::MAX as u64, chrono::TimeDelta::MAX },
    largest = { u64::MAX, chrono::TimeDelta::MAX },
)]
fn test_max_age_from_secs_saturates(secs: u64, expected: chrono::TimeDelta) {
    assert_eq!(max_age_from_secs(secs), expected);
}

#[test]
fn test_huge_cache_max_age_does_not_overflow() {
    let config = parse("[cache]\nmax_age_secs = 18446744073709551615\n").unwrap();
    assert_eq!(config.cache_max_age(), chrono::TimeDelta::MAX);
}

#[test]
fn test_cli_state_dir_wins() {
    let mut config = Config::default();
    config.state_dir = Some(PathBuf::from("/from/config"));
    let dir = config
        .resolve_state_dir(Some(Path::new("/from/flag")))
        .unwrap();
    assert_eq!(dir, PathBuf::from("/from/flag"));
}
