// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::path::PathBuf;

#[test]
fn test_vars_constants() {
    assert_eq!(vars::CW_CONFIG, "CW_CONFIG");
    assert_eq!(vars::CW_STATE_DIR, "CW_STATE_DIR");
    assert_eq!(vars::CW_ACCESS_TOKEN, "CW_ACCESS_TOKEN");
    assert_eq!(vars::CW_REFRESH_TOKEN, "CW_REFRESH_TOKEN");
}

#[test]
fn test_config_path_set() {
    std::env::set_var("CW_CONFIG", "/tmp/cw/config.toml");
    assert_eq!(config_path(), Some(PathBuf::from("/tmp/cw/config.toml")));
    std::env::remove_var("CW_CONFIG");
    assert_eq!(config_path(), None);
}

#[test]
fn test_state_dir_set() {
    std::env::set_var("CW_STATE_DIR", "/tmp/cw-state");
    assert_eq!(state_dir(), Some(PathBuf::from("/tmp/cw-state")));
    std::env::remove_var("CW_STATE_DIR");
    assert_eq!(state_dir(), None);
}

#[test]
fn test_tokens_ignore_empty_values() {
    std::env::set_var("CW_REFRESH_TOKEN", "");
    assert_eq!(refresh_token(), None);
    std::env::set_var("CW_REFRESH_TOKEN", "r-1");
    assert_eq!(refresh_token().as_deref(), Some("r-1"));
    std::env::remove_var("CW_REFRESH_TOKEN");
}

#[test]
fn test_access_token_unset() {
    std::env::remove_var("CW_ACCESS_TOKEN");
    assert_eq!(access_token(), None);
}
