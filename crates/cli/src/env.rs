// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Returns the value of `CW_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    non_empty(vars::CW_CONFIG).map(PathBuf::from)
}

/// Returns the value of `CW_STATE_DIR` if set.
pub fn state_dir() -> Option<PathBuf> {
    non_empty(vars::CW_STATE_DIR).map(PathBuf::from)
}

/// Returns the value of `CW_ACCESS_TOKEN` if set and non-empty.
pub fn access_token() -> Option<String> {
    non_empty(vars::CW_ACCESS_TOKEN)
}

/// Returns the value of `CW_REFRESH_TOKEN` if set and non-empty.
pub fn refresh_token() -> Option<String> {
    non_empty(vars::CW_REFRESH_TOKEN)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
