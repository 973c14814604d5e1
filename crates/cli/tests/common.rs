// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// A config pointing at an API nobody listens on, plus a private state dir.
pub struct Workspace {
    pub temp: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.toml"),
            "[api]\nbase_url = \"http://127.0.0.1:9/api\"\nprobe_timeout_ms = 200\n",
        )
        .unwrap();
        Workspace { temp }
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.toml")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.temp.path().join("state")
    }

    /// `cw` with this workspace's config and state dir, and no ambient
    /// credentials.
    pub fn cw(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("cw");
        cmd.arg("--config")
            .arg(self.config_path())
            .arg("--state-dir")
            .arg(self.state_dir())
            .env_remove("CW_ACCESS_TOKEN")
            .env_remove("CW_REFRESH_TOKEN")
            .env_remove("CW_STATE_DIR")
            .env("RUST_LOG", "warn");
        cmd
    }
}

pub fn cw() -> Command {
    cargo_bin_cmd!("cw")
}
