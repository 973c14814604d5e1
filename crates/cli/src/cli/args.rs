// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs for CLI commands.
//!
//! These structs are used with `#[command(flatten)]` to reduce duplication
//! across commands that share common options.

use clap::{Args, ValueEnum};
use cw_core::DEFAULT_LOCATION;

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output format argument.
#[derive(Args, Clone, Copy, Debug, Default)]
pub struct OutputArgs {
    /// Output format (text, json)
    #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Location reported with a clock change.
#[derive(Args, Clone, Debug)]
pub struct LocationArgs {
    /// Where the clock change happens
    #[arg(long, short = 'l', default_value = DEFAULT_LOCATION)]
    pub location: String,
}
