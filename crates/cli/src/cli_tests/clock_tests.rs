// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

// Helper to parse CLI args
fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn test_clock_in_defaults() {
    let cli = parse(&["cw", "clock-in"]).unwrap();
    match cli.command {
        Command::ClockIn { location, output } => {
            assert_eq!(location.location, "Desktop");
            assert_eq!(output.output, OutputFormat::Text);
        }
        _ => panic!("Expected ClockIn command"),
    }
}

#[test]
fn test_clock_in_with_location() {
    let cli = parse(&["cw", "clock-in", "-l", "Office", "-o", "json"]).unwrap();
    match cli.command {
        Command::ClockIn { location, output } => {
            assert_eq!(location.location, "Office");
            assert_eq!(output.output, OutputFormat::Json);
        }
        _ => panic!("Expected ClockIn command"),
    }
}

#[test]
fn test_clock_out_long_location() {
    let cli = parse(&["cw", "clock-out", "--location", "Home"]).unwrap();
    match cli.command {
        Command::ClockOut { location, .. } => assert_eq!(location.location, "Home"),
        _ => panic!("Expected ClockOut command"),
    }
}

#[test]
fn test_status_json() {
    let cli = parse(&["cw", "status", "--output", "json"]).unwrap();
    match cli.command {
        Command::Status { output } => assert_eq!(output.output, OutputFormat::Json),
        _ => panic!("Expected Status command"),
    }
}

#[test]
fn test_status_rejects_unknown_format() {
    assert!(parse(&["cw", "status", "-o", "yaml"]).is_err());
}

#[test]
fn test_dismiss() {
    let cli = parse(&["cw", "dismiss"]).unwrap();
    assert!(matches!(cli.command, Command::Dismiss));
}
