// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use clap::CommandFactory;
use std::collections::BTreeSet;

/// Every short flag in the tree as `(command path, short, long)`.
fn short_flags(cmd: &clap::Command, path: &str, out: &mut BTreeSet<(String, char, String)>) {
    for arg in cmd.get_arguments() {
        let Some(short) = arg.get_short() else {
            continue;
        };
        let long = arg.get_long().unwrap_or_default();
        if matches!((short, long), ('h', "help") | ('V', "version")) {
            continue;
        }
        out.insert((path.to_string(), short, long.to_string()));
    }
    for sub in cmd.get_subcommands() {
        short_flags(sub, &format!("{} {}", path, sub.get_name()), out);
    }
}

#[test]
fn test_short_flags_are_the_documented_set() {
    let mut found = BTreeSet::new();
    short_flags(&Cli::command(), "cw", &mut found);

    let expected: BTreeSet<(String, char, String)> = [
        ("cw clock-in", 'l', "location"),
        ("cw clock-in", 'o', "output"),
        ("cw clock-out", 'l', "location"),
        ("cw clock-out", 'o', "output"),
        ("cw status", 'o', "output"),
        ("cw queue", 'o', "output"),
        ("cw sync", 'o', "output"),
        ("cw request", 'b', "body"),
        ("cw request", 'o', "output"),
        ("cw get", 'o', "output"),
        ("cw listen", 'o', "output"),
    ]
    .into_iter()
    .map(|(path, short, long)| (path.to_string(), short, long.to_string()))
    .collect();

    assert_eq!(found, expected);
}

#[test]
fn test_global_flags_have_no_short_form() {
    let cmd = Cli::command();
    for name in ["config", "state-dir", "offline"] {
        let arg = cmd
            .get_arguments()
            .find(|a| a.get_long() == Some(name))
            .unwrap();
        assert!(arg.is_global_set(), "--{} should be global", name);
        assert!(arg.get_short().is_none(), "--{} should have no short form", name);
    }
}
