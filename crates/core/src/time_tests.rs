// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::TimeZone;

#[test]
fn manual_time_advances() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = ManualTime::new(start);
    assert_eq!(clock.now(), start);

    clock.advance(Duration::minutes(5));
    assert_eq!(clock.now(), start + Duration::minutes(5));

    clock.set(start);
    assert_eq!(clock.now(), start);
}

#[test]
fn system_time_is_close_to_now() {
    let before = Utc::now();
    let now = SystemTime.now();
    assert!(now >= before);
}

#[test]
fn time_source_through_reference() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = ManualTime::new(start);
    let by_ref: &ManualTime = &clock;
    assert_eq!(TimeSource::now(&by_ref), start);
}
