// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use chrono::{TimeZone, Utc};
use cw_core::{NotificationEvent, NotificationKind, SessionInfo, UserId};

fn notification(kind: NotificationKind, action: Option<&str>, payload: serde_json::Value) -> NotificationEvent {
    NotificationEvent {
        kind,
        action: action.map(str::to_string),
        payload,
        timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 9, 15, 30).unwrap(),
    }
}

#[test]
fn test_event_line_presence() {
    let event = ChannelEvent::PresenceChanged(vec![UserId::from("3"), UserId::from("7")]);
    assert_eq!(event_line(&event), "online (2): 3, 7");
}

#[test]
fn test_event_line_notification() {
    let event = ChannelEvent::Notification(notification(
        NotificationKind::TimeEntry,
        Some("clock_in"),
        json!({"user_id": 7}),
    ));
    assert_eq!(event_line(&event), "[09:15:30] time_entry clock_in");
}

#[test]
fn test_event_line_broadcast_message() {
    let event = ChannelEvent::Notification(notification(
        NotificationKind::Message,
        None,
        json!({"message": "standup in 5"}),
    ));
    assert_eq!(event_line(&event), "[09:15:30] message: standup in 5");
}

#[test]
fn test_event_line_session() {
    let info = SessionInfo {
        user_id: Some(UserId::from("7")),
        ..SessionInfo::default()
    };
    assert_eq!(
        event_line(&ChannelEvent::Session(info)),
        "session established for user 7"
    );
    assert_eq!(
        event_line(&ChannelEvent::Session(SessionInfo::default())),
        "session established"
    );
}

#[test]
fn test_event_json() {
    let value = event_json(&ChannelEvent::PresenceChanged(vec![UserId::from("3")]));
    assert_eq!(value, json!({"event": "presence", "online_users": ["3"]}));

    let value = event_json(&ChannelEvent::Notification(notification(
        NotificationKind::Payroll,
        Some("completed"),
        json!({"period": "2026-02"}),
    )));
    assert_eq!(value["event"], "notification");
    assert_eq!(value["notification"]["kind"], "payroll");
    assert_eq!(value["notification"]["action"], "completed");

    assert_eq!(event_json(&ChannelEvent::Connected), json!({"event": "connected"}));
}
