// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::TimeZone;
use yare::parameterized;

fn received_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

fn decode(json: &str) -> ServerMessage {
    let value: Value = serde_json::from_str(json).unwrap();
    ServerMessage::from_value(value, received_at()).unwrap()
}

#[parameterized(
    ping = { ClientMessage::ping() },
    broadcast = { ClientMessage::broadcast("standup in 5") },
)]
fn client_message_roundtrip(msg: ClientMessage) {
    let json = msg.to_json().unwrap();
    let parsed = ClientMessage::from_json(&json).unwrap();
    assert_eq!(msg, parsed);
}

#[test]
fn client_ping_wire_shape() {
    assert_eq!(ClientMessage::ping().to_json().unwrap(), r#"{"type":"ping"}"#);
}

#[test]
fn decodes_connection() {
    let msg = decode(r#"{"type":"connection","status":"connected","user_id":7,"tenant_id":2}"#);
    let ServerMessage::Connection(info) = msg else {
        unreachable!("expected connection, got {msg:?}");
    };
    assert_eq!(info.status.as_deref(), Some("connected"));
    assert_eq!(info.user_id, Some(UserId::new("7")));
    assert_eq!(info.tenant_id, Some(UserId::new("2")));
}

#[test]
fn decodes_presence_snapshot_with_mixed_ids() {
    let msg = decode(r#"{"type":"presence","online_users":[1,"u2"]}"#);
    assert_eq!(
        msg,
        ServerMessage::presence(vec![UserId::new("1"), UserId::new("u2")])
    );
}

#[test]
fn presence_without_users_is_empty() {
    let msg = decode(r#"{"type":"presence"}"#);
    assert_eq!(msg, ServerMessage::presence(vec![]));
}

#[parameterized(
    joined = { r#"{"type":"user_presence","action":"joined","user_id":"u1"}"#, PresenceAction::Joined },
    left = { r#"{"type":"user_presence","action":"left","user_id":"u1","timestamp":"2026-03-02T09:00:00"}"#, PresenceAction::Left },
)]
fn decodes_user_presence(json: &str, action: PresenceAction) {
    assert_eq!(decode(json), ServerMessage::user_presence(action, "u1"));
}

#[test]
fn user_presence_with_bad_action_is_an_error() {
    let value: Value =
        serde_json::from_str(r#"{"type":"user_presence","action":"waved","user_id":"u1"}"#)
            .unwrap();
    assert!(ServerMessage::from_value(value, received_at()).is_err());
}

#[test]
fn decodes_time_entry_notification() {
    let msg = decode(
        r#"{"type":"time_entry","action":"clock_in","employee_id":42,"data":{"id":9},"timestamp":"2026-03-02T09:15:00.250000"}"#,
    );
    let ServerMessage::Notification(event) = msg else {
        unreachable!("expected notification, got {msg:?}");
    };
    assert_eq!(event.kind, NotificationKind::TimeEntry);
    assert_eq!(event.action.as_deref(), Some("clock_in"));
    assert_eq!(event.payload["employee_id"], 42);
    assert_eq!(event.payload["data"]["id"], 9);
    assert!(event.payload.get("type").is_none());
    assert_eq!(
        event.timestamp,
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 15, 0).unwrap() + chrono::Duration::milliseconds(250)
    );
}

#[test]
fn notification_without_timestamp_uses_receive_time() {
    let msg = decode(r#"{"type":"message","from_user_id":3,"message":"hi"}"#);
    let ServerMessage::Notification(event) = msg else {
        unreachable!("expected notification, got {msg:?}");
    };
    assert_eq!(event.kind, NotificationKind::Message);
    assert_eq!(event.timestamp, received_at());
}

#[parameterized(
    unknown_tag = { r#"{"type":"weather","temp":20}"#, "weather" },
    missing_tag = { r#"{"hello":"world"}"#, "" },
)]
fn unknown_types_are_not_errors(json: &str, kind: &str) {
    assert_eq!(
        decode(json),
        ServerMessage::Unknown {
            kind: kind.to_string()
        }
    );
}

#[test]
fn pong_decodes() {
    assert_eq!(decode(r#"{"type":"pong"}"#), ServerMessage::Pong);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(ServerMessage::from_json("{not json").is_err());
}

#[parameterized(
    connection = { ServerMessage::Connection(SessionInfo { status: Some("connected".into()), user_id: Some(UserId::new("1")), tenant_id: None }) },
    presence = { ServerMessage::presence(vec![UserId::new("a"), UserId::new("b")]) },
    user_presence = { ServerMessage::user_presence(PresenceAction::Left, "a") },
    pong = { ServerMessage::Pong },
)]
fn server_message_wire_roundtrip(msg: ServerMessage) {
    let json = msg.to_json().unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(ServerMessage::from_value(value, received_at()).unwrap(), msg);
}

#[test]
fn notification_wire_roundtrip() {
    let event = NotificationEvent {
        kind: NotificationKind::Payroll,
        action: Some("completed".into()),
        payload: serde_json::json!({ "payroll_run_id": 12 }),
        timestamp: received_at(),
    };
    let msg = ServerMessage::Notification(event);
    let json = msg.to_json().unwrap();
    assert!(json.contains(r#""type":"payroll""#));
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(ServerMessage::from_value(value, received_at()).unwrap(), msg);
}

#[parameterized(
    time_entry = { "time_entry", Some(NotificationKind::TimeEntry) },
    payroll = { "payroll", Some(NotificationKind::Payroll) },
    employee = { "employee", Some(NotificationKind::Employee) },
    presence = { "presence", None },
)]
fn notification_kind_from_tag(tag: &str, expected: Option<NotificationKind>) {
    assert_eq!(NotificationKind::from_tag(tag), expected);
}
