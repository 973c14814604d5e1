// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for the remote event channel.
//!
//! Every message is a JSON object with a `type` tag:
//! - Server pushes session info, presence snapshots and deltas, heartbeat
//!   replies, and domain notifications (time entries, payroll, employees,
//!   tenant broadcasts)
//! - Client sends heartbeats and tenant broadcasts
//!
//! Decoding never fails on an unrecognized `type`; such messages come back
//! as [`ServerMessage::Unknown`] so the channel can log and skip them.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identifier of a user (or tenant) as sent by the server.
///
/// The server may send ids as JSON numbers or strings; both normalize to
/// the same string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => UserId(s),
            Raw::Number(n) => UserId(n.to_string()),
        })
    }
}

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat keeping intermediaries from closing an idle connection.
    Ping,

    /// Message relayed to every user of the tenant.
    Broadcast { message: String },
}

impl ClientMessage {
    /// Creates a Ping message.
    pub fn ping() -> Self {
        ClientMessage::Ping
    }

    /// Creates a Broadcast message.
    pub fn broadcast(message: impl Into<String>) -> Self {
        ClientMessage::Broadcast {
            message: message.into(),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Session details sent when the channel is established.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<UserId>,
}

/// Direction of an incremental presence change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceAction {
    Joined,
    Left,
}

/// Domain tag of a server-originated business event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TimeEntry,
    Payroll,
    Employee,
    /// Tenant broadcast relayed from another user.
    Message,
}

impl NotificationKind {
    /// Wire tag for this kind.
    pub fn as_tag(&self) -> &'static str {
        match self {
            NotificationKind::TimeEntry => "time_entry",
            NotificationKind::Payroll => "payroll",
            NotificationKind::Employee => "employee",
            NotificationKind::Message => "message",
        }
    }

    /// Parses a wire tag, returning `None` for anything that is not a
    /// known domain event.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "time_entry" => Some(NotificationKind::TimeEntry),
            "payroll" => Some(NotificationKind::Payroll),
            "employee" => Some(NotificationKind::Employee),
            "message" => Some(NotificationKind::Message),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// A domain notification kept for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    /// Sub-type such as `clock_in`, `completed` or `updated`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Remaining fields of the wire message.
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    /// Builds an event from a wire object.
    ///
    /// The `type`, `action` and `timestamp` fields are lifted out of the
    /// object; whatever remains becomes the payload. Timestamps without a
    /// zone are read as UTC, and a missing or unparseable timestamp falls
    /// back to `received_at`.
    pub fn from_wire(
        kind: NotificationKind,
        mut fields: Map<String, Value>,
        received_at: DateTime<Utc>,
    ) -> Self {
        fields.remove("type");
        let action = match fields.remove("action") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };
        let timestamp = fields
            .remove("timestamp")
            .as_ref()
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or(received_at);

        NotificationEvent {
            kind,
            action,
            payload: Value::Object(fields),
            timestamp,
        }
    }

    fn to_wire(&self) -> Value {
        let mut fields = match &self.payload {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other.clone());
                map
            }
        };
        fields.insert("type".to_string(), Value::from(self.kind.as_tag()));
        if let Some(action) = &self.action {
            fields.insert("action".to_string(), Value::from(action.as_str()));
        }
        fields.insert(
            "timestamp".to_string(),
            Value::from(self.timestamp.to_rfc3339()),
        );
        Value::Object(fields)
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Channel established.
    Connection(SessionInfo),

    /// Full presence snapshot.
    Presence { online_users: Vec<UserId> },

    /// Incremental presence change.
    UserPresence {
        action: PresenceAction,
        user_id: UserId,
    },

    /// Heartbeat reply.
    Pong,

    /// Server-originated business event.
    Notification(NotificationEvent),

    /// A message whose `type` this client does not understand.
    Unknown { kind: String },
}

#[derive(Deserialize)]
struct PresenceFields {
    #[serde(default)]
    online_users: Vec<UserId>,
}

#[derive(Deserialize)]
struct UserPresenceFields {
    action: PresenceAction,
    user_id: UserId,
}

impl ServerMessage {
    /// Creates a Presence snapshot message.
    pub fn presence(online_users: Vec<UserId>) -> Self {
        ServerMessage::Presence { online_users }
    }

    /// Creates a UserPresence message.
    pub fn user_presence(action: PresenceAction, user_id: impl Into<UserId>) -> Self {
        ServerMessage::UserPresence {
            action,
            user_id: user_id.into(),
        }
    }

    /// Returns the wire `type` tag.
    pub fn kind(&self) -> &str {
        match self {
            ServerMessage::Connection(_) => "connection",
            ServerMessage::Presence { .. } => "presence",
            ServerMessage::UserPresence { .. } => "user_presence",
            ServerMessage::Pong => "pong",
            ServerMessage::Notification(event) => event.kind.as_tag(),
            ServerMessage::Unknown { kind } => kind,
        }
    }

    /// Decodes a wire object, stamping notifications without their own
    /// timestamp with `received_at`.
    pub fn from_value(value: Value, received_at: DateTime<Utc>) -> Result<Self, serde_json::Error> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let msg = match kind.as_str() {
            "connection" => ServerMessage::Connection(serde_json::from_value(value)?),
            "presence" => {
                let fields: PresenceFields = serde_json::from_value(value)?;
                ServerMessage::Presence {
                    online_users: fields.online_users,
                }
            }
            "user_presence" => {
                let fields: UserPresenceFields = serde_json::from_value(value)?;
                ServerMessage::UserPresence {
                    action: fields.action,
                    user_id: fields.user_id,
                }
            }
            "pong" => ServerMessage::Pong,
            tag => match (NotificationKind::from_tag(tag), value) {
                (Some(kind), Value::Object(fields)) => ServerMessage::Notification(
                    NotificationEvent::from_wire(kind, fields, received_at),
                ),
                _ => ServerMessage::Unknown {
                    kind: tag.to_string(),
                },
            },
        };

        Ok(msg)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_value(value, Utc::now())
    }

    /// Encodes the message as a wire object.
    pub fn to_value(&self) -> Value {
        match self {
            ServerMessage::Connection(info) => {
                let mut value = serde_json::to_value(info).unwrap_or(Value::Null);
                if let Value::Object(map) = &mut value {
                    map.insert("type".to_string(), Value::from("connection"));
                }
                value
            }
            ServerMessage::Presence { online_users } => serde_json::json!({
                "type": "presence",
                "online_users": online_users,
            }),
            ServerMessage::UserPresence { action, user_id } => serde_json::json!({
                "type": "user_presence",
                "action": action,
                "user_id": user_id,
            }),
            ServerMessage::Pong => serde_json::json!({ "type": "pong" }),
            ServerMessage::Notification(event) => event.to_wire(),
            ServerMessage::Unknown { kind } => serde_json::json!({ "type": kind }),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_value())
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
