// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cw-core: Shared library for the clockwork time-tracking client
//!
//! This crate provides the data model and wire protocol used by the
//! offline sync engine: queued operations, optimistic clock state, cached
//! reads, presence tracking, and the event channel messages. It performs
//! no I/O.

pub mod cache;
pub mod clock;
pub mod error;
pub mod jsonl;
pub mod notification;
pub mod op;
pub mod presence;
pub mod protocol;
pub mod time;

pub use cache::{default_max_age, CacheEntry, DEFAULT_MAX_AGE_MS};
pub use clock::{ClockAction, ClockState, DEFAULT_LOCATION};
pub use error::{Error, Result};
pub use notification::{NotificationLog, NOTIFICATION_CAPACITY};
pub use op::{Method, NewOperation, OpId, QueuedOperation};
pub use presence::PresenceSet;
pub use protocol::{
    ClientMessage, NotificationEvent, NotificationKind, PresenceAction, ServerMessage, SessionInfo,
    UserId,
};
pub use time::{ManualTime, SystemTime, TimeSource};
