// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded in-memory log of received notifications.

use std::collections::VecDeque;

use crate::protocol::NotificationEvent;

/// Number of notifications kept for display.
pub const NOTIFICATION_CAPACITY: usize = 50;

/// Ring buffer of the most recent notifications, newest first.
///
/// Never persisted; a restart starts from an empty log.
#[derive(Debug, Clone)]
pub struct NotificationLog {
    events: VecDeque<NotificationEvent>,
    capacity: usize,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::with_capacity(NOTIFICATION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        NotificationLog {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records an event, evicting the oldest beyond capacity.
    pub fn push(&mut self, event: NotificationEvent) {
        if self.capacity == 0 {
            return;
        }
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }

    /// Snapshot of the retained events, newest first.
    pub fn recent(&self) -> Vec<NotificationEvent> {
        self.events.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
