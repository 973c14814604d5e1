// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Set of currently connected users as reported by the event channel.

use std::collections::BTreeSet;

use crate::protocol::{PresenceAction, UserId};

/// Active users, mutated only by snapshots and join/leave deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSet {
    users: BTreeSet<UserId>,
}

impl PresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole set with a server snapshot.
    pub fn resync(&mut self, users: impl IntoIterator<Item = UserId>) {
        self.users = users.into_iter().collect();
    }

    /// Applies one delta. Returns true if the set changed.
    pub fn apply(&mut self, action: PresenceAction, user: UserId) -> bool {
        match action {
            PresenceAction::Joined => self.users.insert(user),
            PresenceAction::Left => self.users.remove(&user),
        }
    }

    /// Drops everyone, used when the channel reconnects.
    pub fn clear(&mut self) {
        self.users.clear();
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.users.contains(user)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Sorted snapshot of the members.
    pub fn members(&self) -> Vec<UserId> {
        self.users.iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "presence_tests.rs"]
mod tests;
