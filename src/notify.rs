//! Bounded notification feed for lifecycle events.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::fields::NotificationKind;

/// Maximum entries kept in the feed.
pub const FEED_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
}

/// Most-recent-first log of at most [`FEED_CAPACITY`] entries.
#[derive(Debug, Default)]
pub struct NotificationFeed {
    entries: VecDeque<Notification>,
    last_id: u64,
}

impl NotificationFeed {
    pub fn new() -> Self {
        NotificationFeed::default()
    }

    /// Prepend an entry, evicting the oldest beyond capacity.
    pub fn push(&mut self, message: impl Into<String>, kind: NotificationKind, now: DateTime<Utc>) -> u64 {
        self.last_id += 1;
        self.entries.push_front(Notification {
            id: self.last_id,
            message: message.into(),
            kind,
            timestamp: now,
        });
        self.entries.truncate(FEED_CAPACITY);
        self.last_id
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    /// Badge count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
