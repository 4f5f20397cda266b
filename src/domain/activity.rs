// Activity log domain models
use super::alert::Severity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub action: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub details: Option<String>,
}

impl ActivityLogEntry {
    pub fn new(action: String, actor: String, severity: Severity, details: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            actor,
            timestamp: Utc::now(),
            severity,
            details,
        }
    }
}

/// Bounded, most-recent-first list of activity entries.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<ActivityLogEntry>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepends `entry`, dropping the oldest entries beyond the capacity.
    pub fn push(&mut self, entry: ActivityLogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, newest first.
    pub fn entries(&self) -> Vec<ActivityLogEntry> {
        self.entries.iter().cloned().collect()
    }
}
