// Notification history domain models
use super::alert::Alert;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub alert: Alert,
    pub read: bool,
}

/// Bounded, most-recent-first history of shown alerts.
#[derive(Debug, Clone)]
pub struct Notifications {
    items: VecDeque<Notification>,
    capacity: usize,
}

impl Notifications {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, alert: Alert) {
        self.items.push_front(Notification { alert, read: false });
        self.items.truncate(self.capacity);
    }

    pub fn mark_all_read(&mut self) -> usize {
        let mut marked = 0;
        for item in self.items.iter_mut().filter(|n| !n.read) {
            item.read = true;
            marked += 1;
        }
        marked
    }

    pub fn unread(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    pub fn items(&self) -> Vec<Notification> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::Severity;

    fn alert(metric: &str) -> Alert {
        Alert::new("title".into(), "message".into(), Severity::Warning, metric.into(), 75.0)
    }

    #[test]
    fn test_record_and_mark_read() {
        let mut notifications = Notifications::new(5);
        notifications.record(alert("cpu"));
        notifications.record(alert("memory"));
        assert_eq!(notifications.unread(), 2);
        assert_eq!(notifications.items()[0].alert.metric, "memory");

        assert_eq!(notifications.mark_all_read(), 2);
        assert_eq!(notifications.unread(), 0);
        assert_eq!(notifications.mark_all_read(), 0);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut notifications = Notifications::new(2);
        for metric in ["cpu", "memory", "disk"] {
            notifications.record(alert(metric));
        }
        let metrics: Vec<String> = notifications.items().into_iter().map(|n| n.alert.metric).collect();
        assert_eq!(metrics, vec!["disk", "memory"]);
    }
}
