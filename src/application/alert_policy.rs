// Alert slot - which alert is on screen and what happens to newcomers
use crate::domain::alert::Alert;
use std::collections::VecDeque;
use uuid::Uuid;

/// What to do with a new alert while another one is still shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPolicy {
    /// The new alert replaces the shown one.
    Replace,
    /// The new alert is dropped.
    KeepCurrent,
    /// The new alert waits its turn; the oldest waiting alert is evicted when full.
    Queue { capacity: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Offer {
    Shown { replaced: Option<Alert> },
    Queued { evicted: Option<Alert> },
    Dropped,
}

/// Result of taking the shown alert down.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cleared {
    pub removed: Option<Alert>,
    pub promoted: Option<Alert>,
}

#[derive(Debug, Clone)]
pub struct AlertSlot {
    policy: AlertPolicy,
    current: Option<Alert>,
    waiting: VecDeque<Alert>,
}

impl AlertSlot {
    pub fn new(policy: AlertPolicy) -> Self {
        Self {
            policy,
            current: None,
            waiting: VecDeque::new(),
        }
    }

    pub fn current(&self) -> Option<&Alert> {
        self.current.as_ref()
    }

    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    pub fn offer(&mut self, alert: Alert) -> Offer {
        if self.current.is_none() {
            self.current = Some(alert);
            return Offer::Shown { replaced: None };
        }

        match self.policy {
            AlertPolicy::Replace => Offer::Shown {
                replaced: self.current.replace(alert),
            },
            AlertPolicy::KeepCurrent => Offer::Dropped,
            AlertPolicy::Queue { capacity } => {
                let evicted = if self.waiting.len() >= capacity {
                    self.waiting.pop_front()
                } else {
                    None
                };
                self.waiting.push_back(alert);
                Offer::Queued { evicted }
            }
        }
    }

    /// Takes the shown alert down and promotes the next waiting one.
    pub fn clear(&mut self) -> Cleared {
        let removed = self.current.take();
        if removed.is_none() {
            return Cleared::default();
        }
        self.current = self.waiting.pop_front();
        Cleared {
            removed,
            promoted: self.current.clone(),
        }
    }

    /// Like `clear`, but only when `id` is still the shown alert.
    pub fn expire(&mut self, id: Uuid) -> Cleared {
        match &self.current {
            Some(alert) if alert.id == id => self.clear(),
            _ => Cleared::default(),
        }
    }
}
