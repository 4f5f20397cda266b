// Dashboard view-model - single owner of the observable dashboard state
use crate::application::alert_policy::{AlertPolicy, AlertSlot, Cleared, Offer};
use crate::application::error::DashboardError;
use crate::application::generator::next_snapshot;
use crate::application::monitor::ThresholdMonitor;
use crate::application::random_source::RandomSource;
use crate::domain::activity::{ActivityLog, ActivityLogEntry};
use crate::domain::alert::Alert;
use crate::domain::metric::MetricSnapshot;
use crate::domain::notification::{Notification, Notifications};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use uuid::Uuid;

const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearReason {
    Dismissed,
    Expired,
    Replaced,
}

/// Change published to observers after the state has been updated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DashboardEvent {
    Snapshot(MetricSnapshot),
    Activity(ActivityLogEntry),
    AlertShown(Alert),
    AlertCleared { id: Uuid, reason: ClearReason },
}

#[derive(Debug, Clone)]
pub struct ViewModelSettings {
    pub alert_policy: AlertPolicy,
    pub alert_display: Duration,
    pub activity_capacity: usize,
    pub notification_capacity: usize,
}

type Observer = Arc<dyn Fn(&DashboardEvent) + Send + Sync>;

/// Events waiting for delivery, in the order their changes were committed.
///
/// Each event carries the first observer id that did not exist yet when it
/// was queued; later observers never receive it.
#[derive(Default)]
struct Outbox {
    queue: VecDeque<(u64, DashboardEvent)>,
    draining: bool,
}

struct DashboardState {
    snapshot: MetricSnapshot,
    rng: Box<dyn RandomSource>,
    alerts: AlertSlot,
    dismiss_timer: Option<AbortHandle>,
    activity: ActivityLog,
    notifications: Notifications,
}

pub struct DashboardViewModel {
    me: Weak<DashboardViewModel>,
    state: Mutex<DashboardState>,
    observers: Mutex<HashMap<u64, Observer>>,
    outbox: Mutex<Outbox>,
    next_observer: AtomicU64,
    monitor: ThresholdMonitor,
    alert_display: Duration,
}

/// Observer registration; dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    owner: Weak<DashboardViewModel>,
}

impl Subscription {
    #[allow(dead_code)]
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.observers().remove(&self.id);
        }
    }
}

impl DashboardViewModel {
    pub fn new(
        seed: MetricSnapshot,
        monitor: ThresholdMonitor,
        rng: Box<dyn RandomSource>,
        settings: ViewModelSettings,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            state: Mutex::new(DashboardState {
                snapshot: seed,
                rng,
                alerts: AlertSlot::new(settings.alert_policy),
                dismiss_timer: None,
                activity: ActivityLog::new(settings.activity_capacity),
                notifications: Notifications::new(settings.notification_capacity),
            }),
            observers: Mutex::new(HashMap::new()),
            outbox: Mutex::new(Outbox::default()),
            next_observer: AtomicU64::new(0),
            monitor,
            alert_display: settings.alert_display,
        })
    }

    /// Runs one simulation step and publishes the result.
    ///
    /// The whole read-modify-write happens under the state lock, so concurrent
    /// callers are serialized. On error the previous snapshot is kept.
    pub fn tick(&self) -> Result<MetricSnapshot, DashboardError> {
        let mut events = Vec::new();
        let snapshot = {
            let mut guard = self.lock_state()?;
            let state = &mut *guard;

            let next = next_snapshot(&state.snapshot, state.rng.as_mut())?;
            let alert = self.monitor.evaluate(&next, state.rng.as_mut());

            debug_assert!(next.is_within_bounds());
            state.snapshot = next.clone();
            events.push(DashboardEvent::Snapshot(next.clone()));

            if let Some(alert) = alert {
                self.offer_alert(state, alert, &mut events);
            }
            self.enqueue(events);
            next
        };

        tracing::debug!("Tick {} applied", snapshot.sequence);
        self.flush();
        Ok(snapshot)
    }

    pub fn append_activity(&self, entry: ActivityLogEntry) -> Result<(), DashboardError> {
        {
            let mut state = self.lock_state()?;
            state.activity.push(entry.clone());
            self.enqueue(vec![DashboardEvent::Activity(entry)]);
        }
        self.flush();
        Ok(())
    }

    /// Clears the shown alert and cancels its auto-dismiss.
    pub fn dismiss_alert(&self) -> Result<Option<Alert>, DashboardError> {
        let mut events = Vec::new();
        let removed = {
            let mut guard = self.lock_state()?;
            let state = &mut *guard;
            if let Some(timer) = state.dismiss_timer.take() {
                timer.abort();
            }
            let cleared = state.alerts.clear();
            let removed = self.apply_cleared(state, cleared, ClearReason::Dismissed, &mut events);
            self.enqueue(events);
            removed
        };
        self.flush();
        Ok(removed)
    }

    fn expire_alert(&self, id: Uuid) -> Result<(), DashboardError> {
        let mut events = Vec::new();
        {
            let mut guard = self.lock_state()?;
            let state = &mut *guard;
            let cleared = state.alerts.expire(id);
            if cleared.removed.is_some() {
                // the firing timer is this one; it is finishing on its own
                state.dismiss_timer = None;
            }
            self.apply_cleared(state, cleared, ClearReason::Expired, &mut events);
            self.enqueue(events);
        }
        self.flush();
        Ok(())
    }

    pub fn snapshot(&self) -> Result<MetricSnapshot, DashboardError> {
        Ok(self.lock_state()?.snapshot.clone())
    }

    /// Activity entries, most recent first.
    pub fn activity_log(&self) -> Result<Vec<ActivityLogEntry>, DashboardError> {
        Ok(self.lock_state()?.activity.entries())
    }

    #[allow(dead_code)]
    pub fn current_alert(&self) -> Result<Option<Alert>, DashboardError> {
        Ok(self.lock_state()?.alerts.current().cloned())
    }

    /// Shown alert and the number waiting behind it, read together.
    pub fn alert_status(&self) -> Result<(Option<Alert>, usize), DashboardError> {
        let state = self.lock_state()?;
        Ok((state.alerts.current().cloned(), state.alerts.waiting()))
    }

    /// Notification history and its unread count, read together.
    pub fn notification_status(&self) -> Result<(Vec<Notification>, usize), DashboardError> {
        let state = self.lock_state()?;
        Ok((state.notifications.items(), state.notifications.unread()))
    }

    pub fn mark_notifications_read(&self) -> Result<usize, DashboardError> {
        Ok(self.lock_state()?.notifications.mark_all_read())
    }

    /// Registers `callback` for every published event until the returned
    /// subscription is dropped.
    ///
    /// Events reach each observer in the order their changes were committed,
    /// possibly on another caller's thread. Callbacks run with no lock held.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&DashboardEvent) + Send + Sync + 'static,
    {
        let id = self.next_observer.fetch_add(1, Ordering::SeqCst);
        self.observers().insert(id, Arc::new(callback));
        Subscription {
            id,
            owner: self.me.clone(),
        }
    }

    /// Like `subscribe`, but first hands `callback` the current snapshot.
    ///
    /// Registration happens under the state lock, so the callback sees every
    /// later snapshot exactly once and none it was already given. The initial
    /// call runs with the lock held.
    pub fn subscribe_from_snapshot<F>(&self, callback: F) -> Result<Subscription, DashboardError>
    where
        F: Fn(&DashboardEvent) + Send + Sync + 'static,
    {
        let state = self.lock_state()?;
        callback(&DashboardEvent::Snapshot(state.snapshot.clone()));
        let subscription = self.subscribe(callback);
        drop(state);
        Ok(subscription)
    }

    pub fn observer_count(&self) -> usize {
        self.observers().len()
    }

    /// Cancels the pending auto-dismiss, if any.
    pub fn shutdown(&self) {
        if let Ok(mut state) = self.lock_state() {
            if let Some(timer) = state.dismiss_timer.take() {
                timer.abort();
            }
        }
    }

    fn offer_alert(&self, state: &mut DashboardState, alert: Alert, events: &mut Vec<DashboardEvent>) {
        match state.alerts.offer(alert.clone()) {
            Offer::Shown { replaced } => {
                if let Some(old) = replaced {
                    events.push(DashboardEvent::AlertCleared {
                        id: old.id,
                        reason: ClearReason::Replaced,
                    });
                }
                self.show_alert(state, alert, events);
            }
            Offer::Queued { evicted } => {
                tracing::info!("Alert for {} queued behind the shown alert", alert.metric);
                if let Some(evicted) = evicted {
                    tracing::warn!("Alert queue full, discarding alert for {}", evicted.metric);
                }
            }
            Offer::Dropped => {
                tracing::warn!("Alert for {} dropped, another alert is shown", alert.metric);
            }
        }
    }

    fn apply_cleared(
        &self,
        state: &mut DashboardState,
        cleared: Cleared,
        reason: ClearReason,
        events: &mut Vec<DashboardEvent>,
    ) -> Option<Alert> {
        let removed = cleared.removed?;
        events.push(DashboardEvent::AlertCleared {
            id: removed.id,
            reason,
        });
        if let Some(next) = cleared.promoted {
            self.show_alert(state, next, events);
        }
        Some(removed)
    }

    fn show_alert(&self, state: &mut DashboardState, alert: Alert, events: &mut Vec<DashboardEvent>) {
        tracing::warn!("{} alert: {}", alert.severity, alert.message);

        self.arm_dismiss_timer(state, alert.id);

        let entry = ActivityLogEntry::new(
            alert.title.clone(),
            SYSTEM_ACTOR.to_string(),
            alert.severity,
            Some(alert.message.clone()),
        );
        state.activity.push(entry.clone());
        state.notifications.record(alert.clone());

        events.push(DashboardEvent::AlertShown(alert));
        events.push(DashboardEvent::Activity(entry));
    }

    fn arm_dismiss_timer(&self, state: &mut DashboardState, id: Uuid) {
        if let Some(timer) = state.dismiss_timer.take() {
            timer.abort();
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No runtime available, alert {} will not auto-dismiss", id);
            return;
        };

        let me = self.me.clone();
        let display = self.alert_display;
        let task = runtime.spawn(async move {
            tokio::time::sleep(display).await;
            if let Some(view_model) = me.upgrade() {
                if let Err(e) = view_model.expire_alert(id) {
                    tracing::error!("Failed to expire alert {}: {}", id, e);
                }
            }
        });
        state.dismiss_timer = Some(task.abort_handle());
    }

    /// Queues events for delivery. Must be called with the state lock held.
    fn enqueue(&self, events: Vec<DashboardEvent>) {
        if events.is_empty() {
            return;
        }
        let cutoff = self.next_observer.load(Ordering::SeqCst);
        let mut outbox = self.outbox();
        outbox.queue.extend(events.into_iter().map(|event| (cutoff, event)));
    }

    /// Delivers queued events with no lock held, so callbacks may read state.
    /// Only one caller drains at a time; others leave their events to it.
    fn flush(&self) {
        {
            let mut outbox = self.outbox();
            if outbox.draining {
                return;
            }
            outbox.draining = true;
        }

        loop {
            let batch: Vec<(u64, DashboardEvent)> = {
                let mut outbox = self.outbox();
                if outbox.queue.is_empty() {
                    outbox.draining = false;
                    return;
                }
                outbox.queue.drain(..).collect()
            };
            let mut observers: Vec<(u64, Observer)> = self
                .observers()
                .iter()
                .map(|(id, observer)| (*id, observer.clone()))
                .collect();
            observers.sort_by_key(|(id, _)| *id);

            for (cutoff, event) in &batch {
                for (id, observer) in &observers {
                    if id < cutoff {
                        observer(event);
                    }
                }
            }
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, DashboardState>, DashboardError> {
        self.state.lock().map_err(|_| DashboardError::StatePoisoned)
    }

    fn outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn observers(&self) -> MutexGuard<'_, HashMap<u64, Observer>> {
        self.observers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for DashboardViewModel {
    fn drop(&mut self) {
        if let Ok(state) = self.state.get_mut() {
            if let Some(timer) = state.dismiss_timer.take() {
                timer.abort();
            }
        }
    }
}
