// Tick scheduler - drives the view-model on a fixed interval
use crate::application::view_model::DashboardViewModel;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Running tick schedule. Dropping the handle cancels the schedule.
pub struct TickerHandle {
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl TickerHandle {
    /// Stops the schedule and waits for the in-flight tick, if any.
    pub async fn stop(mut self) {
        self.shutdown.notify_one();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    #[allow(dead_code)]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub struct TickScheduler;

impl TickScheduler {
    /// Spawns the tick loop. The first tick fires one `period` after start.
    pub fn start(view_model: Arc<DashboardViewModel>, period: Duration) -> TickerHandle {
        let shutdown = Arc::new(Notify::new());
        let stop = shutdown.clone();

        let task = tokio::spawn(async move {
            info!("Tick scheduler started, period {:?}", period);
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = view_model.tick() {
                            error!("Tick failed, stopping scheduler: {}", e);
                            break;
                        }
                    }
                    _ = stop.notified() => {
                        info!("Tick scheduler shutting down");
                        break;
                    }
                }
            }

            view_model.shutdown();
        });

        TickerHandle {
            shutdown,
            task: Some(task),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::alert_policy::AlertPolicy;
    use crate::application::monitor::ThresholdMonitor;
    use crate::application::random_source::RngSource;
    use crate::application::view_model::ViewModelSettings;
    use crate::domain::metric::{Bounds, Metric, MetricSnapshot};

    const PERIOD: Duration = Duration::from_millis(3000);

    fn view_model(initial: f64) -> Arc<DashboardViewModel> {
        DashboardViewModel::new(
            MetricSnapshot::new(vec![Metric::new(
                "cpu".into(),
                "CPU".into(),
                "%".into(),
                initial,
                Some(Bounds::new(20.0, 90.0)),
                10.0,
            )]),
            ThresholdMonitor::new(Vec::new(), 0.0, 0.0, String::new(), String::new()),
            Box::new(RngSource::seeded(1)),
            ViewModelSettings {
                alert_policy: AlertPolicy::Replace,
                alert_display: Duration::from_secs(5),
                activity_capacity: 10,
                notification_capacity: 10,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let vm = view_model(45.0);
        let handle = TickScheduler::start(vm.clone(), PERIOD);

        tokio::time::sleep(PERIOD * 3 + Duration::from_millis(10)).await;
        assert_eq!(vm.snapshot().unwrap().sequence, 3);
        assert!(handle.is_running());

        handle.stop().await;
        tokio::time::sleep(PERIOD * 5).await;
        assert_eq!(vm.snapshot().unwrap().sequence, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_schedule() {
        let vm = view_model(45.0);
        {
            let _handle = TickScheduler::start(vm.clone(), PERIOD);
            tokio::time::sleep(PERIOD + Duration::from_millis(10)).await;
        }
        tokio::time::sleep(PERIOD * 4).await;
        assert_eq!(vm.snapshot().unwrap().sequence, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_error_stops_schedule_and_keeps_snapshot() {
        let vm = DashboardViewModel::new(
            MetricSnapshot::new(vec![Metric::new(
                "revenue".into(),
                "Revenue".into(),
                "$".into(),
                f64::INFINITY,
                None,
                1.0,
            )]),
            ThresholdMonitor::new(Vec::new(), 0.0, 0.0, String::new(), String::new()),
            Box::new(RngSource::seeded(1)),
            ViewModelSettings {
                alert_policy: AlertPolicy::Replace,
                alert_display: Duration::from_secs(5),
                activity_capacity: 10,
                notification_capacity: 10,
            },
        );
        let handle = TickScheduler::start(vm.clone(), PERIOD);

        tokio::time::sleep(PERIOD * 2).await;
        assert!(!handle.is_running());
        assert_eq!(vm.snapshot().unwrap().sequence, 0);
    }
}
