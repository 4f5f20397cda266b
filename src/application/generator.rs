// Metric generator - bounded random walk over the current snapshot
use crate::application::error::DashboardError;
use crate::application::random_source::RandomSource;
use crate::domain::metric::MetricSnapshot;
use chrono::Utc;

/// Derives the next snapshot: each metric moves by a uniform draw from
/// `[-jitter, jitter]` and is clamped back into its bounds.
pub fn next_snapshot(
    current: &MetricSnapshot,
    rng: &mut dyn RandomSource,
) -> Result<MetricSnapshot, DashboardError> {
    let mut metrics = Vec::with_capacity(current.metrics.len());

    for metric in &current.metrics {
        let delta = rng.uniform(-metric.jitter, metric.jitter);
        let value = metric.perturbed(delta);
        if !value.is_finite() {
            return Err(DashboardError::NonFiniteMetric {
                metric: metric.key.clone(),
            });
        }

        let mut next = metric.clone();
        next.value = value;
        metrics.push(next);
    }

    Ok(MetricSnapshot {
        sequence: current.sequence + 1,
        taken_at: Utc::now(),
        metrics,
    })
}
