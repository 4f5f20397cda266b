// Metric snapshot domain models
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Inclusive valid range of a bounded metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub key: String,
    pub label: String,
    pub unit: String,
    pub value: f64,
    pub bounds: Option<Bounds>,
    /// Largest absolute change applied in a single tick.
    pub jitter: f64,
}

impl Metric {
    pub fn new(
        key: String,
        label: String,
        unit: String,
        value: f64,
        bounds: Option<Bounds>,
        jitter: f64,
    ) -> Self {
        Self {
            key,
            label,
            unit,
            value,
            bounds,
            jitter,
        }
    }

    /// Value after applying `delta`, clamped to the bounds.
    /// Unbounded metrics are counts or money and never go negative.
    pub fn perturbed(&self, delta: f64) -> f64 {
        let raw = self.value + delta;
        match self.bounds {
            Some(bounds) => bounds.clamp(raw),
            None => raw.max(0.0),
        }
    }
}

/// The set of metric values at one point in time, in configuration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSnapshot {
    pub sequence: u64,
    pub taken_at: DateTime<Utc>,
    pub metrics: Vec<Metric>,
}

impl MetricSnapshot {
    pub fn new(metrics: Vec<Metric>) -> Self {
        Self {
            sequence: 0,
            taken_at: Utc::now(),
            metrics,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.key == key)
    }

    #[allow(dead_code)]
    pub fn value(&self, key: &str) -> Option<f64> {
        self.get(key).map(|m| m.value)
    }

    /// True when every bounded metric lies inside its range.
    pub fn is_within_bounds(&self) -> bool {
        self.metrics
            .iter()
            .all(|m| m.bounds.is_none_or(|b| b.contains(m.value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(value: f64, bounds: Option<Bounds>) -> Metric {
        Metric::new(
            "cpu".to_string(),
            "CPU Usage".to_string(),
            "%".to_string(),
            value,
            bounds,
            10.0,
        )
    }

    #[test]
    fn test_perturbed_clamps_to_bounds() {
        let m = metric(85.0, Some(Bounds::new(20.0, 90.0)));
        assert_eq!(m.perturbed(10.0), 90.0);
        assert_eq!(m.perturbed(-70.0), 20.0);
        assert_eq!(m.perturbed(2.5), 87.5);
    }

    #[test]
    fn test_unbounded_never_negative() {
        let m = metric(3.0, None);
        assert_eq!(m.perturbed(-10.0), 0.0);
        assert_eq!(m.perturbed(1_000.0), 1_003.0);
    }

    #[test]
    fn test_snapshot_lookup_and_bounds_check() {
        let snapshot = MetricSnapshot::new(vec![metric(95.0, Some(Bounds::new(20.0, 90.0)))]);
        assert_eq!(snapshot.value("cpu"), Some(95.0));
        assert!(snapshot.get("disk").is_none());
        assert!(!snapshot.is_within_bounds());
    }
}
