// Threshold monitor - turns threshold breaches into probabilistically gated alerts
use crate::application::random_source::RandomSource;
use crate::domain::alert::{Alert, Severity};
use crate::domain::metric::{Metric, MetricSnapshot};
use crate::domain::threshold::Thresholds;
use crate::infrastructure::config::render_template;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ThresholdMonitor {
    rules: Vec<(String, Thresholds)>,
    critical_probability: f64,
    warning_probability: f64,
    title_template: String,
    message_template: String,
}

impl ThresholdMonitor {
    pub fn new(
        rules: Vec<(String, Thresholds)>,
        critical_probability: f64,
        warning_probability: f64,
        title_template: String,
        message_template: String,
    ) -> Self {
        Self {
            rules,
            critical_probability,
            warning_probability,
            title_template,
            message_template,
        }
    }

    /// Returns the alert to surface for `snapshot`, if any.
    ///
    /// Every breaching metric rolls its own gate, in rule order. When more than
    /// one passes, the highest severity wins and ties go to the earlier rule.
    pub fn evaluate(&self, snapshot: &MetricSnapshot, rng: &mut dyn RandomSource) -> Option<Alert> {
        let mut winner: Option<(Severity, &Metric)> = None;

        for (key, thresholds) in &self.rules {
            let Some(metric) = snapshot.get(key) else {
                continue;
            };
            let Some(severity) = thresholds.classify(metric.value) else {
                continue;
            };

            let probability = match severity {
                Severity::Critical => self.critical_probability,
                _ => self.warning_probability,
            };
            if !rng.chance(probability) {
                continue;
            }

            tracing::debug!(
                "Threshold breach on {}: value={:.1}, severity={}",
                key, metric.value, severity
            );

            if winner.is_none_or(|(best, _)| severity > best) {
                winner = Some((severity, metric));
            }
        }

        winner.map(|(severity, metric)| self.build_alert(severity, metric))
    }

    fn build_alert(&self, severity: Severity, metric: &Metric) -> Alert {
        let mut vars = HashMap::new();
        vars.insert("label".to_string(), metric.label.clone());
        vars.insert("value".to_string(), format!("{:.1}", metric.value));
        vars.insert("unit".to_string(), metric.unit.clone());
        vars.insert("severity".to_string(), severity.to_string());

        Alert::new(
            render_template(&self.title_template, &vars),
            render_template(&self.message_template, &vars),
            severity,
            metric.key.clone(),
            metric.value,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::random_source::RngSource;
    use crate::application::random_source::tests::ScriptedSource;
    use crate::domain::metric::Bounds;

    fn metric(key: &str, value: f64) -> Metric {
        Metric::new(
            key.to_string(),
            key.to_uppercase(),
            "%".to_string(),
            value,
            Some(Bounds::new(0.0, 100.0)),
            0.0,
        )
    }

    fn monitor(critical_probability: f64, warning_probability: f64) -> ThresholdMonitor {
        ThresholdMonitor::new(
            vec![
                ("cpu".to_string(), Thresholds::new(70.0, 85.0)),
                ("memory".to_string(), Thresholds::new(70.0, 85.0)),
                ("disk".to_string(), Thresholds::new(70.0, 85.0)),
            ],
            critical_probability,
            warning_probability,
            "${label} ${severity}".to_string(),
            "${label} is at ${value}${unit}".to_string(),
        )
    }

    #[test]
    fn test_pinned_cpu_raises_critical_alert() {
        let snapshot = MetricSnapshot::new(vec![metric("cpu", 90.0)]);
        let monitor = monitor(0.2, 0.1);

        // 0.8^20 ~ 1.2% of 20-tick runs see nothing; across 100 seeds nearly all must alert
        let runs_with_alert = (0..100u64)
            .filter(|seed| {
                let mut rng = RngSource::seeded(*seed);
                let alerts: Vec<Alert> = (0..20)
                    .filter_map(|_| monitor.evaluate(&snapshot, &mut rng))
                    .collect();
                assert!(alerts.iter().all(|a| a.severity == Severity::Critical));
                !alerts.is_empty()
            })
            .count();

        assert!(runs_with_alert >= 90, "only {} runs alerted", runs_with_alert);
    }

    #[test]
    fn test_alert_text_is_rendered_from_templates() {
        let snapshot = MetricSnapshot::new(vec![metric("cpu", 90.0)]);
        let alert = monitor(0.2, 0.1)
            .evaluate(&snapshot, &mut ScriptedSource::maxed())
            .unwrap();

        assert_eq!(alert.title, "CPU critical");
        assert_eq!(alert.message, "CPU is at 90.0%");
        assert_eq!(alert.metric, "cpu");
        assert_eq!(alert.value, 90.0);
    }

    #[test]
    fn test_placeholder_text_in_label_is_not_expanded() {
        let mut cpu = metric("cpu", 90.0);
        cpu.label = "Load ${unit} ${severity}".to_string();
        let snapshot = MetricSnapshot::new(vec![cpu]);

        let alert = monitor(1.0, 1.0)
            .evaluate(&snapshot, &mut ScriptedSource::maxed())
            .unwrap();

        assert_eq!(alert.title, "Load ${unit} ${severity} critical");
        assert_eq!(alert.message, "Load ${unit} ${severity} is at 90.0%");
    }

    #[test]
    fn test_zero_probability_never_alerts() {
        let snapshot = MetricSnapshot::new(vec![metric("cpu", 90.0), metric("memory", 75.0)]);
        let monitor = monitor(0.0, 0.0);
        let mut rng = RngSource::seeded(11);

        assert!((0..20).all(|_| monitor.evaluate(&snapshot, &mut rng).is_none()));
    }

    #[test]
    fn test_below_warning_never_alerts() {
        let snapshot = MetricSnapshot::new(vec![metric("cpu", 70.0)]);
        let monitor = monitor(1.0, 1.0);
        assert!(monitor.evaluate(&snapshot, &mut ScriptedSource::maxed()).is_none());
    }

    #[test]
    fn test_warning_band_uses_warning_probability() {
        let snapshot = MetricSnapshot::new(vec![metric("cpu", 80.0)]);

        // roll 0.15 passes a 0.2 gate but not a 0.1 gate
        let mut rng = ScriptedSource::new(Vec::new(), vec![0.15]);
        assert!(monitor(0.2, 0.1).evaluate(&snapshot, &mut rng).is_none());

        let mut rng = ScriptedSource::new(Vec::new(), vec![0.05]);
        let alert = monitor(0.2, 0.1).evaluate(&snapshot, &mut rng).unwrap();
        assert_eq!(alert.severity, Severity::Warning);
    }

    #[test]
    fn test_highest_severity_wins_then_rule_order() {
        let snapshot = MetricSnapshot::new(vec![
            metric("cpu", 75.0),
            metric("memory", 90.0),
            metric("disk", 95.0),
        ]);
        let alert = monitor(1.0, 1.0)
            .evaluate(&snapshot, &mut ScriptedSource::maxed())
            .unwrap();
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.metric, "memory");
    }

    #[test]
    fn test_failed_gate_lets_next_metric_win() {
        let snapshot = MetricSnapshot::new(vec![metric("cpu", 90.0), metric("memory", 88.0)]);
        // cpu's gate fails, memory's passes
        let mut rng = ScriptedSource::new(Vec::new(), vec![0.9, 0.0]);
        let alert = monitor(0.5, 0.5).evaluate(&snapshot, &mut rng).unwrap();
        assert_eq!(alert.metric, "memory");
    }

    #[test]
    fn test_rules_for_missing_metrics_are_ignored() {
        let snapshot = MetricSnapshot::new(vec![metric("network", 99.0)]);
        assert!(monitor(1.0, 1.0)
            .evaluate(&snapshot, &mut ScriptedSource::maxed())
            .is_none());
    }
}
