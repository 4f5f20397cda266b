use crate::application::alert_policy::AlertPolicy;
use crate::domain::metric::{Bounds, Metric, MetricSnapshot};
use crate::domain::threshold::Thresholds;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid bind address '{0}'")]
    InvalidBind(String),
    #[error("at least one metric must be configured")]
    NoMetrics,
    #[error("metric '{0}' is configured more than once")]
    DuplicateMetric(String),
    #[error("metric '{metric}' has min {min} greater than max {max}")]
    InvalidBounds { metric: String, min: f64, max: f64 },
    #[error("metric '{metric}' has only one of min/max")]
    PartialBounds { metric: String },
    #[error("metric '{metric}' has a negative or out-of-range jitter")]
    InvalidJitter { metric: String },
    #[error("metric '{metric}' has a non-finite initial value")]
    NonFiniteInitial { metric: String },
    #[error("metric '{metric}' has only one of warning/critical")]
    PartialThresholds { metric: String },
    #[error("metric '{metric}' has warning {warning} above critical {critical}")]
    UnorderedThresholds {
        metric: String,
        warning: f64,
        critical: f64,
    },
    #[error("{name} must be within [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub server: ServerSettings,
    pub simulation: SimulationSettings,
    pub alerts: AlertSettings,
    pub activity: ActivitySettings,
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub metrics: Vec<MetricConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationSettings {
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Replace,
    KeepCurrent,
    Queue,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertSettings {
    pub critical_probability: f64,
    pub warning_probability: f64,
    pub display_ms: u64,
    pub policy: PolicyKind,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    pub title_template: String,
    pub message_template: String,
}

fn default_queue_capacity() -> usize {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct ActivitySettings {
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationSettings {
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricConfig {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub unit: String,
    pub initial: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub jitter: f64,
    pub warning: Option<f64>,
    pub critical: Option<f64>,
}

impl MetricConfig {
    pub fn bounds(&self) -> Option<Bounds> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some(Bounds::new(min, max)),
            _ => None,
        }
    }

    pub fn thresholds(&self) -> Option<Thresholds> {
        match (self.warning, self.critical) {
            (Some(warning), Some(critical)) => Some(Thresholds::new(warning, critical)),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let metric = || self.key.clone();

        if !self.initial.is_finite() {
            return Err(ConfigError::NonFiniteInitial { metric: metric() });
        }
        // the walk draws from [-jitter, jitter], whose width must stay finite
        if !(2.0 * self.jitter).is_finite() || self.jitter < 0.0 {
            return Err(ConfigError::InvalidJitter { metric: metric() });
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) if !((max - min).is_finite() && min <= max) => {
                return Err(ConfigError::InvalidBounds {
                    metric: metric(),
                    min,
                    max,
                });
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(ConfigError::PartialBounds { metric: metric() });
            }
            _ => {}
        }
        match (self.warning, self.critical) {
            (Some(warning), Some(critical)) if !Thresholds::new(warning, critical).is_ordered() => {
                Err(ConfigError::UnorderedThresholds {
                    metric: metric(),
                    warning,
                    critical,
                })
            }
            (Some(_), None) | (None, Some(_)) => {
                Err(ConfigError::PartialThresholds { metric: metric() })
            }
            _ => Ok(()),
        }
    }
}

impl DashboardConfig {
    /// Rejects configurations that would misbehave mid-tick.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if self.metrics.is_empty() {
            return Err(ConfigError::NoMetrics);
        }
        let mut seen = HashSet::new();
        for metric in &self.metrics {
            if !seen.insert(metric.key.as_str()) {
                return Err(ConfigError::DuplicateMetric(metric.key.clone()));
            }
            metric.validate()?;
        }

        check_probability("alerts.critical_probability", self.alerts.critical_probability)?;
        check_probability("alerts.warning_probability", self.alerts.warning_probability)?;

        if self.simulation.tick_interval_ms == 0 {
            return Err(ConfigError::Zero("simulation.tick_interval_ms"));
        }
        if self.alerts.display_ms == 0 {
            return Err(ConfigError::Zero("alerts.display_ms"));
        }
        if self.alerts.policy == PolicyKind::Queue && self.alerts.queue_capacity == 0 {
            return Err(ConfigError::Zero("alerts.queue_capacity"));
        }
        if self.activity.capacity == 0 {
            return Err(ConfigError::Zero("activity.capacity"));
        }
        if self.notifications.capacity == 0 {
            return Err(ConfigError::Zero("notifications.capacity"));
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.server.bind.clone()))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.simulation.tick_interval_ms)
    }

    pub fn alert_display(&self) -> Duration {
        Duration::from_millis(self.alerts.display_ms)
    }

    pub fn alert_policy(&self) -> AlertPolicy {
        match self.alerts.policy {
            PolicyKind::Replace => AlertPolicy::Replace,
            PolicyKind::KeepCurrent => AlertPolicy::KeepCurrent,
            PolicyKind::Queue => AlertPolicy::Queue {
                capacity: self.alerts.queue_capacity,
            },
        }
    }

    /// Snapshot holding every metric at its initial value.
    pub fn seed_snapshot(&self) -> MetricSnapshot {
        let metrics = self
            .metrics
            .iter()
            .map(|m| {
                Metric::new(
                    m.key.clone(),
                    m.label.clone(),
                    m.unit.clone(),
                    m.initial,
                    m.bounds(),
                    m.jitter,
                )
            })
            .collect();
        MetricSnapshot::new(metrics)
    }

    /// Threshold table in configuration order; metrics without thresholds are skipped.
    pub fn threshold_table(&self) -> Vec<(String, Thresholds)> {
        self.metrics
            .iter()
            .filter_map(|m| m.thresholds().map(|t| (m.key.clone(), t)))
            .collect()
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

/// Loads `config/dashboard.*`, overridden by `DASHBOARD__SECTION__KEY` variables.
pub fn load_dashboard_config() -> Result<DashboardConfig, ConfigError> {
    build_dashboard_config(config::File::with_name("config/dashboard"), dashboard_environment())
}

fn dashboard_environment() -> config::Environment {
    config::Environment::with_prefix("DASHBOARD")
        .separator("__")
        .try_parsing(true)
}

fn build_dashboard_config<S>(file: S, environment: config::Environment) -> Result<DashboardConfig, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(environment)
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Replace `${name}` placeholders in a template string.
///
/// The template is scanned once; substituted values are copied verbatim and
/// unknown placeholders are kept as written.
pub fn render_template(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let Some(end) = tail.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };
        match vars.get(&tail[..end]) {
            Some(value) => result.push_str(value),
            None => result.push_str(&rest[start..start + end + 3]),
        }
        rest = &tail[end + 1..];
    }
    result.push_str(rest);
    result
}
