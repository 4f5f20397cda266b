// Alert domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// A transient, user-visible warning about a metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub metric: String,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(title: String, message: String, severity: Severity, metric: String, value: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            message,
            severity,
            metric,
            value,
            created_at: Utc::now(),
        }
    }
}
