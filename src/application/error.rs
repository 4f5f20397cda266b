// Errors raised while updating dashboard state

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("metric '{metric}' produced a non-finite value")]
    NonFiniteMetric { metric: String },
    #[error("dashboard state lock was poisoned")]
    StatePoisoned,
}
