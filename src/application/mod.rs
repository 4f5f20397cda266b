// Application layer - Simulation use cases and dashboard state
pub mod alert_policy;
pub mod error;
pub mod generator;
pub mod monitor;
pub mod random_source;
pub mod scheduler;
pub mod view_model;
