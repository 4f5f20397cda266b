// Domain layer - Dashboard state models
pub mod activity;
pub mod alert;
pub mod metric;
pub mod notification;
pub mod threshold;
