// Presentation layer - HTTP surface over the view-model
pub mod app_state;
pub mod handlers;
pub mod router;
