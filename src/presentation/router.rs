// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    dismiss_alert, get_activity, get_alert, get_notifications, get_snapshot, health_check,
    mark_notifications_read, post_activity, stream_dashboard,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Compression is handled in the response builders, not by a layer
    Router::new()
        .route("/healthz", get(health_check))
        .route("/snapshot", get(get_snapshot))
        .route("/activity", get(get_activity).post(post_activity))
        .route("/alert", get(get_alert).delete(dismiss_alert))
        .route("/notifications", get(get_notifications))
        .route("/notifications/read", post(mark_notifications_read))
        .route("/stream", get(stream_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
