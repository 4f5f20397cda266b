// HTTP request handlers
use crate::application::error::DashboardError;
use crate::domain::activity::ActivityLogEntry;
use crate::domain::alert::{Alert, Severity};
use crate::domain::notification::Notification;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

const STREAM_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
pub struct NewActivity {
    pub action: String,
    pub actor: String,
    pub severity: Option<Severity>,
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AlertView {
    pub alert: Option<Alert>,
    pub waiting: usize,
}

#[derive(Debug, Serialize)]
pub struct DismissView {
    pub dismissed: Option<Alert>,
}

#[derive(Debug, Serialize)]
pub struct NotificationsView {
    pub unread: usize,
    pub items: Vec<Notification>,
}

#[derive(Debug, Serialize)]
pub struct MarkedView {
    pub marked: usize,
}

fn state_error(e: DashboardError) -> Response {
    tracing::error!("Dashboard state unavailable: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

async fn respond<T: Serialize>(data: Result<T, DashboardError>, headers: &HeaderMap) -> Response {
    match data {
        Ok(data) => match json_response(&data, accepts_brotli(headers)).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(e) => state_error(e),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current metric snapshot
pub async fn get_snapshot(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(state.view_model.snapshot(), &headers).await
}

/// Activity log, most recent first
pub async fn get_activity(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    respond(state.view_model.activity_log(), &headers).await
}

/// Record a user action
pub async fn post_activity(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewActivity>,
) -> Response {
    if body.action.trim().is_empty() || body.actor.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "action and actor are required").into_response();
    }

    let entry = ActivityLogEntry::new(
        body.action,
        body.actor,
        body.severity.unwrap_or(Severity::Info),
        body.details,
    );
    match state.view_model.append_activity(entry.clone()) {
        Ok(()) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => state_error(e),
    }
}

pub async fn get_alert(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state
        .view_model
        .alert_status()
        .map(|(alert, waiting)| AlertView { alert, waiting });
    respond(view, &headers).await
}

pub async fn dismiss_alert(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state
        .view_model
        .dismiss_alert()
        .map(|dismissed| DismissView { dismissed });
    respond(view, &headers).await
}

pub async fn get_notifications(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let view = state
        .view_model
        .notification_status()
        .map(|(items, unread)| NotificationsView { unread, items });
    respond(view, &headers).await
}

pub async fn mark_notifications_read(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let view = state
        .view_model
        .mark_notifications_read()
        .map(|marked| MarkedView { marked });
    respond(view, &headers).await
}

/// Stream dashboard events, starting with the current snapshot
pub async fn stream_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);

    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    let sink = tx.clone();
    let subscription = match state.view_model.subscribe_from_snapshot(move |event| {
        if let Err(mpsc::error::TrySendError::Full(_)) = sink.try_send(event.clone()) {
            tracing::warn!("Stream client lagging, dropping event");
        }
    }) {
        Ok(subscription) => subscription,
        Err(e) => return state_error(e),
    };
    tracing::info!(
        "Stream client connected, {} subscribers",
        state.view_model.observer_count()
    );

    // The subscription lives until the client goes away.
    tokio::spawn(async move {
        tx.closed().await;
        drop(subscription);
        tracing::info!("Stream client disconnected");
    });

    stream_from_receiver(rx, compress).into_response()
}
