// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::application::monitor::ThresholdMonitor;
use crate::application::random_source::{RandomSource, RngSource};
use crate::application::scheduler::TickScheduler;
use crate::application::view_model::{DashboardViewModel, ViewModelSettings};
use crate::infrastructure::config::load_dashboard_config;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load and validate configuration before anything starts
    let config = load_dashboard_config()?;
    config.validate()?;
    let addr = config.bind_addr()?;

    let rng: Box<dyn RandomSource> = match config.simulation.seed {
        Some(seed) => {
            tracing::info!("Using seeded random source ({})", seed);
            Box::new(RngSource::seeded(seed))
        }
        None => Box::new(RngSource::from_entropy()),
    };

    // Create the view-model (application layer)
    let monitor = ThresholdMonitor::new(
        config.threshold_table(),
        config.alerts.critical_probability,
        config.alerts.warning_probability,
        config.alerts.title_template.clone(),
        config.alerts.message_template.clone(),
    );
    let view_model = DashboardViewModel::new(
        config.seed_snapshot(),
        monitor,
        rng,
        ViewModelSettings {
            alert_policy: config.alert_policy(),
            alert_display: config.alert_display(),
            activity_capacity: config.activity.capacity,
            notification_capacity: config.notifications.capacity,
        },
    );

    let ticker = TickScheduler::start(view_model.clone(), config.tick_interval());

    // Build router (presentation layer)
    let state = Arc::new(AppState {
        view_model: view_model.clone(),
    });
    let router = build_router(state);

    tracing::info!("Starting admin-pulse on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // The schedule is released on every exit path
    ticker.stop().await;
    view_model.shutdown();
    served?;

    tracing::info!("admin-pulse stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
