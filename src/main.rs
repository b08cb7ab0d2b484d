// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::clock::SystemClock;
use crate::application::widget::DashboardWidget;
use crate::infrastructure::config::{load_influx_config, load_widget_config};
use crate::infrastructure::influx_sample_source::InfluxSampleSource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    health_check, return_to_live, select_interval, step_back, step_forward, widget_view,
};

// All widget callbacks run on one cooperative event loop.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let influx_config = load_influx_config()?;
    let widget_config = load_widget_config()?;
    let settings = widget_config.settings()?;

    // Create sample source (infrastructure layer)
    let source = Arc::new(InfluxSampleSource::new(
        influx_config.influx,
        widget_config.source.clone(),
        widget_config.query.clone(),
    ));

    // Create widget and start its periodic tasks (application layer)
    let widget = DashboardWidget::new(source, Arc::new(SystemClock), settings);
    let _tasks = widget.spawn();

    let state = Arc::new(AppState { widget });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/widget", get(widget_view))
        .route("/widget/back", post(step_back))
        .route("/widget/forward", post(step_forward))
        .route("/widget/live", post(return_to_live))
        .route("/widget/interval", put(select_interval))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = widget_config.bind_addr.parse()?;
    tracing::info!("Starting telemetry-window for {} on {}", widget_config.source, addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
