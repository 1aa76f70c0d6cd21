// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{get, put},
    Router,
};
use chrono::{Datelike, Utc};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_composer::DashboardComposer;
use crate::infrastructure::config::{build_provider, load_app_config};
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    current_occupancy, get_dashboard, health_check, list_devices, list_years, put_granularity, put_month,
    put_year, query_occupancy, stream_occupancy,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_app_config().context("Failed to load dashboard configuration")?;
    let now = Utc::now();
    let years = app_config.year_list(now.year())?;
    let initial = app_config.initial_selection(&years, now.month());

    // Create series provider (infrastructure layer)
    let provider = build_provider(&app_config.provider, years.clone(), app_config.labels.clone())?;
    tracing::info!(kind = ?app_config.provider.kind, "Occupancy provider ready");

    // Compose dashboard (application layer)
    let composer = DashboardComposer::start(
        app_config.dashboard.title.clone(),
        app_config.devices.clone(),
        years,
        initial,
        provider,
    )
    .await?;

    let state = Arc::new(AppState { composer });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/devices", get(list_devices))
        .route("/years", get(list_years))
        .route("/occupancy", get(current_occupancy))
        .route("/occupancy/query", get(query_occupancy))
        .route("/occupancy/stream", get(stream_occupancy))
        .route("/selection/year", put(put_year))
        .route("/selection/granularity", put(put_granularity))
        .route("/selection/month", put(put_month))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = app_config
        .server
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address {}", app_config.server.listen))?;
    tracing::info!("Starting busstop-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
