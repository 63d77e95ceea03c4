// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::chart_service::ChartService;
use crate::application::meter_session::{MeterSession, spawn_poller};
use crate::domain::selection::Selection;
use crate::infrastructure::config::{load_engine_config, load_metric_catalog};
use crate::infrastructure::http_source::HttpTelemetrySource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let engine_config = load_engine_config().context("Failed to load config/engine")?;
    let catalog = load_metric_catalog()?;
    tracing::info!("Loaded {} metrics", catalog.metrics().len());

    // Telemetry source (infrastructure layer)
    let source = Arc::new(HttpTelemetrySource::new(&engine_config.source)?);

    // Session and services (application layer)
    let session = MeterSession::start(
        source,
        catalog,
        Selection::today(engine_config.session.default_meter.clone()),
        engine_config.source.max_pages,
    );
    session.request_fetch().await;

    if let Some(secs) = engine_config.session.polling_secs {
        tracing::info!("Polling every {}s while the range ends today", secs);
        spawn_poller(session.clone(), Duration::from_secs(secs));
    }

    let state = Arc::new(AppState { chart_service: ChartService::new(session) });

    // Build router (presentation layer)
    // Exports are Brotli-encoded by the handler, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(handlers::health_check))
        .route("/status", get(handlers::status))
        .route("/selection", post(handlers::select))
        .route("/refresh", post(handlers::refresh))
        .route("/series", get(handlers::series))
        .route("/device", get(handlers::device))
        .route("/catalog", get(handlers::catalog))
        .route("/metrics/:metric/views", get(handlers::views))
        .route("/metrics/:metric/chart", get(handlers::chart))
        .route("/metrics/:metric/table", get(handlers::table))
        .route("/metrics/:metric/export", get(handlers::export_table))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = engine_config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", engine_config.server.bind))?;
    tracing::info!("Starting meterview service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
