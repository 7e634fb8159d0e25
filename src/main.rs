// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

#[cfg(test)]
mod test_util;

use std::{future::IntoFuture, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{routing::get, Router};
use chrono::Local;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::metrics_engine::MetricsEngine;
use crate::application::price_cache::PriceCache;
use crate::application::refresh_loop::RefreshLoop;
use crate::domain::dashboard::DashboardSnapshot;
use crate::domain::history::RollingBuffer;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::device_serial::DeviceSerial;
use crate::infrastructure::electricity_maps::ElectricityMapsClient;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_dashboard, get_snapshot, health_check};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load configuration")?;
    let started_at = Local::now();

    // Collaborators (infrastructure layer)
    let serial = DeviceSerial::open(
        &config.serial.device,
        config.serial.baud_rate,
        config.serial.startup_delay(),
    )
    .await?;
    if config.prices.token.is_empty() {
        tracing::warn!("No price API token configured, requests will be unauthenticated");
    }
    let fetcher = Arc::new(ElectricityMapsClient::new(
        config.prices.base_url.clone(),
        config.prices.token.clone(),
        config.prices.timeout(),
    )?);

    // Engine (application layer)
    let prices = PriceCache::new(fetcher, config.prices.zone.clone(), config.prices.timeout());
    let engine = MetricsEngine::new(
        Box::new(serial),
        config.serial.read_timeout(),
        RollingBuffer::new(config.dashboard.history_capacity),
        prices,
        started_at,
    );

    let (tx, rx) = watch::channel(DashboardSnapshot::empty());
    let refresh = RefreshLoop::new(engine, tx);
    let refresh_task = tokio::spawn(refresh.run(config.dashboard.refresh_interval()));

    // Build router (presentation layer)
    let state = Arc::new(AppState { snapshots: rx });
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/snapshot", get(get_snapshot))
        .route("/dashboard", get(get_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid server.bind address {}", config.server.bind))?;
    tracing::info!("Starting heater dashboard on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    serve_dashboard(listener, router, refresh_task).await
}

/// Serve HTTP until either the server or the refresh task stops.
async fn serve_dashboard(
    listener: TcpListener,
    router: Router,
    refresh_task: JoinHandle<()>,
) -> anyhow::Result<()> {
    tokio::select! {
        served = axum::serve(listener, router).into_future() => {
            served.context("HTTP server failed")
        }
        joined = refresh_task => {
            let err = match joined {
                Ok(()) => anyhow::anyhow!("Refresh loop exited"),
                Err(e) => anyhow::anyhow!("Refresh loop stopped: {}", e),
            };
            tracing::error!("{}, shutting down", err);
            Err(err)
        }
    }
}
