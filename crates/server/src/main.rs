//! eCFR word-count server entry point.
//!
//! Loads configuration, opens the cache, serves HTTP until SIGINT/SIGTERM,
//! then aborts background work and closes the cache.

use std::sync::Arc;

use anyhow::{Context, Result};
use ecfr_client::{Endpoints, FetchClient, FetchConfig};
use ecfr_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod routes;
mod services;
mod tasks;

use routes::AppState;
use services::titles::COUNTS_TASK;
use services::{AgencyDirectory, TitleService};
use tasks::TaskRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(db = %config.db_path.display(), policy = ?config.version_cache_policy, "configuration loaded");

    let db = CacheDb::open(&config.db_path).await?;
    let http = Arc::new(FetchClient::new(&FetchConfig::from(&config))?);
    let endpoints = Endpoints::from_config(&config)?;
    let tasks = Arc::new(TaskRegistry::new());

    let titles = TitleService::new(Arc::new(db.clone()), http.clone(), endpoints.clone(), tasks.clone())
        .with_title_date(config.title_date.clone())
        .with_version_policy(config.version_cache_policy);
    let agencies = AgencyDirectory::new(http, endpoints);
    let app = routes::create_app(AppState { titles, agencies });

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    let shutdown_tasks = tasks.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            tracing::info!("Shutdown signal received");
            if shutdown_tasks.find(COUNTS_TASK) {
                tracing::info!("Aborting title counts computation");
            }
            let cancelled = shutdown_tasks.cancel_all();
            tracing::info!("Cancelled {} background tasks", cancelled);
        })
        .await?;

    tasks.cancel_all();
    db.close().await?;
    tracing::info!("Cache closed");

    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
