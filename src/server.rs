//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, service wiring, and the Axum
//! server lifecycle including graceful shutdown.

use crate::config::Config;
use crate::infrastructure::cache::{CacheService, RedisCache};
use crate::infrastructure::persistence::PgUrlRepository;
use crate::routes::app_router;
use crate::state::{AppState, ServiceOptions};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Runs the HTTP server with the given configuration. `metrics` is the
/// handle of the recorder installed by the caller and backs `/api/metrics`.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (the service runs uncached if Redis is unavailable)
/// - Axum HTTP server
///
/// Returns once a shutdown signal has been received and in-flight requests
/// have completed.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config, metrics: PrometheusHandle) -> Result<()> {
    let pool = connect_database(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let cache = connect_cache(&config).await;

    let repository = Arc::new(PgUrlRepository::new(Arc::new(pool)));
    let state = AppState::build(repository, cache, ServiceOptions::from(&config))
        .with_metrics(metrics);

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Opens the PostgreSQL pool with the configured limits.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Connects to Redis if configured. Never fails: an unreachable Redis
/// disables the cache.
pub async fn connect_cache(config: &Config) -> Option<Arc<dyn CacheService>> {
    let redis_url = match &config.redis_url {
        Some(url) => url,
        None => {
            tracing::info!("Cache disabled");
            return None;
        }
    };

    match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
        Ok(redis) => {
            tracing::info!(ttl = config.cache_ttl_seconds, "Cache enabled (Redis)");
            Some(Arc::new(redis))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect to Redis, running without cache");
            None
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! { _ = ctrl_c => {}, _ = terminate => {}, }
    tracing::info!("Shutdown signal received, draining connections");
}
