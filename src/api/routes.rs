//! API route configuration.
//!
//! # Route Structure
//!
//! - `POST /api/shorten` - Create a short link
//! - `GET  /{code}`      - Short link redirect
//! - `GET  /health`      - Health check: store, cache, background jobs
//! - `GET  /api/ready`   - Readiness (store ping)
//! - `GET  /api/live`    - Liveness
//! - `GET  /api/metrics` - Prometheus metrics
//!
//! Readiness, liveness and metrics are not rate limited.

use crate::api::handlers::{
    health_handler, liveness_handler, metrics_handler, readiness_handler, redirect_handler,
    shorten_handler,
};
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Public routes without middleware.
pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/api/shorten", post(shorten_handler))
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
}

/// Readiness, liveness and scrape routes for orchestrators and monitoring.
pub fn ops_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ready", get(readiness_handler))
        .route("/api/live", get(liveness_handler))
        .route("/api/metrics", get(metrics_handler))
}

/// Service routes with rate limiting, ops routes without, all traced.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   forwarding headers instead of the peer socket address; enable only when
///   the service runs behind a trusted reverse proxy
pub fn router(state: AppState, behind_proxy: bool) -> Router {
    let routes = service_routes();

    let limited = if behind_proxy {
        routes.layer(rate_limit::proxied_layer())
    } else {
        routes.layer(rate_limit::layer())
    };

    limited
        .merge(ops_routes())
        .with_state(state)
        .layer(tracing::layer())
}
