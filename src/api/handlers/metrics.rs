//! Handler for the Prometheus scrape endpoint.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::state::AppState;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Renders every counter recorded through the `metrics` facade.
///
/// # Endpoint
///
/// `GET /api/metrics`
///
/// Returns 404 when the process runs without an installed recorder.
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    let Some(handle) = &state.metrics else {
        return (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response();
    };

    handle.run_upkeep();

    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        handle.render(),
    )
        .into_response()
}
