//! Handlers for health, readiness and liveness endpoints.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{
    BackgroundInfo, CheckStatus, HealthChecks, HealthResponse, StatusResponse,
};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: Store ping
/// 2. **Cache**: Redis PING, or "disabled" when no cache is configured
///
/// A disabled cache counts as healthy; an unreachable one does not. The
/// response also carries background job counters (in flight, dropped), which
/// are reported as-is and do not change the status.
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;
    let cache_check = check_cache(&state).await;

    let all_healthy = db_check.is_ok() && cache_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            cache: cache_check,
        },
        background: BackgroundInfo {
            in_flight: state.background.in_flight(),
            dropped: state.background.dropped(),
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.repository.ping().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

/// Checks cache connectivity via PING command.
async fn check_cache(state: &AppState) -> CheckStatus {
    match &state.cache {
        None => CheckStatus::ok("Cache disabled"),
        Some(cache) if cache.health_check().await => CheckStatus::ok("Cache connected"),
        Some(_) => CheckStatus::error("Cache connection failed"),
    }
}

/// Readiness: the service can take traffic when the store answers.
///
/// `GET /api/ready` returns 200 `{"status":"ready"}` or 503
/// `{"status":"not_ready"}`. The cache is not consulted; redirects work
/// without it.
pub async fn readiness_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<StatusResponse>) {
    match state.repository.ping().await {
        Ok(()) => (StatusCode::OK, Json(StatusResponse::new("ready"))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(StatusResponse::new("not_ready")),
            )
        }
    }
}

/// Liveness. `GET /api/live` always returns 200 `{"status":"alive"}`.
pub async fn liveness_handler() -> Json<StatusResponse> {
    Json(StatusResponse::new("alive"))
}
