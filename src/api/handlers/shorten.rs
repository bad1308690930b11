//! Handler for link shortening endpoint.

use axum::{Json, extract::State, http::StatusCode};
use metrics::counter;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for a URL.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/some/long/path" }
/// ```
///
/// # Response
///
/// `201 Created`:
///
/// ```json
/// {
///   "short_url": "http://localhost:3000/aZ3k9Q",
///   "original_url": "https://example.com/some/long/path",
///   "short_code": "aZ3k9Q",
///   "created_at": "2025-01-01T12:00:00Z"
/// }
/// ```
///
/// Shortening a URL that already has a record returns that record.
///
/// # Errors
///
/// - 400 Bad Request: empty, oversized, relative or non-http(s) URL
/// - 500 Internal Server Error: code space exhausted or storage failure
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let record = state.url_service.shorten_url(&payload.url).await?;
    counter!("urls_shortened_total").increment(1);
    let short_url = state.short_url(&record.short_code);

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse::from_record(record, short_url)),
    ))
}
