//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use metrics::counter;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// Resolution, cache lookup and click accounting happen in the URL service;
/// click counters are updated after the response is produced.
///
/// # Errors
///
/// - 400 Bad Request: malformed short code
/// - 404 Not Found: no link with this code
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let original_url = state.url_service.redirect(&code).await?;

    counter!("redirects_total").increment(1);

    Ok(Redirect::temporary(&original_url))
}
