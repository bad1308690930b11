//! Top-level router.
//!
//! Wraps the API routes in trailing-slash normalization, which has to run
//! before routing and therefore sits outside the [`Router`].

use crate::api;
use crate::state::AppState;
use axum::Router;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// See [`api::routes::router`] for the meaning of `behind_proxy`.
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let router = api::routes::router(state, behind_proxy);

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
