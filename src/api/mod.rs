//! HTTP surface: route table and the shared middleware stack.

pub mod handlers {
    pub use crate::handlers::*;
}

use crate::handlers::{self as h, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Request size limit for every `/api` route.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The `/api/v1` routes, with the body size limit applied.
///
/// Rate limiting is layered on by the caller so tests can drive the router
/// without a peer address.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/asset-classes", get(h::asset_classes))
        .route("/api/v1/funds", get(h::list_funds))
        .route("/api/v1/funds/:slug", get(h::get_fund))
        .route("/api/v1/profile/validate", post(h::validate_profile))
        .route("/api/v1/portfolios/generate", post(h::generate_portfolios))
        .route("/api/v1/session", get(h::get_session))
        .route("/api/v1/portfolios/export", get(h::export_portfolios))
        .route("/api/v1/portfolios/import", post(h::import_portfolios))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Final application: health check (never rate limited) merged with `api`,
/// then state, tracing, and CORS.
pub fn app(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(h::health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
