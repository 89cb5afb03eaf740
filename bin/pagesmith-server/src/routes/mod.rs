//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, `OPTIONS` → 204, per-request trace-ID injection)
//! - Request body limit for uploads
//! - `/api/health`, `/api/convert`, `/api/extract`, `/api/merge`
//! - Optional OpenAPI document (disable with `PAGESMITH_ENABLE_DOCS=false`)

mod convert;
pub mod doc;
mod download;
mod extract;
mod health;
mod merge;
mod upload;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Json, Router, middleware};
use tower::ServiceBuilder;

use crate::middleware::{cors, trace};
use crate::state::AppState;

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut api_router = Router::new()
        .merge(health::router())
        .merge(convert::router())
        .merge(extract::router())
        .merge(merge::router());

    if state.config.enable_docs {
        api_router = api_router.route("/openapi.json", get(|| async { Json(doc::get_docs()) }));
    }

    Router::new()
        .nest("/api", api_router)
        .layer(DefaultBodyLimit::max(state.config.max_upload_size_bytes()))
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(state.clone())))
        .layer(middleware::from_fn(cors::options_no_content))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
