//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use pagesmith_core::PdfService;

use crate::config::Config;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Document operations backed by the external tool.
    pub pdf: Arc<PdfService>,
}
