//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a `{"error": "..."}` JSON body with an appropriate status code.
//!
//! Processing failures carry the tool's diagnostic to the caller; unclassified
//! internal errors are logged in full and answered with a generic message.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pagesmith_core::ProcessError;
use thiserror::Error;
use tracing::{error, warn};

use crate::schemas::documents::ErrorResponse;

/// All errors that can occur in the pagesmith-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent an invalid or incomplete request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An uploaded file pushed the request over the configured size limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// The multipart body could not be read.
    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),

    /// Staging, the external tool, or packaging failed.
    #[error("{operation} failed: {source}")]
    Processing {
        operation: &'static str,
        #[source]
        source: ProcessError,
    },

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn processing(operation: &'static str) -> impl FnOnce(ProcessError) -> Self {
        move |source| ServerError::Processing { operation, source }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::PayloadTooLarge(m) => (StatusCode::PAYLOAD_TOO_LARGE, m.clone()),
            ServerError::Multipart(e) => {
                warn!(error = %e, "rejected multipart body");
                (e.status(), e.body_text())
            }

            ServerError::Processing { operation, source } => {
                if source.is_tool_failure() {
                    warn!(operation, error = %source, "document processing failed");
                } else {
                    error!(operation, error = %source, "document processing failed");
                }
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(ErrorResponse { error: client_message })).into_response()
    }
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        ServerError::Internal(e.to_string())
    }
}
