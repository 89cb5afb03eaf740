//! Page extraction endpoint.

use std::sync::Arc;

use axum::Router;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::Response;
use axum::routing::post;
use tracing::debug;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::routes::download;
use crate::routes::upload::UploadForm;
use crate::schemas::documents::{ErrorResponse, ExtractForm};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(extract_pages), components(schemas(ExtractForm, ErrorResponse)))]
pub struct ExtractApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/extract", post(extract_pages))
}

/// Keep only the requested pages of a PDF (`POST /api/extract`).
///
/// `pages` is handed to Ghostscript's `-sPageList` as-is; an expression it
/// cannot parse fails the request with Ghostscript's diagnostic.
#[utoipa::path(
    post,
    path = "/api/extract",
    tag = "documents",
    request_body(content = ExtractForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Extracted pages as application/pdf"),
        (status = 400, description = "Missing file or pages", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 500, description = "Extraction failed", body = ErrorResponse),
    )
)]
pub async fn extract_pages(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    let mut form = UploadForm::read(multipart, state.config.max_upload_size_bytes()).await?;

    let pages = form
        .text("pages")
        .filter(|p| !p.trim().is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ServerError::BadRequest("pages is required".into()))?;
    let file = form
        .take_file("file")
        .ok_or_else(|| ServerError::BadRequest("no file uploaded".into()))?;
    debug!(file_name = %file.file_name, pages = %pages, "extract request");

    let result = state
        .pdf
        .extract_pages(&file, &pages)
        .await
        .map_err(ServerError::processing("extraction"))?;

    download::attachment(result).await
}

#[cfg(test)]
mod test {
    use axum::http::{StatusCode, header};
    use pagesmith_core::testing::FakeTool;

    use crate::routes::test_support::{Part, TestApp};

    #[tokio::test]
    async fn returns_pdf_with_requested_pages() {
        let app = TestApp::new(FakeTool::new());
        let resp = app
            .post_multipart(
                "/api/extract",
                &[Part::text("pages", "1,3-5"), Part::file("file", "a.pdf", b"doc")],
            )
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(&TestApp::body(resp).await[..], b"doc[1,3-5]");
        assert_eq!(app.scratch_entries(), 0);
    }

    #[tokio::test]
    async fn invalid_page_range_surfaces_tool_error_without_leaks() {
        let app = TestApp::new(FakeTool::new());
        let resp = app
            .post_multipart(
                "/api/extract",
                &[
                    Part::file("file", "a.pdf", b"doc"),
                    Part::text("pages", FakeTool::INVALID_PAGES),
                ],
            )
            .await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = TestApp::json(resp).await;
        let msg = body["error"].as_str().unwrap();
        assert!(msg.starts_with("extraction failed:"), "{msg}");
        assert!(msg.contains("invalid page list"), "{msg}");
        assert_eq!(app.scratch_entries(), 0);
    }

    #[tokio::test]
    async fn missing_pages_is_400() {
        let app = TestApp::new(FakeTool::new());
        let resp = app
            .post_multipart("/api/extract", &[Part::file("file", "a.pdf", b"doc")])
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(TestApp::json(resp).await["error"], "pages is required");
    }

    #[tokio::test]
    async fn blank_pages_is_400() {
        let app = TestApp::new(FakeTool::new());
        let resp = app
            .post_multipart(
                "/api/extract",
                &[Part::file("file", "a.pdf", b"doc"), Part::text("pages", "  ")],
            )
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_file_is_400() {
        let app = TestApp::new(FakeTool::new());
        let resp = app
            .post_multipart("/api/extract", &[Part::text("pages", "1")])
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(TestApp::json(resp).await["error"], "no file uploaded");
    }
}
