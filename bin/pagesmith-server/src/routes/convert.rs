//! Rasterization endpoint.

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
use crate::schemas::documents::{ConvertForm, ErrorResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(convert), components(schemas(ConvertForm, ErrorResponse)))]
pub struct ConvertApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/convert", post(convert))
}

/// Rasterize an uploaded document (`POST /api/convert`).
///
/// Without `multiple` (or with `multiple=false`) only the first page is
/// rendered and returned as a JPEG. With `multiple=true` every page is
/// rendered and the images are returned as a ZIP named `1.jpg … N.jpg`.
#[utoipa::path(
    post,
    path = "/api/convert",
    tag = "documents",
    request_body(content = ConvertForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "First page as image/jpeg, or all pages as application/zip"),
        (status = 400, description = "Missing file or invalid `multiple` value", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 500, description = "Rasterization failed", body = ErrorResponse),
    )
)]
pub async fn convert(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    let mut form = UploadForm::read(multipart, state.config.max_upload_size_bytes()).await?;

    let multiple = form.flag("multiple")?;
    let file = form
        .take_file("file")
        .ok_or_else(|| ServerError::BadRequest("no file uploaded".into()))?;
    debug!(file_name = %file.file_name, multiple, "convert request");

    let result = state
        .pdf
        .convert(&file, multiple)
        .await
        .map_err(ServerError::processing("conversion"))?;

    download::attachment(result).await
}

#[cfg(test)]
mod test {
    use std::io::Read;

    use axum::http::{StatusCode, header};
    use pagesmith_core::testing::FakeTool;
    use tracing_test::traced_test;

    use crate::routes::test_support::{Part, TestApp};

    #[tokio::test]
    async fn single_page_returns_jpeg_and_cleans_up() {
        let app = TestApp::new(FakeTool::new());
        let resp = app
            .post_multipart("/api/convert", &[Part::file("file", "a.pdf", b"doc")])
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/jpeg");
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\""), "{disposition}");
        assert!(disposition.ends_with(".jpg\""), "{disposition}");

        let body = TestApp::body(resp).await;
        assert_eq!(&body[..], b"jpeg:doc");
        assert_eq!(app.scratch_entries(), 0);
    }

    #[tokio::test]
    async fn multiple_returns_zip_with_one_entry_per_page() {
        let app = TestApp::new(FakeTool::new().with_pages(3));
        let resp = app
            .post_multipart(
                "/api/convert",
                &[Part::file("file", "a.pdf", b"doc"), Part::text("multiple", "true")],
            )
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/zip");

        let body = TestApp::body(resp).await;
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(body.to_vec())).unwrap();
        assert_eq!(archive.len(), 3);
        for i in 0..3 {
            let mut entry = archive.by_index(i).unwrap();
            assert_eq!(entry.name(), format!("{}.jpg", i + 1));
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            assert_eq!(content, format!("page {}", i + 1));
        }
        assert_eq!(app.scratch_entries(), 0);
    }

    #[tokio::test]
    async fn multiple_false_is_single_page() {
        let app = TestApp::new(FakeTool::new().with_pages(3));
        let resp = app
            .post_multipart(
                "/api/convert",
                &[Part::file("file", "a.pdf", b"doc"), Part::text("multiple", "0")],
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/jpeg");
    }

    #[tokio::test]
    async fn missing_file_is_400() {
        let app = TestApp::new(FakeTool::new());
        let resp = app
            .post_multipart("/api/convert", &[Part::text("multiple", "true")])
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(TestApp::json(resp).await["error"], "no file uploaded");
    }

    #[tokio::test]
    async fn invalid_multiple_is_400() {
        let app = TestApp::new(FakeTool::new());
        let resp = app
            .post_multipart(
                "/api/convert",
                &[Part::file("file", "a.pdf", b"doc"), Part::text("multiple", "maybe")],
            )
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = TestApp::json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("multiple"));
    }

    #[tokio::test]
    #[traced_test]
    async fn tool_failure_is_500_without_leaks() {
        let app = TestApp::new(FakeTool::failing());
        let resp = app
            .post_multipart("/api/convert", &[Part::file("file", "a.pdf", b"doc")])
            .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = TestApp::json(resp).await;
        let msg = body["error"].as_str().unwrap();
        assert!(msg.starts_with("conversion failed:"), "{msg}");
        assert_eq!(app.scratch_entries(), 0);
        assert!(logs_contain("document processing failed"));
    }

    #[tokio::test]
    async fn non_multipart_body_is_400() {
        let app = TestApp::new(FakeTool::new());
        let resp = app.post_json("/api/convert", "{}").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = TestApp::json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("invalid multipart request"));
    }
}
