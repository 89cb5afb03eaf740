//! Document merge endpoint.

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
use crate::schemas::documents::{ErrorResponse, MergeForm};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(merge), components(schemas(MergeForm, ErrorResponse)))]
pub struct MergeApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/merge", post(merge))
}

/// Concatenate uploaded documents into one PDF (`POST /api/merge`).
///
/// Pages appear in the order the `files` parts were sent.
#[utoipa::path(
    post,
    path = "/api/merge",
    tag = "documents",
    request_body(content = MergeForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Merged document as application/pdf"),
        (status = 400, description = "No files uploaded", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 500, description = "Merge failed", body = ErrorResponse),
    )
)]
pub async fn merge(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    let mut form = UploadForm::read(multipart, state.config.max_upload_size_bytes()).await?;

    let files = form.take_files("files");
    if files.is_empty() {
        return Err(ServerError::BadRequest("no files uploaded".into()));
    }
    debug!(documents = files.len(), "merge request");

    let result = state
        .pdf
        .merge(&files)
        .await
        .map_err(ServerError::processing("merge"))?;

    download::attachment(result).await
}

#[cfg(test)]
mod test {
    use axum::http::{StatusCode, header};
    use pagesmith_core::testing::FakeTool;

    use crate::routes::test_support::{Part, TestApp};

    #[tokio::test]
    async fn merges_in_upload_order() {
        let app = TestApp::new(FakeTool::new());
        let resp = app
            .post_multipart(
                "/api/merge",
                &[
                    Part::file("files", "2.pdf", b"two;"),
                    Part::file("files", "1.pdf", b"one;"),
                    Part::file("files", "3.pdf", b"three;"),
                ],
            )
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(&TestApp::body(resp).await[..], b"two;one;three;");
        assert_eq!(app.scratch_entries(), 0);
    }

    #[tokio::test]
    async fn single_file_is_accepted() {
        let app = TestApp::new(FakeTool::new());
        let resp = app
            .post_multipart("/api/merge", &[Part::file("files", "a.pdf", b"only")])
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(&TestApp::body(resp).await[..], b"only");
    }

    #[tokio::test]
    async fn zero_files_is_400() {
        let app = TestApp::new(FakeTool::new());
        let resp = app
            .post_multipart("/api/merge", &[Part::text("note", "nothing attached")])
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(TestApp::json(resp).await["error"], "no files uploaded");
    }

    #[tokio::test]
    async fn files_under_other_field_names_are_ignored() {
        let app = TestApp::new(FakeTool::new());
        let resp = app
            .post_multipart("/api/merge", &[Part::file("file", "a.pdf", b"doc")])
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tool_failure_is_500() {
        let app = TestApp::new(FakeTool::failing());
        let resp = app
            .post_multipart(
                "/api/merge",
                &[Part::file("files", "a.pdf", b"a"), Part::file("files", "b.pdf", b"b")],
            )
            .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = TestApp::json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("merge failed:"));
        assert_eq!(app.scratch_entries(), 0);
    }
}
