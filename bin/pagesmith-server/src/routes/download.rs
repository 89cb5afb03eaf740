//! Streaming a result file back to the client as an attachment.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header;
use axum::response::Response;
use bytes::Bytes;
use futures::Stream;
use pagesmith_core::ScratchFile;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::ServerError;

/// File body that owns its [`ScratchFile`]; the file is deleted once the
/// body is fully sent or dropped by a disconnecting client.
struct AttachmentStream {
    inner: ReaderStream<File>,
    _result: ScratchFile,
}

impl Stream for AttachmentStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Build a `200` response streaming `result`, with `Content-Type` derived from
/// its extension and `Content-Disposition: attachment`.
pub async fn attachment(result: ScratchFile) -> Result<Response, ServerError> {
    let file = File::open(result.path()).await?;
    let len = file.metadata().await?.len();
    let content_type = mime_guess::from_path(result.path()).first_or_octet_stream();
    let disposition = format!("attachment; filename=\"{}\"", result.file_name());

    debug!(
        file = %result.file_name(),
        content_type = %content_type,
        size_bytes = len,
        "streaming result"
    );

    let body = Body::from_stream(AttachmentStream {
        inner: ReaderStream::new(file),
        _result: result,
    });

    Response::builder()
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, len)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(body)
        .map_err(|e| ServerError::Internal(format!("failed to build response: {e}")))
}
