//! Multipart form reading shared by the document endpoints.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartRejection;
use bytes::BytesMut;
use pagesmith_core::UploadedFile;
use tracing::debug;

use crate::error::ServerError;

/// All parts of a multipart request, split into uploaded files and plain
/// text fields. Parts that carry a `filename` are treated as files.
#[derive(Debug, Default)]
pub struct UploadForm {
    files: HashMap<String, Vec<UploadedFile>>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain `multipart`, buffering files up to `max_bytes` in total.
    pub async fn read(
        multipart: Result<Multipart, MultipartRejection>,
        max_bytes: usize,
    ) -> Result<Self, ServerError> {
        let mut multipart = multipart.map_err(|e| {
            ServerError::BadRequest(format!("invalid multipart request: {}", e.body_text()))
        })?;

        let mut form = UploadForm::default();
        let mut total = 0usize;

        while let Some(mut field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            let Some(file_name) = field.file_name().map(str::to_owned) else {
                let value = field.text().await?;
                form.fields.insert(name, value);
                continue;
            };
            let content_type = field.content_type().map(str::to_owned);

            // Stream the file data with size validation
            let mut data = BytesMut::new();
            while let Some(chunk) = field.chunk().await? {
                total += chunk.len();
                if total > max_bytes {
                    return Err(ServerError::PayloadTooLarge(format!(
                        "upload exceeds the maximum of {} MB",
                        max_bytes / (1024 * 1024)
                    )));
                }
                data.extend_from_slice(&chunk);
            }

            debug!(
                field = %name,
                file_name = %file_name,
                content_type = content_type.as_deref().unwrap_or("unknown"),
                size_bytes = data.len(),
                "received file upload"
            );

            let mut upload = UploadedFile::new(file_name, data.freeze());
            if let Some(content_type) = content_type {
                upload = upload.with_content_type(content_type);
            }
            form.files.entry(name).or_default().push(upload);
        }

        Ok(form)
    }

    /// First file uploaded under `name`.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        let mut files = self.take_files(name);
        if files.is_empty() {
            None
        } else {
            Some(files.swap_remove(0))
        }
    }

    /// Every file uploaded under `name`, in the order they were sent.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        self.files.remove(name).unwrap_or_default()
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Optional boolean field; absent or empty means `false`.
    pub fn flag(&self, name: &str) -> Result<bool, ServerError> {
        match self.text(name) {
            None => Ok(false),
            Some(raw) => parse_form_bool(raw).ok_or_else(|| {
                ServerError::BadRequest(format!("invalid value for {name}: {raw:?}"))
            }),
        }
    }
}

/// Same vocabulary as Go's `strconv.ParseBool`, plus empty meaning false.
pub fn parse_form_bool(raw: &str) -> Option<bool> {
    match raw {
        "" => Some(false),
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
