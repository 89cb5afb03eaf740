//! Request and response shapes for the document endpoints.
//!
//! The form structs only describe the multipart bodies for the OpenAPI
//! document; handlers read the fields directly from the multipart stream.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// `POST /api/convert` multipart body.
#[derive(Debug, ToSchema)]
pub struct ConvertForm {
    /// PDF or image to rasterize.
    #[schema(value_type = String, format = Binary)]
    pub file: String,
    /// `true` to rasterize every page into a ZIP of JPEGs; defaults to `false`.
    pub multiple: Option<bool>,
}

/// `POST /api/extract` multipart body.
#[derive(Debug, ToSchema)]
pub struct ExtractForm {
    /// Source PDF.
    #[schema(value_type = String, format = Binary)]
    pub file: String,
    /// Ghostscript page list, e.g. `1,3-5` or `even`.
    pub pages: String,
}

/// `POST /api/merge` multipart body.
#[derive(Debug, ToSchema)]
pub struct MergeForm {
    /// Documents to concatenate, in order. Repeat the field once per file.
    #[schema(value_type = Vec<String>)]
    pub files: Vec<String>,
}
