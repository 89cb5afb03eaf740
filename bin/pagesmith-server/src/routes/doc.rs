use utoipa::OpenApi;

use crate::routes::{convert, extract, health, merge};

#[derive(OpenApi)]
#[openapi(info(
    title = "pagesmith-server",
    description = "Rasterize, extract and merge PDF documents via Ghostscript",
    version = "0.1.0"
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(convert::ConvertApi::openapi());
    root.merge(extract::ExtractApi::openapi());
    root.merge(merge::MergeApi::openapi());
    root
}
