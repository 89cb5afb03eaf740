//! Per-operation orchestration: stage uploads, invoke the tool, package the result.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use crate::archive;
use crate::error::{ProcessError, Result};
use crate::scratch::{ScratchDir, ScratchFile};
use crate::tool::DocumentTool;

/// A file received from a client, scoped to one request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name supplied by the client (informational only, never used as a path).
    pub file_name: String,
    /// Content type declared by the client.
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Document operations exposed over HTTP.
///
/// Every method returns a [`ScratchFile`] owning the result; staged inputs
/// and intermediate files are removed before the method returns.
#[derive(Clone)]
pub struct PdfService {
    scratch: ScratchDir,
    tool: Arc<dyn DocumentTool>,
}

impl std::fmt::Debug for PdfService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfService")
            .field("scratch", &self.scratch)
            .finish_non_exhaustive()
    }
}

impl PdfService {
    pub fn new(scratch: ScratchDir, tool: Arc<dyn DocumentTool>) -> Self {
        Self { scratch, tool }
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Rasterize `upload`: the first page as a JPEG, or every page as a ZIP of JPEGs.
    pub async fn convert(&self, upload: &UploadedFile, multiple: bool) -> Result<ScratchFile> {
        if multiple {
            self.convert_all_pages(upload).await
        } else {
            self.convert_single_page(upload).await
        }
    }

    pub async fn convert_single_page(&self, upload: &UploadedFile) -> Result<ScratchFile> {
        let input = self.stage(upload).await?;
        let output = self.scratch.allocate(Some("jpg"));

        self.tool
            .render_first_page(input.path(), output.path())
            .await?;
        input.close();

        info!(source = %upload.file_name, result = %output.file_name(), "first page rasterized");
        Ok(output)
    }

    pub async fn convert_all_pages(&self, upload: &UploadedFile) -> Result<ScratchFile> {
        let input = self.stage(upload).await?;

        let pages = self.tool.page_count(input.path()).await?;
        if pages == 0 {
            return Err(ProcessError::EmptyDocument);
        }

        let pattern = self.scratch.allocate_sibling(&input, "_page_%d.jpg");
        let rendered = self.tool.render_pages(input.path(), pattern.path()).await;

        // Guard whatever the tool wrote, even when it failed part-way.
        let page_files = self.collect_pages(&input).await?;
        rendered?;
        input.close();

        let found = page_files.len();
        if found != pages as usize {
            return Err(ProcessError::PageCountMismatch {
                expected: pages,
                rendered: found,
            });
        }
        debug!(pages, "pages rasterized");

        let archive = self.scratch.allocate(Some("zip"));
        let sources: Vec<PathBuf> = page_files.iter().map(|f| f.path().to_path_buf()).collect();
        let dest = archive.path().to_path_buf();
        tokio::task::spawn_blocking(move || archive::write_page_archive(&sources, &dest)).await??;
        page_files.into_iter().for_each(ScratchFile::close);

        info!(
            source = %upload.file_name,
            pages,
            result = %archive.file_name(),
            "all pages rasterized and archived"
        );
        Ok(archive)
    }

    /// Take guards for `<stem>_page_1.jpg`, `<stem>_page_2.jpg`, … up to the
    /// first page file that does not exist.
    async fn collect_pages(&self, input: &ScratchFile) -> Result<Vec<ScratchFile>> {
        let mut page_files = Vec::new();
        loop {
            let page = self
                .scratch
                .allocate_sibling(input, &format!("_page_{}.jpg", page_files.len() + 1));
            if !tokio::fs::try_exists(page.path()).await? {
                return Ok(page_files);
            }
            page_files.push(page);
        }
    }

    /// Keep only the pages of `upload` matched by the tool's page-range expression.
    pub async fn extract_pages(&self, upload: &UploadedFile, pages: &str) -> Result<ScratchFile> {
        let input = self.stage(upload).await?;
        let output = self.scratch.allocate(Some("pdf"));

        self.tool
            .extract_pages(input.path(), output.path(), pages)
            .await?;
        input.close();

        info!(source = %upload.file_name, pages, result = %output.file_name(), "pages extracted");
        Ok(output)
    }

    /// Concatenate `uploads` in the order given.
    pub async fn merge(&self, uploads: &[UploadedFile]) -> Result<ScratchFile> {
        if uploads.is_empty() {
            return Err(ProcessError::NoInputs);
        }

        let mut staged = Vec::with_capacity(uploads.len());
        for upload in uploads {
            staged.push(self.stage(upload).await?);
        }
        let inputs: Vec<PathBuf> = staged.iter().map(|f| f.path().to_path_buf()).collect();
        let output = self.scratch.allocate(Some("pdf"));

        self.tool.merge(&inputs, output.path()).await?;
        staged.into_iter().for_each(ScratchFile::close);

        info!(documents = uploads.len(), result = %output.file_name(), "documents merged");
        Ok(output)
    }

    async fn stage(&self, upload: &UploadedFile) -> Result<ScratchFile> {
        let staged = self.scratch.allocate(None);
        staged.write(&upload.data).await?;
        debug!(
            source = %upload.file_name,
            content_type = upload.content_type.as_deref().unwrap_or("unknown"),
            size_bytes = upload.size(),
            path = %staged.path().display(),
            "upload staged"
        );
        Ok(staged)
    }
}
