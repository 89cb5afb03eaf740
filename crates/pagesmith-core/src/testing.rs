//! In-process [`DocumentTool`] for tests.
//!
//! Outputs are small text files derived from the inputs so tests can check
//! ordering and pass-through without Ghostscript installed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{ProcessError, Result};
use crate::tool::DocumentTool;

/// Scriptable fake document tool.
///
/// * `render_first_page` writes `jpeg:<input>`
/// * `render_pages` writes `page <n>` for each rendered page
/// * `extract_pages` writes `<input>[<pages>]`
/// * `merge` writes the concatenation of the inputs
#[derive(Debug, Clone)]
pub struct FakeTool {
    pages: u32,
    rendered: Option<u32>,
    fail_page_count: bool,
    fail_render: bool,
    fail_all: bool,
}

impl FakeTool {
    /// Page-range expression that `extract_pages` rejects like gs would.
    pub const INVALID_PAGES: &'static str = "not-a-range";

    pub fn new() -> Self {
        Self {
            pages: 1,
            rendered: None,
            fail_page_count: false,
            fail_render: false,
            fail_all: false,
        }
    }

    /// Report `pages` from `page_count`.
    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages = pages;
        self
    }

    /// Only produce the first `count` page images in `render_pages`.
    pub fn rendering(mut self, count: u32) -> Self {
        self.rendered = Some(count);
        self
    }

    pub fn failing_page_count(mut self) -> Self {
        self.fail_page_count = true;
        self
    }

    /// `render_pages` writes its page images and then reports failure.
    pub fn failing_render(mut self) -> Self {
        self.fail_render = true;
        self
    }

    /// Every operation fails, as if the binary were missing.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail_all {
            return Err(failure("fake tool unavailable"));
        }
        Ok(())
    }
}

impl Default for FakeTool {
    fn default() -> Self {
        Self::new()
    }
}

fn failure(diagnostic: &str) -> ProcessError {
    ProcessError::ToolFailed {
        program: "fake-gs".to_owned(),
        status: "exit status: 1".to_owned(),
        diagnostic: diagnostic.to_owned(),
    }
}

#[async_trait]
impl DocumentTool for FakeTool {
    async fn render_first_page(&self, input: &Path, output: &Path) -> Result<()> {
        self.check()?;
        let mut body = b"jpeg:".to_vec();
        body.extend(tokio::fs::read(input).await?);
        tokio::fs::write(output, body).await?;
        Ok(())
    }

    async fn page_count(&self, _input: &Path) -> Result<u32> {
        self.check()?;
        if self.fail_page_count {
            return Err(failure("failed to count pages"));
        }
        Ok(self.pages)
    }

    async fn render_pages(&self, _input: &Path, pattern: &Path) -> Result<()> {
        self.check()?;
        let pattern = pattern.to_string_lossy();
        for page in 1..=self.rendered.unwrap_or(self.pages) {
            let path = pattern.replace("%d", &page.to_string());
            tokio::fs::write(path, format!("page {page}")).await?;
        }
        if self.fail_render {
            return Err(failure("rendering aborted"));
        }
        Ok(())
    }

    async fn extract_pages(&self, input: &Path, output: &Path, pages: &str) -> Result<()> {
        self.check()?;
        if pages == Self::INVALID_PAGES {
            return Err(failure("invalid page list"));
        }
        let mut body = tokio::fs::read(input).await?;
        body.extend(format!("[{pages}]").into_bytes());
        tokio::fs::write(output, body).await?;
        Ok(())
    }

    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        self.check()?;
        if inputs.is_empty() {
            return Err(ProcessError::NoInputs);
        }
        let mut body = Vec::new();
        for input in inputs {
            body.extend(tokio::fs::read(input).await?);
        }
        tokio::fs::write(output, body).await?;
        Ok(())
    }
}
