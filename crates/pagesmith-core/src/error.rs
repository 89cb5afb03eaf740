use std::time::Duration;

use thiserror::Error;

/// Errors that can be returned while staging, processing or packaging a document.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A filesystem I/O error occurred while staging or reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The external tool could not be started at all (missing binary, permissions, ...).
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool ran but exited unsuccessfully.
    #[error("{program} exited with {status}: {diagnostic}")]
    ToolFailed {
        program: String,
        status: String,
        diagnostic: String,
    },

    /// The external tool did not finish within the configured timeout.
    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    /// The page-count query printed something that is not a number.
    #[error("invalid page count output: {0:?}")]
    InvalidPageCount(String),

    /// The document reports zero pages, so there is nothing to rasterize.
    #[error("document has no pages")]
    EmptyDocument,

    /// The renderer produced a different number of page images than the
    /// document reported.
    #[error("expected {expected} page images, found {rendered}")]
    PageCountMismatch { expected: u32, rendered: usize },

    /// A merge was requested without any input documents.
    #[error("no input documents")]
    NoInputs,

    /// Failed to write the page archive.
    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A blocking worker panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ProcessError {
    /// `true` when the failure originated from the external tool itself
    /// rather than from local I/O.
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            ProcessError::Spawn { .. }
                | ProcessError::ToolFailed { .. }
                | ProcessError::Timeout { .. }
                | ProcessError::InvalidPageCount(_)
                | ProcessError::PageCountMismatch { .. }
        )
    }
}

pub type Result<T, E = ProcessError> = std::result::Result<T, E>;
