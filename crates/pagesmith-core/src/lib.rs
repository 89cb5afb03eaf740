//! pagesmith-core: staging, Ghostscript invocation and packaging behind the
//! pagesmith HTTP endpoints.
//!
//! The crate never touches PDF content itself. [`PdfService`] stages uploads
//! into a [`ScratchDir`], hands paths to a [`DocumentTool`] and returns the
//! result as a [`ScratchFile`] that deletes itself once dropped.

pub mod archive;
pub mod error;
pub mod scratch;
pub mod service;
pub mod tool;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::ProcessError;
pub use scratch::{ScratchDir, ScratchFile};
pub use service::{PdfService, UploadedFile};
pub use tool::{DocumentTool, Ghostscript, GhostscriptOptions};
