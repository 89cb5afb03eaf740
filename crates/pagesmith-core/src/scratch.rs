//! Scratch-directory path allocation and scoped cleanup.
//!
//! Every staged upload, intermediate page image and result document lives in
//! a [`ScratchFile`]. The guard wraps a [`TempPath`], which removes the file
//! when it is dropped, so cleanup happens on success and error paths alike.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{debug, warn};
use uuid::Uuid;

/// Root directory under which all temporary files are allocated.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Create the directory (and any missing parents) and return a handle to it.
    ///
    /// Called once at startup; allocation afterwards never touches the disk.
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "scratch directory ready");
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Reserve a fresh, collision-free path `<root>/<uuid>[.<ext>]`.
    ///
    /// The file itself is not created; the caller writes to it (or lets the
    /// external tool do so).
    pub fn allocate(&self, extension: Option<&str>) -> ScratchFile {
        let mut name = Uuid::new_v4().to_string();
        if let Some(ext) = extension {
            name.push('.');
            name.push_str(ext);
        }
        ScratchFile::new(self.root.join(name))
    }

    /// Reserve `<root>/<stem of base><suffix>`, e.g. a per-page output next to
    /// the staged input it was rendered from.
    pub fn allocate_sibling(&self, base: &ScratchFile, suffix: &str) -> ScratchFile {
        ScratchFile::new(self.root.join(format!("{}{suffix}", base.stem())))
    }
}

/// A path in the scratch directory that is deleted when the guard drops.
#[derive(Debug)]
pub struct ScratchFile {
    path: TempPath,
}

impl ScratchFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path: TempPath::from_path(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directory, e.g. `3f1c….zip`.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Lower-cased extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Write `data` to the guarded path, replacing any previous content.
    pub async fn write(&self, data: &[u8]) -> io::Result<()> {
        tokio::fs::write(&self.path, data).await
    }

    /// Remove the file now, logging a failure instead of ignoring it as a
    /// plain drop does. A file that was never created is not an error.
    pub fn close(self) {
        let path_str = self.path.display().to_string();
        match self.path.close() {
            Ok(()) => debug!(path = %path_str, "removed scratch file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path_str, error = %e, "failed to remove scratch file"),
        }
    }
}

impl AsRef<Path> for ScratchFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}
