//! Page-image ZIP packaging for multi-page conversions.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;

/// Entry name for the 1-based `page` inside the archive.
pub fn page_entry_name(page: usize) -> String {
    format!("{page}.jpg")
}

/// Write `pages` into a new ZIP at `dest` as `1.jpg`, `2.jpg`, … in slice order.
///
/// Blocking; call from `spawn_blocking`. A missing page file aborts the
/// whole archive.
pub fn write_page_archive(pages: &[PathBuf], dest: &Path) -> Result<()> {
    let file = File::create(dest)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (index, page) in pages.iter().enumerate() {
        let mut source = File::open(page)?;
        writer.start_file(page_entry_name(index + 1), options)?;
        io::copy(&mut source, &mut writer)?;
    }

    writer.finish()?;
    debug!(dest = %dest.display(), entries = pages.len(), "page archive written");
    Ok(())
}
