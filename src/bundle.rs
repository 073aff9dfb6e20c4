//! In-memory zip bundles of store files.

use crate::naming;
use crate::store::StoreEntry;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Download name offered for the bundle.
pub const BUNDLE_FILENAME: &str = "enhanced_images.zip";

/// Pack every non-archive entry into a deflated zip, flat, by name.
pub fn bundle_entries(entries: &[StoreEntry]) -> Result<Vec<u8>, BundleError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buf);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for entry in entries.iter().filter(|e| !naming::is_archive(&e.name)) {
            let data = std::fs::read(&entry.path)?;
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(&data)?;
        }

        zip.finish()?;
    }
    Ok(buf.into_inner())
}
