//! Archive extraction backend
//!
//! The pipeline hands a source file, an optional output name and a
//! destination directory to an [`Extractor`] and gets a [`Status`] back.
//! [`ArchiveExtractor`] is the default implementation: it sniffs the format
//! from the file's leading bytes (falling back to the filename for formats
//! without a magic number) and dispatches to the tar, zip or single-file
//! decompressors.

pub mod compressed_extractor;
pub mod extractor;
pub mod format;
pub mod tar_extractor;
pub mod zip_extractor;

pub use compressed_extractor::CompressedFileExtractor;
pub use extractor::Extractor;
pub use format::{detect_format, ArchiveFormat, Compression};
pub use tar_extractor::TarExtractor;
pub use zip_extractor::ZipExtractor;

use crate::status::{codes, Status, WarningList};
use std::fs;
use std::path::Path;
use tracing::{debug, error};

/// Create the extractor responsible for `format`
pub fn create_extractor(format: ArchiveFormat) -> Box<dyn Extractor> {
    match format {
        ArchiveFormat::Tar(compression) => Box::new(TarExtractor::with_compression(compression)),
        ArchiveFormat::Zip => Box::new(ZipExtractor::new()),
        ArchiveFormat::Compressed(compression) => {
            Box::new(CompressedFileExtractor::new(compression))
        }
    }
}

/// Extractor that detects the archive format and delegates to the matching backend
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for ArchiveExtractor {
    fn extract(&self, source: &Path, name: Option<&str>, destination: &Path) -> Status {
        let format = match detect_format(source) {
            Ok(Some(format)) => format,
            Ok(None) => {
                return Status::failure(
                    codes::FAILED,
                    &format!("unsupported archive format: {}", source.display()),
                    WarningList::new(),
                );
            }
            Err(e) => {
                return Status::failure(
                    codes::OPEN_ERROR,
                    &format!("cannot open {}: {}", source.display(), e),
                    WarningList::new(),
                );
            }
        };
        debug!(source = %source.display(), %format, "detected archive format");

        if let Err(e) = fs::create_dir_all(destination) {
            error!(destination = %destination.display(), "cannot create destination: {}", e);
            return Status::failure(
                codes::WRITE_ERROR,
                &format!("cannot create {}: {}", destination.display(), e),
                WarningList::new(),
            );
        }

        create_extractor(format).extract(source, name, destination)
    }
}
