//! Zip extractor implementation

use super::extractor::Extractor;
use crate::status::{codes, Status, WarningList};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Zip extractor
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ZipExtractor {
    /// Create a new zip extractor
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for ZipExtractor {
    fn extract(&self, source: &Path, _name: Option<&str>, destination: &Path) -> Status {
        let mut warnings = WarningList::new();

        let file = match File::open(source) {
            Ok(file) => file,
            Err(e) => {
                return Status::failure(
                    codes::OPEN_ERROR,
                    &format!("cannot open {}: {}", source.display(), e),
                    warnings,
                );
            }
        };

        let mut archive = match ZipArchive::new(file) {
            Ok(archive) => archive,
            Err(e) => {
                return Status::failure(
                    codes::NEXT_ERROR,
                    &format!("cannot read zip directory of {}: {}", source.display(), e),
                    warnings,
                );
            }
        };

        let mut unpacked = 0usize;
        for i in 0..archive.len() {
            let mut entry = match archive.by_index(i) {
                Ok(entry) => entry,
                Err(e) => {
                    return Status::failure(
                        codes::NEXT_ERROR,
                        &format!("cannot read zip entry {}: {}", i, e),
                        warnings,
                    );
                }
            };
            let entry_name = entry.name().to_string();

            let Some(relative) = entry.enclosed_name() else {
                warn!(entry = %entry_name, "entry escapes the destination, skipped");
                warnings.push(
                    0,
                    Some(&entry_name),
                    Some("entry escapes the destination directory, skipped"),
                );
                continue;
            };
            let full_path = destination.join(relative);

            if entry.is_dir() {
                if let Err(e) = fs::create_dir_all(&full_path) {
                    let message = format!("cannot create directory: {}", e);
                    warnings.push(0, Some(&entry_name), Some(&message));
                }
                continue;
            }

            if let Some(parent) = full_path.parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    let message = format!("cannot create parent directory: {}", e);
                    warnings.push(0, Some(&entry_name), Some(&message));
                    continue;
                }
            }

            let mut output_file = match File::create(&full_path) {
                Ok(file) => file,
                Err(e) => {
                    warn!(entry = %entry_name, "cannot create output file: {}", e);
                    let message = format!("cannot create output file: {}", e);
                    warnings.push(0, Some(&entry_name), Some(&message));
                    continue;
                }
            };

            if let Err(e) = io::copy(&mut entry, &mut output_file) {
                return Status::failure(
                    codes::COPY_ERROR,
                    &format!("cannot copy data of {}: {}", entry_name, e),
                    warnings,
                );
            }

            #[cfg(unix)]
            {
                if let Some(mode) = entry.unix_mode() {
                    use std::os::unix::fs::PermissionsExt;
                    let permissions = fs::Permissions::from_mode(mode & 0o7777);
                    if let Err(e) = fs::set_permissions(&full_path, permissions) {
                        let message = format!("cannot set permissions: {}", e);
                        warnings.push(0, Some(&entry_name), Some(&message));
                    }
                }
            }

            debug!(entry = %entry_name, "unpacked");
            unpacked += 1;
        }

        info!(
            entries = unpacked,
            warnings = warnings.len(),
            "unpacked zip into {}",
            destination.display()
        );
        Status::success(warnings)
    }
}
