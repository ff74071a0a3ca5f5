//! Tar extractor implementation

use super::extractor::Extractor;
use super::format::Compression;
use crate::status::{codes, Status, WarningList};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tar::Archive;
use tracing::{debug, info, warn};

/// Tar extractor
#[derive(Debug, Clone, Copy)]
pub struct TarExtractor {
    compression: Compression,
}

impl Default for TarExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TarExtractor {
    /// Create a new tar extractor
    pub fn new() -> Self {
        Self {
            compression: Compression::None,
        }
    }

    /// Create a tar extractor with compression
    pub fn with_compression(compression: Compression) -> Self {
        Self { compression }
    }

    /// Unpack every entry of `reader` below `destination`
    ///
    /// Entries that would land outside `destination` or fail to unpack are
    /// skipped and reported as warnings. An unreadable header ends the
    /// extraction with [`codes::NEXT_ERROR`].
    pub fn unpack<R: Read>(&self, reader: R, destination: &Path) -> Status {
        let mut warnings = WarningList::new();
        let mut archive = Archive::new(reader);
        archive.set_preserve_permissions(true);
        archive.set_overwrite(true);

        let entries = match archive.entries() {
            Ok(entries) => entries,
            Err(e) => {
                return Status::failure(
                    codes::NEXT_ERROR,
                    &format!("cannot read tar stream: {}", e),
                    warnings,
                );
            }
        };

        let mut unpacked = 0usize;
        for entry in entries {
            let mut entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    return Status::failure(
                        codes::NEXT_ERROR,
                        &format!("cannot read entry header: {}", e),
                        warnings,
                    );
                }
            };

            let entry_path = entry
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| String::from("<invalid path>"));

            match entry.unpack_in(destination) {
                Ok(true) => {
                    debug!(entry = %entry_path, "unpacked");
                    unpacked += 1;
                }
                Ok(false) => {
                    warn!(entry = %entry_path, "entry escapes the destination, skipped");
                    warnings.push(
                        0,
                        Some(&entry_path),
                        Some("entry escapes the destination directory, skipped"),
                    );
                }
                Err(e) => {
                    warn!(entry = %entry_path, "cannot unpack entry: {}", e);
                    let message = format!("cannot unpack entry: {}", e);
                    warnings.push(0, Some(&entry_path), Some(&message));
                }
            }
        }

        info!(
            entries = unpacked,
            warnings = warnings.len(),
            "unpacked tar into {}",
            destination.display()
        );
        Status::success(warnings)
    }
}

impl Extractor for TarExtractor {
    fn extract(&self, source: &Path, _name: Option<&str>, destination: &Path) -> Status {
        let reader = match File::open(source).and_then(|file| self.compression.decoder(file)) {
            Ok(reader) => reader,
            Err(e) => {
                return Status::failure(
                    codes::OPEN_ERROR,
                    &format!("cannot open {}: {}", source.display(), e),
                    WarningList::new(),
                );
            }
        };

        self.unpack(reader, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enclose_testing::fixtures;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unpack_tar_gz() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("src.tar.gz");
        let entries: &[(&str, &[u8])] = &[
            ("pkg/lib.rs", b"fn main() {}"),
            ("pkg/README", b"readme"),
        ];
        fixtures::write_tar_gz(&archive, entries).unwrap();
        let output = temp_dir.path().join("out");
        fs::create_dir_all(&output).unwrap();

        let extractor = TarExtractor::with_compression(Compression::Gzip);
        let status = extractor.extract(&archive, None, &output);

        assert!(status.is_success(), "{:?}", status);
        assert!(status.warnings().is_empty());
        assert_eq!(fs::read_to_string(output.join("pkg/lib.rs")).unwrap(), "fn main() {}");
    }

    #[test]
    fn test_traversal_entry_is_skipped_with_warning() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("evil.tar");
        let entries: &[(&str, &[u8])] = &[("../escape.txt", b"nope"), ("ok.txt", b"fine")];
        fixtures::write_tar_raw_paths(&archive, entries).unwrap();
        let output = temp_dir.path().join("out");
        fs::create_dir_all(&output).unwrap();

        let status = TarExtractor::new().extract(&archive, None, &output);

        assert!(status.is_success());
        assert!(!temp_dir.path().join("escape.txt").exists());
        assert!(output.join("ok.txt").exists());
        assert_eq!(status.warnings().len(), 1);
        let warning = status.warnings().iter().next().unwrap();
        assert_eq!(warning.file.as_deref(), Some("../escape.txt"));
    }

    #[test]
    fn test_corrupt_stream_is_next_error() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("broken.tar");
        fs::write(&archive, vec![0x41u8; 1024]).unwrap();
        let output = temp_dir.path().join("out");
        fs::create_dir_all(&output).unwrap();

        let status = TarExtractor::new().extract(&archive, None, &output);

        assert_eq!(status.code(), codes::NEXT_ERROR);
        assert!(status.message().is_some());
    }
}
