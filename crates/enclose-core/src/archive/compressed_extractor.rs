//! Decompression of single compressed files (`notes.txt.gz` and friends)

use super::extractor::Extractor;
use super::format::Compression;
use crate::filename::split_ext;
use crate::record_warning;
use crate::status::{codes, Status, WarningList};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path};
use tracing::{info, warn};

const FALLBACK_NAME: &str = "decompressed";
const CLASH_SUFFIX: &str = ".out";

/// Writes the decompressed contents of a single-stream file into the destination
#[derive(Debug, Clone, Copy)]
pub struct CompressedFileExtractor {
    compression: Compression,
}

impl CompressedFileExtractor {
    pub fn new(compression: Compression) -> Self {
        Self { compression }
    }
}

// Output name defaults to the source filename minus its compression suffix
fn default_output_name(source: &Path) -> String {
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, _, _) = split_ext(&file_name);
    if stem.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        stem.to_string()
    }
}

// True when both paths resolve to the same existing file
fn is_same_file(source: &Path, output: &Path) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(output)) {
        (Ok(source), Ok(output)) => source == output,
        _ => false,
    }
}

// Only a single normal path component may be used as the output name
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl Extractor for CompressedFileExtractor {
    fn extract(&self, source: &Path, name: Option<&str>, destination: &Path) -> Status {
        let mut warnings = WarningList::new();

        let output_name = match name {
            Some(name) if is_plain_file_name(name) => name.to_string(),
            Some(name) => {
                let fallback = default_output_name(source);
                warn!(
                    requested = name,
                    fallback = %fallback,
                    "output name is not a plain file name"
                );
                record_warning!(
                    warnings,
                    "output name {:?} is not a plain file name, using {:?}",
                    name,
                    fallback
                );
                fallback
            }
            None => default_output_name(source),
        };

        let opened = File::open(source).and_then(|file| self.compression.decoder(file));
        let mut reader = match opened {
            Ok(reader) => reader,
            Err(e) => {
                return Status::failure(
                    codes::OPEN_ERROR,
                    &format!("cannot open {}: {}", source.display(), e),
                    warnings,
                );
            }
        };

        let mut output_path = destination.join(&output_name);
        if is_same_file(source, &output_path) {
            let renamed = format!("{}{}", output_name, CLASH_SUFFIX);
            warn!(
                source = %source.display(),
                renamed = %renamed,
                "output would overwrite the source"
            );
            record_warning!(
                warnings,
                "output {:?} would overwrite the source, using {:?}",
                output_name,
                renamed
            );
            output_path = destination.join(renamed);
        }

        let mut output = match File::create(&output_path) {
            Ok(file) => file,
            Err(e) => {
                return Status::failure(
                    codes::WRITE_ERROR,
                    &format!("cannot create {}: {}", output_path.display(), e),
                    warnings,
                );
            }
        };

        match io::copy(&mut reader, &mut output) {
            Ok(bytes) => {
                info!(
                    bytes,
                    "decompressed {} into {}",
                    source.display(),
                    output_path.display()
                );
                Status::success(warnings)
            }
            Err(e) => {
                drop(output);
                if let Err(remove_err) = fs::remove_file(&output_path) {
                    record_warning!(
                        warnings,
                        "cannot remove partial output {}: {}",
                        output_path.display(),
                        remove_err
                    );
                }
                Status::failure(
                    codes::COPY_ERROR,
                    &format!("cannot decompress {}: {}", source.display(), e),
                    warnings,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enclose_testing::fixtures;
    use tempfile::TempDir;

    #[test]
    fn test_decompress_to_stem() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("notes.txt.gz");
        fixtures::write_gz(&source, b"remember the milk").unwrap();

        let extractor = CompressedFileExtractor::new(Compression::Gzip);
        let status = extractor.extract(&source, None, temp_dir.path());

        assert!(status.is_success(), "{:?}", status);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("notes.txt")).unwrap(),
            "remember the milk"
        );
    }

    #[test]
    fn test_decompress_to_given_name() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("upload-3f2a");
        fixtures::write_gz(&source, b"payload").unwrap();
        let output = temp_dir.path().join("out");
        fs::create_dir_all(&output).unwrap();

        let extractor = CompressedFileExtractor::new(Compression::Gzip);
        let status = extractor.extract(&source, Some("data.bin"), &output);

        assert!(status.is_success());
        assert_eq!(fs::read(output.join("data.bin")).unwrap(), b"payload");
    }

    #[test]
    fn test_unsafe_name_falls_back_with_warning() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("report.csv.gz");
        fixtures::write_gz(&source, b"a,b").unwrap();
        let output = temp_dir.path().join("out");
        fs::create_dir_all(&output).unwrap();

        let extractor = CompressedFileExtractor::new(Compression::Gzip);
        let status = extractor.extract(&source, Some("../report.csv"), &output);

        assert!(status.is_success());
        assert_eq!(status.warnings().len(), 1);
        assert!(output.join("report.csv").exists());
        assert!(!temp_dir.path().join("report.csv").exists());
    }

    #[test]
    fn test_corrupt_stream_is_copy_error() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("bad.gz");
        fs::write(&source, [0x1f, 0x8b, 0x08, 0x00, 0xde, 0xad]).unwrap();

        let extractor = CompressedFileExtractor::new(Compression::Gzip);
        let status = extractor.extract(&source, None, temp_dir.path());

        assert_eq!(status.code(), codes::COPY_ERROR);
        assert!(!temp_dir.path().join("bad").exists());
    }

    #[test]
    fn test_source_is_never_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("payload");
        fixtures::write_gz(&source, b"important data").unwrap();
        let original = fs::read(&source).unwrap();
        let extractor = CompressedFileExtractor::new(Compression::Gzip);

        let status = extractor.extract(&source, None, temp_dir.path());
        assert!(status.is_success(), "{:?}", status);
        assert_eq!(status.warnings().len(), 1);
        assert_eq!(fs::read(&source).unwrap(), original);
        assert_eq!(
            fs::read(temp_dir.path().join("payload.out")).unwrap(),
            b"important data"
        );

        let status = extractor.extract(&source, Some("payload"), temp_dir.path());
        assert!(status.is_success());
        assert_eq!(fs::read(&source).unwrap(), original);
    }

    #[test]
    fn test_corrupt_source_survives_failed_decompression() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("broken");
        let bytes = [0x1f, 0x8b, 0x08, 0x00, 0xde, 0xad];
        fs::write(&source, bytes).unwrap();

        let extractor = CompressedFileExtractor::new(Compression::Gzip);
        let status = extractor.extract(&source, None, temp_dir.path());

        assert_eq!(status.code(), codes::COPY_ERROR);
        assert_eq!(fs::read(&source).unwrap(), bytes);
        assert!(!temp_dir.path().join("broken.out").exists());
    }

    #[test]
    fn test_default_output_name() {
        assert_eq!(default_output_name(Path::new("/x/y/log.1.xz")), "log.1");
        assert_eq!(default_output_name(Path::new("/x/.gz")), "decompressed");
    }
}
