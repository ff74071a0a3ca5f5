//! Fallible, builder-style front end to the pipeline
//!
//! [`Extraction`] validates its inputs up front and turns failure statuses
//! into [`Error`]s, for callers that only care where the output went.

use crate::filename::split_ext;
use crate::pipeline::{ExtractRequest, Pipeline};
use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One archive scheduled for extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    source: PathBuf,
    filename: String,
    target: Option<PathBuf>,
    enclosed: bool,
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn create_dir_0755(path: &Path, recursive: bool) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(recursive);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }

    match builder.create(path) {
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        other => other,
    }
}

impl Extraction {
    /// Prepare extraction of `source`.
    ///
    /// `filename` is the name the archive is known by (an upload's original
    /// name, say) and defaults to `source`. It decides which output name
    /// single-file formats get.
    pub fn new<P: AsRef<Path>>(source: P, filename: Option<&str>) -> Result<Self> {
        let source = source.as_ref();
        if !source.exists() {
            return Err(Error::NotFound(format!("source archive {}", source.display())));
        }

        let filename = filename
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| source.to_string_lossy().into_owned());

        Ok(Self {
            source: absolute(source)?,
            filename,
            target: None,
            enclosed: false,
        })
    }

    /// Prepare extraction of `source` into `target`, creating `target` if needed
    pub fn new_at<P: AsRef<Path>, Q: AsRef<Path>>(
        source: P,
        filename: Option<&str>,
        target: Q,
    ) -> Result<Self> {
        let mut extraction = Self::new(source, filename)?;
        let target = target.as_ref();

        create_dir_0755(target, false).map_err(|e| {
            Error::Io(io::Error::new(
                e.kind(),
                format!("cannot create {}: {}", target.display(), e),
            ))
        })?;

        extraction.target = Some(absolute(target)?);
        Ok(extraction)
    }

    /// Nest the output in a directory named after the source's SHA-1
    ///
    /// Calling this more than once has no further effect. The directory is
    /// created below the target, or below the pipeline's base directory when
    /// there is no target.
    pub fn enclose(&mut self, pipeline: &Pipeline) -> Result<()> {
        if self.enclosed {
            return Ok(());
        }

        let digest = pipeline.hasher().hash_file(&self.source)?;
        let parent = self
            .target
            .clone()
            .unwrap_or_else(|| pipeline.base_dir().to_path_buf());
        let target = parent.join(digest.as_str());

        create_dir_0755(&target, true)?;
        self.target = Some(target);
        self.enclosed = true;
        Ok(())
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn is_enclosed(&self) -> bool {
        self.enclosed
    }

    /// Output name handed to the extractor
    ///
    /// Tar compounds and cpio-style formats name their own entries; for
    /// everything else the name is the filename with its extension removed.
    pub fn output_name(&self) -> Option<String> {
        let (stem, full_ext, ext) = split_ext(&self.filename);
        if full_ext != ext || ext.as_bytes().get(1) == Some(&b'c') {
            return None;
        }

        Path::new(stem)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Run the extraction, returning the output directory
    pub fn run(&self, pipeline: &Pipeline) -> Result<PathBuf> {
        debug!(extraction = ?self, "extracting");

        let mut request = ExtractRequest::new(&self.source);
        if let Some(target) = &self.target {
            request = request.into_dir(target);
        }
        if let Some(name) = self.output_name() {
            request = request.named(name);
        }

        let status = pipeline.extract_one(&request).into_result()?;
        let output_dir = status
            .output_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| pipeline.base_dir().to_path_buf());

        debug!(target = %output_dir.display(), "extracted");
        Ok(output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enclose_testing::fixtures;
    use tempfile::TempDir;

    #[test]
    fn test_new_requires_existing_source() {
        let temp_dir = TempDir::new().unwrap();
        let result = Extraction::new(temp_dir.path().join("missing.zip"), None);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_filename_defaults_to_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("notes.txt.gz");
        fixtures::write_gz(&source, b"x").unwrap();

        let extraction = Extraction::new(&source, None).unwrap();
        assert_eq!(extraction.output_name().as_deref(), Some("notes.txt"));

        let renamed = Extraction::new(&source, Some("upload.tar.gz")).unwrap();
        assert_eq!(renamed.output_name(), None);

        let cpio = Extraction::new(&source, Some("initrd.cpio")).unwrap();
        assert_eq!(cpio.output_name(), None);
    }

    #[test]
    fn test_new_at_creates_target() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.tar");
        fixtures::write_tar(&source, &[("a.txt", b"a")]).unwrap();
        let target = temp_dir.path().join("target");

        let extraction = Extraction::new_at(&source, None, &target).unwrap();
        assert!(target.is_dir());
        assert_eq!(extraction.target(), Some(target.as_path()));

        // an existing target is fine
        assert!(Extraction::new_at(&source, None, &target).is_ok());
    }

    #[test]
    fn test_enclose_and_run() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("site.tar.gz");
        fixtures::write_tar_gz(&source, &[("index.html", b"<html></html>")]).unwrap();
        let digest = fixtures::sha1_hex(&fs::read(&source).unwrap());
        let target = temp_dir.path().join("out");
        let pipeline = Pipeline::new(temp_dir.path());

        let mut extraction = Extraction::new_at(&source, None, &target).unwrap();
        extraction.enclose(&pipeline).unwrap();
        extraction.enclose(&pipeline).unwrap();
        assert!(extraction.is_enclosed());
        assert_eq!(extraction.target(), Some(target.join(&digest).as_path()));

        let output = extraction.run(&pipeline).unwrap();
        assert_eq!(output, fs::canonicalize(target.join(&digest)).unwrap());
        assert!(output.join("index.html").exists());
    }

    #[test]
    fn test_run_failure_is_extraction_error() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("plain.txt");
        fs::write(&source, "not an archive").unwrap();
        let pipeline = Pipeline::new(temp_dir.path());

        let result = Extraction::new(&source, None).unwrap().run(&pipeline);
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }
}
