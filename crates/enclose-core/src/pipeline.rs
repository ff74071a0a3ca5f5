//! The extraction pipeline
//!
//! [`Pipeline::extract_one`] resolves naming, optionally creates a directory
//! named after the archive's SHA-1 digest, hands the archive to an
//! [`Extractor`] and reports where the output landed.
//!
//! The pipeline never changes the process working directory. It carries its
//! own working directory value, starting at the base directory, and resolves
//! every path against it, so independent extractions can run concurrently.

use crate::archive::{ArchiveExtractor, Extractor};
use crate::config::Config;
use crate::digest::FileHasher;
use crate::filename::{extension_of, ParsedFilename};
use crate::record_warning;
use crate::status::{codes, Status, WarningList};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Status of one extraction, carrying the absolute output directory
pub type ExtractStatus = Status<PathBuf>;

impl ExtractStatus {
    /// Absolute directory the archive was extracted into
    pub fn output_dir(&self) -> Option<&Path> {
        self.payload().map(PathBuf::as_path)
    }
}

/// What to extract and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    /// Archive to extract, relative paths resolve against the base directory
    pub source: PathBuf,
    /// Output name for single-file formats
    pub name: Option<String>,
    /// Directory to place output in, relative paths resolve against the base directory
    pub destination: Option<PathBuf>,
    /// Nest output in a directory named after the archive digest
    pub enclosed: bool,
}

impl ExtractRequest {
    pub fn new<P: Into<PathBuf>>(source: P) -> Self {
        Self {
            source: source.into(),
            name: None,
            destination: None,
            enclosed: false,
        }
    }

    pub fn named<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn into_dir<P: Into<PathBuf>>(mut self, destination: P) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn enclosed(mut self, enclosed: bool) -> Self {
        self.enclosed = enclosed;
        self
    }
}

/// Coordinates hashing, directory placement and extraction
pub struct Pipeline {
    base_dir: PathBuf,
    hasher: FileHasher,
    extractor: Box<dyn Extractor>,
}

impl Pipeline {
    /// Pipeline rooted at `base_dir` using the default archive extractor
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
            hasher: FileHasher::default(),
            extractor: Box::new(ArchiveExtractor::new()),
        }
    }

    pub fn from_config<P: Into<PathBuf>>(config: &Config, base_dir: P) -> Self {
        Self::new(base_dir).with_hasher(config.hasher())
    }

    pub fn with_extractor<E: Extractor + 'static>(mut self, extractor: E) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_hasher(mut self, hasher: FileHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn hasher(&self) -> &FileHasher {
        &self.hasher
    }

    /// Extract one archive.
    ///
    /// Always returns a status whose payload is the absolute directory the
    /// output went to (or would have gone to). Problems placing the output
    /// are logged, recorded as warnings and do not fail the extraction.
    pub fn extract_one(&self, request: &ExtractRequest) -> ExtractStatus {
        let source = self.base_dir.join(&request.source);
        let mut placement = WarningList::new();

        if request.name.is_none() {
            log_derived_name(&source);
        }

        let mut workdir = self.base_dir.clone();

        if let Some(destination) = &request.destination {
            let candidate = workdir.join(destination);
            match fs::metadata(&candidate) {
                Ok(meta) if meta.is_dir() => workdir = candidate,
                Ok(_) => {
                    error!("cannot enter {}: not a directory", candidate.display());
                    record_warning!(
                        placement,
                        "cannot enter {}: not a directory",
                        candidate.display()
                    );
                }
                Err(e) => {
                    error!("cannot enter {}: {}", candidate.display(), e);
                    record_warning!(placement, "cannot enter {}: {}", candidate.display(), e);
                }
            }
        }

        if request.enclosed {
            let digest = match self.hasher.hash_file(&source) {
                Ok(digest) => digest,
                Err(e) => {
                    error!("cannot hash {}: {}", source.display(), e);
                    let message = format!("cannot hash {}: {}", source.display(), e);
                    return Status::<()>::failure(codes::OPEN_ERROR, &message, placement)
                        .with_payload(absolute_dir(&workdir));
                }
            };

            let enclosing = workdir.join(digest.as_str());
            match create_enclosing_dir(&enclosing) {
                Ok(()) => workdir = enclosing,
                Err(e) => {
                    error!("cannot create {}: {}", enclosing.display(), e);
                    record_warning!(placement, "cannot create {}: {}", enclosing.display(), e);
                }
            }
        }

        debug!(
            source = %source.display(),
            workdir = %workdir.display(),
            "delegating extraction"
        );
        let mut status = self
            .extractor
            .extract(&source, request.name.as_deref(), &workdir);

        status.prepend_warnings(placement);
        let output_dir = absolute_dir(&workdir);
        if status.is_success() {
            info!("extracted {} into {}", source.display(), output_dir.display());
        }
        status.with_payload(output_dir)
    }
}

// Diagnostic only: report the name an archive would be known by
fn log_derived_name(source: &Path) {
    let parsed = ParsedFilename::parse(&source.to_string_lossy());
    let Some(basename) = parsed.basename() else {
        return;
    };

    // Parse the basename on its own so its extension is looked at in isolation
    let base = ParsedFilename::parse(&format!("./{}", basename));
    if extension_of(&base) != Some(".tar") {
        info!(
            source = parsed.name(),
            derived = base.stem().unwrap_or(basename),
            "derived archive name from {}",
            basename
        );
    }
}

/// Create a `rwxr-xr-x` directory, tolerating one that already exists
fn create_enclosing_dir(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }

    match builder.create(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

fn absolute_dir(dir: &Path) -> PathBuf {
    fs::canonicalize(dir).unwrap_or_else(|_| {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(dir))
                .unwrap_or_else(|_| dir.to_path_buf())
        }
    })
}
