//! Extractor trait for archive operations

use crate::status::Status;
use std::path::Path;

/// Unpacks one archive into a directory
///
/// Implementations report every outcome through the returned [`Status`]:
/// format errors become failure codes, per-entry problems become warnings.
/// The status payload is left empty; the pipeline fills in the output
/// directory.
pub trait Extractor: Send + Sync {
    /// Extract `source` into `destination`.
    ///
    /// `name` is the output filename to use for formats that produce a single
    /// file (e.g. a gzip-compressed binary). Container formats ignore it.
    fn extract(&self, source: &Path, name: Option<&str>, destination: &Path) -> Status;
}

impl<F> Extractor for F
where
    F: Fn(&Path, Option<&str>, &Path) -> Status + Send + Sync,
{
    fn extract(&self, source: &Path, name: Option<&str>, destination: &Path) -> Status {
        self(source, name, destination)
    }
}
