//! enclose - content-addressed archive extraction
//!
//! This library extracts archives into directories named after the SHA-1
//! digest of the archive bytes (or into a caller-chosen directory) and
//! reports the outcome as a [`Status`]: an exit code, an optional message,
//! the absolute output directory and the non-fatal warnings collected on
//! the way.
//!
//! ```no_run
//! use enclose_core::{ExtractRequest, Pipeline};
//!
//! let pipeline = Pipeline::new("/var/lib/unpacked");
//! let status = pipeline.extract_one(&ExtractRequest::new("/tmp/upload.tar.gz").enclosed(true));
//! if status.is_success() {
//!     println!("extracted into {}", status.output_dir().unwrap().display());
//! }
//! for warning in status.warnings() {
//!     eprintln!("warning: {}", warning);
//! }
//! ```

pub mod archive;
pub mod config;
pub mod digest;
pub mod error;
pub mod extraction;
pub mod filename;
pub mod hex_codec;
pub mod pipeline;
pub mod status;

pub use error::{Error, Result};

// Re-export commonly used types
pub use archive::{ArchiveExtractor, ArchiveFormat, Compression, Extractor};
pub use digest::{hash_file, DigestHex, FileHasher};
pub use extraction::Extraction;
pub use filename::ParsedFilename;
pub use pipeline::{ExtractRequest, ExtractStatus, Pipeline};
pub use status::{Status, Warning, WarningList};
