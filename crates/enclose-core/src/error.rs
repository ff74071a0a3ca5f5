//! Error types for enclose-core

use thiserror::Error;

/// Core error types for the enclose library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file or directory path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Text that should have been hexadecimal was not
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Unsupported archive format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),

    /// ZIP-specific error
    #[error("Zip error: {0}")]
    Zip(String),

    /// Extraction finished with a failure status
    #[error("Extraction failed with status {code}: {message}")]
    Extraction { code: i32, message: String },
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Zip(err.to_string())
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::InvalidHex(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
