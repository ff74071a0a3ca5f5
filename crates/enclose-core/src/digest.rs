//! SHA-1 content hashing for naming extraction directories
//!
//! The digest is only a stable naming key for an archive's contents; it is
//! not used for any integrity or security decision.

use crate::hex_codec::encode_hex;
use crate::{Error, Result};
use sha1::{Digest, Sha1};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Default read size when streaming a file through the digest
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

const MIN_CHUNK_SIZE: usize = 1024;
const MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Lowercase hexadecimal rendering of a digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DigestHex(String);

impl DigestHex {
    /// Length in characters of a rendered SHA-1 digest
    pub const SHA1_LEN: usize = 40;

    fn from_digest(bytes: &[u8]) -> Self {
        Self(encode_hex(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DigestHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DigestHex {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Streams files through SHA-1 in fixed-size chunks
#[derive(Debug, Clone, Copy)]
pub struct FileHasher {
    chunk_size: usize,
}

impl Default for FileHasher {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl FileHasher {
    /// Create a hasher reading `chunk_size` bytes at a time (clamped to 1 KiB..=1 MiB)
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hash the contents of the file at `path`
    ///
    /// Fails with [`Error::Io`] when the file cannot be opened or read.
    pub fn hash_file<P: AsRef<Path>>(&self, path: P) -> Result<DigestHex> {
        let path = path.as_ref();
        debug!("sha1({})", path.display());

        let mut file = File::open(path).map_err(|e| {
            Error::Io(io::Error::new(
                e.kind(),
                format!("cannot open {} for hashing: {}", path.display(), e),
            ))
        })?;

        self.hash_reader(&mut file)
    }

    /// Hash everything readable from `reader`
    pub fn hash_reader<R: Read>(&self, reader: &mut R) -> Result<DigestHex> {
        let mut hasher = Sha1::new();
        let mut buf = vec![0u8; self.chunk_size];

        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => hasher.update(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }

        Ok(DigestHex::from_digest(&hasher.finalize()))
    }
}

/// Hash a file with the default chunk size
pub fn hash_file<P: AsRef<Path>>(path: P) -> Result<DigestHex> {
    FileHasher::default().hash_file(path)
}

/// Hash an in-memory buffer
pub fn hash_bytes(bytes: &[u8]) -> DigestHex {
    DigestHex::from_digest(&Sha1::digest(bytes))
}

/// Hash the UTF-8 bytes of a string
pub fn hash_str(s: &str) -> DigestHex {
    hash_bytes(s.as_bytes())
}
