//! Archive format detection

use crate::filename::split_ext;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

// The tar "ustar" magic sits at offset 257 of the first header block
const TAR_MAGIC_OFFSET: usize = 257;
const TAR_MAGIC: &[u8] = b"ustar";
const HEADER_PROBE_LEN: u64 = 512;

/// Compression layer wrapping an archive or a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Lzma,
    Zstd,
    Brotli,
}

impl Compression {
    /// Wrap `reader` in the matching decoder
    pub fn decoder<'a, R: Read + 'a>(self, reader: R) -> io::Result<Box<dyn Read + 'a>> {
        match self {
            Compression::None => Ok(Box::new(reader)),
            Compression::Gzip => Ok(Box::new(flate2::read::MultiGzDecoder::new(reader))),
            Compression::Bzip2 => Ok(Box::new(bzip2::read::BzDecoder::new(reader))),
            Compression::Xz => Ok(Box::new(xz2::read::XzDecoder::new(reader))),
            Compression::Lzma => {
                let stream = xz2::stream::Stream::new_lzma_decoder(u64::MAX)
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
                Ok(Box::new(xz2::read::XzDecoder::new_stream(reader, stream)))
            }
            Compression::Zstd => Ok(Box::new(zstd::stream::read::Decoder::new(reader)?)),
            Compression::Brotli => Ok(Box::new(brotli::Decompressor::new(reader, 4096))),
        }
    }

    /// Compression implied by a filename extension such as `.gz` or `.tgz`
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            ".gz" | ".tgz" => Some(Compression::Gzip),
            ".bz2" | ".tbz" | ".tbz2" => Some(Compression::Bzip2),
            ".xz" | ".txz" => Some(Compression::Xz),
            ".lzma" | ".tlz" => Some(Compression::Lzma),
            ".zst" | ".tzst" => Some(Compression::Zstd),
            ".br" => Some(Compression::Brotli),
            _ => None,
        }
    }

    fn from_magic(head: &[u8]) -> Option<Self> {
        match head {
            [0x1f, 0x8b, ..] => Some(Compression::Gzip),
            [b'B', b'Z', b'h', ..] => Some(Compression::Bzip2),
            [0xfd, b'7', b'z', b'X', b'Z', 0x00, ..] => Some(Compression::Xz),
            [0x28, 0xb5, 0x2f, 0xfd, ..] => Some(Compression::Zstd),
            _ => None,
        }
    }

    /// Conventional suffix, without the leading dot
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Gzip => Some("gz"),
            Compression::Bzip2 => Some("bz2"),
            Compression::Xz => Some("xz"),
            Compression::Lzma => Some("lzma"),
            Compression::Zstd => Some("zst"),
            Compression::Brotli => Some("br"),
        }
    }
}

/// Container layout of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// A tar stream, possibly compressed
    Tar(Compression),
    /// A zip container (also jar, whl, apk)
    Zip,
    /// One compressed file with no container around it
    Compressed(Compression),
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Tar(compression) => match compression.suffix() {
                Some(suffix) => write!(f, "tar.{}", suffix),
                None => f.write_str("tar"),
            },
            ArchiveFormat::Zip => f.write_str("zip"),
            ArchiveFormat::Compressed(compression) => {
                f.write_str(compression.suffix().unwrap_or("raw"))
            }
        }
    }
}

fn is_tar_header(head: &[u8]) -> bool {
    head.len() >= TAR_MAGIC_OFFSET + TAR_MAGIC.len()
        && &head[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len()] == TAR_MAGIC
}

fn read_head<R: Read>(reader: R) -> io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(HEADER_PROBE_LEN as usize);
    reader.take(HEADER_PROBE_LEN).read_to_end(&mut head)?;
    Ok(head)
}

// Decompress the first block to see whether a tar stream is inside
fn wraps_tar(source: &Path, compression: Compression) -> bool {
    File::open(source)
        .and_then(|file| compression.decoder(file))
        .and_then(read_head)
        .map(|head| is_tar_header(&head))
        .unwrap_or(false)
}

struct NameHint {
    compression: Option<Compression>,
    tar: bool,
}

fn name_hint(source: &Path) -> NameHint {
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (_, full_ext, ext) = split_ext(&file_name);

    NameHint {
        compression: Compression::from_extension(ext),
        tar: full_ext.starts_with(".tar")
            || matches!(ext, ".tgz" | ".tbz" | ".tbz2" | ".txz" | ".tlz" | ".tzst"),
    }
}

/// Work out how `source` should be unpacked
///
/// Leading magic bytes decide first. Compressed streams are peeked into to
/// tell a compressed tar from a single compressed file. Formats without a
/// reliable magic number (lzma, brotli, pre-POSIX tar) fall back to the
/// filename. Returns `Ok(None)` for anything unrecognized and an error only
/// when the file cannot be read.
pub fn detect_format(source: &Path) -> io::Result<Option<ArchiveFormat>> {
    let head = read_head(File::open(source)?)?;

    if head.starts_with(b"PK\x03\x04") || head.starts_with(b"PK\x05\x06") {
        return Ok(Some(ArchiveFormat::Zip));
    }
    if is_tar_header(&head) {
        return Ok(Some(ArchiveFormat::Tar(Compression::None)));
    }

    let hint = name_hint(source);
    let Some(compression) = Compression::from_magic(&head).or(hint.compression) else {
        return Ok(hint.tar.then_some(ArchiveFormat::Tar(Compression::None)));
    };

    if hint.tar || wraps_tar(source, compression) {
        Ok(Some(ArchiveFormat::Tar(compression)))
    } else {
        Ok(Some(ArchiveFormat::Compressed(compression)))
    }
}
