//! Archive fixtures for enclose testing

use anyhow::{ensure, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tar::{Builder, EntryType, Header};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Files used by most end-to-end tests
pub const SAMPLE_ENTRIES: &[(&str, &[u8])] = &[
    ("README.md", b"# Sample\n"),
    ("src/main.rs", b"fn main() {}\n"),
    ("src/lib/util.rs", b"pub fn util() {}\n"),
];

fn append_entries<W: Write>(builder: &mut Builder<W>, entries: &[(&str, &[u8])]) -> Result<()> {
    for (name, data) in entries {
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_700_000_000);
        builder
            .append_data(&mut header, name, *data)
            .with_context(|| format!("appending {}", name))?;
    }
    Ok(())
}

/// Write an uncompressed tar archive
pub fn write_tar(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    let mut builder = Builder::new(File::create(path)?);
    append_entries(&mut builder, entries)?;
    builder.finish()?;
    Ok(())
}

/// Write a gzip-compressed tar archive
pub fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    let encoder = GzEncoder::new(File::create(path)?, Compression::default());
    let mut builder = Builder::new(encoder);
    append_entries(&mut builder, entries)?;
    builder.into_inner()?.finish()?;
    Ok(())
}

/// Write a tar archive without validating entry paths
///
/// Lets tests produce hostile archives containing `..` components, which
/// the regular tar builder refuses to write.
pub fn write_tar_raw_paths(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    let mut builder = Builder::new(File::create(path)?);
    for (name, data) in entries {
        let bytes = name.as_bytes();
        ensure!(bytes.len() < 100, "entry name too long: {}", name);

        let mut header = Header::new_gnu();
        {
            let gnu = header
                .as_gnu_mut()
                .context("gnu header expected")?;
            gnu.name[..bytes.len()].copy_from_slice(bytes);
        }
        header.set_entry_type(EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, *data)?;
    }
    builder.finish()?;
    Ok(())
}

/// Write a zip archive, entry names taken verbatim
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    let options: FileOptions<()> = FileOptions::default();

    for (name, data) in entries {
        zip.start_file(*name, options)?;
        zip.write_all(data)?;
    }
    zip.finish()?;
    Ok(())
}

/// Write a single gzip-compressed file
pub fn write_gz(path: &Path, data: &[u8]) -> Result<()> {
    let mut encoder = GzEncoder::new(File::create(path)?, Compression::default());
    encoder.write_all(data)?;
    encoder.finish()?;
    Ok(())
}

/// Lowercase hex SHA-1 of `data`, computed independently of enclose-core
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}
