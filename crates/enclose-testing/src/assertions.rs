//! Common assertions for enclose testing

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Relative paths of all regular files below `dir`, sorted
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.path().strip_prefix(dir)?.to_path_buf());
        }
    }
    Ok(files)
}

/// Asserts that `dir` holds exactly `entries`, with matching contents
pub fn assert_extracted(dir: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    let mut expected: Vec<PathBuf> = entries.iter().map(|(name, _)| PathBuf::from(name)).collect();
    expected.sort();
    let actual = collect_files(dir)?;

    if actual != expected {
        bail!("files differ in {:?}: expected {:?}, found {:?}", dir, expected, actual);
    }

    for (name, data) in entries {
        let content = std::fs::read(dir.join(name))?;
        if content != *data {
            bail!("content mismatch for {}", name);
        }
    }

    Ok(())
}

/// Asserts that `name` looks like a rendered SHA-1 digest
pub fn assert_digest_name(name: &str) {
    assert_eq!(name.len(), 40, "digest {:?} should be 40 characters", name);
    assert!(
        name.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)),
        "digest {:?} should be lowercase hex",
        name
    );
}
