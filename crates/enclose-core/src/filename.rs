//! Filename parsing and archive-name classification
//!
//! [`ParsedFilename`] is advisory metadata: it is used for logging and for
//! picking output names, never to decide whether an extraction may proceed.
//! Parsing therefore never fails; anything it cannot make sense of simply
//! comes back as absent fields.

use crate::digest::hash_file;
use crate::Result;
use std::path::Path;

/// Suffixes that denote a compression layer (possibly wrapping a tar)
pub const COMPRESSION_SUFFIXES: &[&str] = &[".gz", ".bz2", ".xz", ".lzma", ".zst", ".br", ".zip"];

/// Every extension the extraction pipeline recognizes as an archive
pub const KNOWN_EXTENSIONS: &[&str] = &[
    ".ar", ".arj", ".cpio", ".dump", ".jar", ".7z", ".zip", ".pack", ".pack2000", ".tar", ".bz2",
    ".gz", ".lzma", ".snz", ".xz", ".z", ".tgz", ".rpm", ".gem", ".deb", ".whl", ".apk",
];

const TAR_SUFFIX: &str = ".tar";

#[cfg(windows)]
fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

#[cfg(not(windows))]
fn is_separator(c: char) -> bool {
    c == '/'
}

/// A path split into its final component and extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    name: String,
    basename: Option<String>,
    // Byte offset of the extension's leading '.' within `basename`
    ext_start: Option<usize>,
    tar: bool,
}

impl ParsedFilename {
    /// Parse `path`.
    ///
    /// The basename is everything after the last separator and is absent when
    /// the input has no separator at all. The extension starts at the last
    /// `.` of the basename, unless that dot is the first character (hidden
    /// files have no extension).
    pub fn parse(path: &str) -> Self {
        let mut parsed = Self {
            name: path.to_string(),
            basename: None,
            ext_start: None,
            tar: false,
        };

        let Some(sep) = path.rfind(is_separator) else {
            return parsed;
        };

        let basename = &path[sep + 1..];
        if basename.is_empty() {
            return parsed;
        }

        parsed.ext_start = basename.rfind('.').filter(|&idx| idx > 0);
        parsed.basename = Some(basename.to_string());
        parsed.tar = parsed.is_compressed_archive()
            && parsed
                .ext_start
                .map(|idx| {
                    let stem = &basename[..idx];
                    stem.len() > TAR_SUFFIX.len() && stem.ends_with(TAR_SUFFIX)
                })
                .unwrap_or(false);

        parsed
    }

    /// The original input
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn basename(&self) -> Option<&str> {
        self.basename.as_deref()
    }

    /// Final suffix of the basename including its dot, e.g. `.gz`
    pub fn extension(&self) -> Option<&str> {
        match (&self.basename, self.ext_start) {
            (Some(basename), Some(idx)) => Some(&basename[idx..]),
            _ => None,
        }
    }

    /// Whether a `.tar` component sits in front of a compression suffix
    pub fn is_tar(&self) -> bool {
        self.tar
    }

    /// Extension including a preceding `.tar`, e.g. `.tar.gz`
    pub fn full_extension(&self) -> Option<&str> {
        let basename = self.basename.as_deref()?;
        let idx = self.ext_start?;
        if self.tar {
            Some(&basename[idx - TAR_SUFFIX.len()..])
        } else {
            Some(&basename[idx..])
        }
    }

    /// Basename with the full extension removed
    pub fn stem(&self) -> Option<&str> {
        let basename = self.basename.as_deref()?;
        let ext_len = self.full_extension().map(str::len).unwrap_or(0);
        Some(&basename[..basename.len() - ext_len])
    }

    /// Whether the extension is a known compression or zip suffix
    pub fn is_compressed_archive(&self) -> bool {
        self.extension()
            .map(|ext| {
                COMPRESSION_SUFFIXES
                    .iter()
                    .any(|suffix| suffix.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// A single compressed file, such as `notes.txt.gz`, rather than a
    /// compressed tar or a zip container
    pub fn is_compressed_binary(&self) -> bool {
        self.is_compressed_archive()
            && !self.tar
            && !self
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(".zip"))
                .unwrap_or(false)
    }
}

/// Extension of a parsed filename, if any
pub fn extension_of(parsed: &ParsedFilename) -> Option<&str> {
    parsed.extension()
}

/// Whether a parsed filename names a single compressed file
pub fn is_compressed_binary(parsed: &ParsedFilename) -> bool {
    parsed.is_compressed_binary()
}

// Suffix from the last '.' of the final path element, leading dots included
fn raw_ext(s: &str) -> &str {
    for (idx, c) in s.char_indices().rev() {
        if is_separator(c) {
            break;
        }
        if c == '.' {
            return &s[idx..];
        }
    }
    ""
}

/// Split a path into `(stem, full extension, extension)`
///
/// A `.tar` in front of the last extension is folded into the full
/// extension: `dir/pkg.tar.gz` gives `("dir/pkg", ".tar.gz", ".gz")`.
pub fn split_ext(s: &str) -> (&str, String, &str) {
    let ext = raw_ext(s);
    let stem = &s[..s.len() - ext.len()];

    if raw_ext(stem) == TAR_SUFFIX {
        let stem = &stem[..stem.len() - TAR_SUFFIX.len()];
        (stem, format!("{}{}", TAR_SUFFIX, ext), ext)
    } else {
        (stem, ext.to_string(), ext)
    }
}

/// Whether the path ends in an extension from [`KNOWN_EXTENSIONS`]
pub fn recognize_extension(path: &str) -> bool {
    let (_, _, ext) = split_ext(path);
    KNOWN_EXTENSIONS.contains(&ext)
}

/// Score in `0.0..=1.0` for how likely `path` is an archive worth extracting
///
/// Known extensions score 1.0. Git pack files (`.pack`) lose half a point when
/// a sibling `.idx` exists and another half when they live in an `objects`
/// directory, since those belong to a repository rather than being archives.
pub fn extractability(path: &str) -> f64 {
    let (stem, _, ext) = split_ext(path);

    if ext == ".pack" {
        let mut score = 1.0;
        if Path::new(&format!("{}.idx", stem)).exists() {
            score -= 0.5;
        }
        let in_objects_dir = Path::new(path)
            .parent()
            .and_then(|parent| parent.file_name())
            .map(|name| name == "objects")
            .unwrap_or(false);
        if in_objects_dir {
            score -= 0.5;
        }
        return score;
    }

    if KNOWN_EXTENSIONS.contains(&ext) {
        1.0
    } else {
        0.0
    }
}

/// Score in `0.0..=1.0` for how likely extracting `path` is to fail on purpose
///
/// Paths without `test` in them score 0.0: they are ordinary archives. Test
/// fixtures are often deliberately broken, so a `test` component scores 1.0,
/// unless it only appears in front of the archive's own SHA-1 directory (the
/// location it was enclosed into rather than the archive's content), which
/// scores 0.5. With `enclosed` the file is hashed to find that directory.
pub fn failure_expectation(path: &str, enclosed: bool) -> Result<f64> {
    let digest = if enclosed {
        Some(hash_file(path)?)
    } else {
        None
    };
    Ok(score_failure_expectation(
        path,
        digest.as_ref().map(|d| d.as_str()),
    ))
}

fn score_failure_expectation(path: &str, digest: Option<&str>) -> f64 {
    let Some(test_idx) = path.rfind("test") else {
        return 0.0;
    };

    match digest.and_then(|digest| path.find(digest)) {
        Some(digest_idx) if test_idx < digest_idx => 0.5,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_compound_tar() {
        let parsed = ParsedFilename::parse("/a/b/archive.tar.gz");

        assert_eq!(parsed.name(), "/a/b/archive.tar.gz");
        assert_eq!(parsed.basename(), Some("archive.tar.gz"));
        assert_eq!(parsed.extension(), Some(".gz"));
        assert_eq!(parsed.full_extension(), Some(".tar.gz"));
        assert_eq!(parsed.stem(), Some("archive"));
        assert!(parsed.is_tar());
        assert!(parsed.is_compressed_archive());
        assert!(!parsed.is_compressed_binary());
    }

    #[test]
    fn test_parse_plain_tar() {
        let parsed = ParsedFilename::parse("./archive.tar");

        assert_eq!(parsed.extension(), Some(".tar"));
        assert_eq!(parsed.full_extension(), Some(".tar"));
        assert!(!parsed.is_tar());
        assert!(!parsed.is_compressed_archive());
    }

    #[test]
    fn test_parse_hidden_file_has_no_extension() {
        let parsed = ParsedFilename::parse("/a/b/.hidden");

        assert_eq!(parsed.basename(), Some(".hidden"));
        assert_eq!(parsed.extension(), None);
        assert_eq!(parsed.stem(), Some(".hidden"));
    }

    #[test]
    fn test_parse_without_separator() {
        let parsed = ParsedFilename::parse("noslash.tar.gz");

        assert_eq!(parsed.name(), "noslash.tar.gz");
        assert_eq!(parsed.basename(), None);
        assert_eq!(parsed.extension(), None);
        assert!(!parsed.is_tar());
    }

    #[test]
    fn test_parse_degenerate_inputs() {
        for input in ["", "/", "dir/"] {
            let parsed = ParsedFilename::parse(input);
            assert_eq!(parsed.name(), input);
            assert_eq!(parsed.basename(), None);
            assert_eq!(parsed.extension(), None);
        }
    }

    #[test]
    fn test_compressed_binary() {
        let parsed = ParsedFilename::parse("/logs/notes.txt.gz");
        assert!(parsed.is_compressed_binary());
        assert_eq!(parsed.stem(), Some("notes.txt"));
        assert!(is_compressed_binary(&parsed));
        assert_eq!(extension_of(&parsed), Some(".gz"));

        assert!(!ParsedFilename::parse("/x/bundle.zip").is_compressed_binary());
        assert!(ParsedFilename::parse("/x/bundle.ZIP").is_compressed_archive());
    }

    #[test]
    fn test_hidden_tar_is_not_compound() {
        let parsed = ParsedFilename::parse("/x/.tar.gz");
        assert_eq!(parsed.extension(), Some(".gz"));
        assert!(!parsed.is_tar());
    }

    #[test]
    fn test_split_ext() {
        assert_eq!(split_ext("dir/pkg.tar.gz"), ("dir/pkg", ".tar.gz".to_string(), ".gz"));
        assert_eq!(split_ext("dir/pkg.zip"), ("dir/pkg", ".zip".to_string(), ".zip"));
        assert_eq!(split_ext("dir.d/README"), ("dir.d/README", String::new(), ""));
        assert_eq!(split_ext("pkg.tar"), ("pkg", ".tar".to_string(), ".tar"));
    }

    #[test]
    fn test_recognize_extension() {
        assert!(recognize_extension("x/y.tar.xz"));
        assert!(recognize_extension("wheel-1.0.whl"));
        assert!(!recognize_extension("notes.txt"));
        assert!(!recognize_extension("Makefile"));
    }

    #[test]
    fn test_extractability_plain() {
        assert_eq!(extractability("/tmp/a.deb"), 1.0);
        assert_eq!(extractability("/tmp/a.rs"), 0.0);
    }

    #[test]
    fn test_extractability_git_pack() {
        let temp_dir = TempDir::new().unwrap();
        let objects = temp_dir.path().join("objects");
        fs::create_dir_all(&objects).unwrap();

        let loose = temp_dir.path().join("bundle.pack");
        fs::write(&loose, b"PACK").unwrap();
        assert_eq!(extractability(loose.to_str().unwrap()), 1.0);

        let packed = objects.join("pack-1234.pack");
        fs::write(&packed, b"PACK").unwrap();
        fs::write(objects.join("pack-1234.idx"), b"idx").unwrap();
        assert_eq!(extractability(packed.to_str().unwrap()), 0.0);
    }

    #[test]
    fn test_dot_z_is_known_but_not_decompressible() {
        let parsed = ParsedFilename::parse("/old/archive.z");
        assert!(!parsed.is_compressed_archive());
        assert!(!parsed.is_compressed_binary());
        assert!(recognize_extension("/old/archive.z"));
    }

    #[test]
    fn test_score_failure_expectation() {
        let digest = "a9993e364706816aba3e25717850c26c9cd0d89d";

        assert_eq!(score_failure_expectation("/srv/pkg/lib.tar", None), 0.0);
        assert_eq!(score_failure_expectation("/srv/pkg/test/bad.tar", None), 1.0);

        let before = format!("/srv/tests/{}/pkg/lib.tar", digest);
        assert_eq!(score_failure_expectation(&before, Some(digest)), 0.5);

        let after = format!("/srv/{}/pkg/testdata/bad.tar", digest);
        assert_eq!(score_failure_expectation(&after, Some(digest)), 1.0);

        let elsewhere = "/srv/tests/pkg/lib.tar";
        assert_eq!(score_failure_expectation(elsewhere, Some(digest)), 1.0);
    }

    #[test]
    fn test_failure_expectation_hashes_enclosed_files() {
        let temp_dir = TempDir::new().unwrap();
        let test_dir = temp_dir.path().join("tests");
        fs::create_dir_all(&test_dir).unwrap();

        let plain = test_dir.join("sample.tar");
        fs::write(&plain, b"abc").unwrap();
        let plain = plain.to_str().unwrap();
        assert_eq!(failure_expectation(plain, false).unwrap(), 1.0);
        assert_eq!(failure_expectation(plain, true).unwrap(), 1.0);

        let digest_dir = test_dir.join("a9993e364706816aba3e25717850c26c9cd0d89d");
        fs::create_dir_all(&digest_dir).unwrap();
        let enclosed = digest_dir.join("inner.tar");
        fs::write(&enclosed, b"abc").unwrap();
        let enclosed = enclosed.to_str().unwrap();
        assert_eq!(failure_expectation(enclosed, true).unwrap(), 0.5);

        assert!(failure_expectation("/no/such/test.tar", true).is_err());
    }
}
