//! Filename and format inspection

use anyhow::Result;
use enclose_core::archive::detect_format;
use enclose_core::filename::{extractability, failure_expectation, recognize_extension, split_ext};
use enclose_core::ParsedFilename;
use std::path::Path;

/// Print how `path` is parsed and, if it exists, which format it holds
pub fn print_report(path: &Path) -> Result<()> {
    let text = path.to_string_lossy();
    let parsed = ParsedFilename::parse(&text);
    let (stem, full_ext, _) = split_ext(&text);

    println!("{}", parsed.name());
    println!("  basename:       {}", parsed.basename().unwrap_or("-"));
    println!("  extension:      {}", parsed.extension().unwrap_or("-"));
    println!("  full extension: {}", if full_ext.is_empty() { "-" } else { full_ext.as_str() });
    println!("  stem:           {}", stem);
    println!("  tar:            {}", parsed.is_tar());
    println!("  compressed:     {}", parsed.is_compressed_binary());
    println!("  recognized:     {}", recognize_extension(&text));
    println!("  extractability: {:.1}", extractability(&text));
    let expected = failure_expectation(&text, path.is_file())?;
    println!("  failure score:  {:.1}", expected);

    if path.is_file() {
        match detect_format(path)? {
            Some(format) => println!("  format:         {}", format),
            None => println!("  format:         unknown"),
        }
    }

    Ok(())
}
