//! Extraction command

use anyhow::{Context, Result};
use enclose_core::config::Config;
use enclose_core::{ExtractRequest, Pipeline};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Options gathered from the command line and configuration
#[derive(Debug, Default)]
pub struct ExtractOptions {
    pub output: Option<PathBuf>,
    pub name: Option<String>,
    pub enclosed: bool,
    pub json: bool,
}

/// Extract one archive, printing the output directory (or the status as JSON)
pub fn run_extract(config: &Config, archive: &Path, options: ExtractOptions) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    info!("Extracting archive: {}", archive.display());

    if let Some(output) = &options.output {
        let output = cwd.join(output);
        if !output.exists() {
            info!("Creating output directory {}", output.display());
            fs::create_dir_all(&output)
                .with_context(|| format!("cannot create output directory {}", output.display()))?;
        }
    }

    let mut request = ExtractRequest::new(archive).enclosed(options.enclosed);
    if let Some(name) = options.name {
        request = request.named(name);
    }
    if let Some(output) = options.output {
        request = request.into_dir(output);
    }

    let pipeline = Pipeline::from_config(config, cwd);
    let status = pipeline.extract_one(&request);

    for warning in status.warnings() {
        warn!("{}", warning);
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else if status.is_success() {
        if let Some(dir) = status.output_dir() {
            println!("{}", dir.display());
        }
    }

    status.into_result()?;
    info!("Extraction complete");
    Ok(())
}
