//! enclose-cli - Command-line interface for enclose
//!
//! This crate provides the `enclose` binary:
//! - Extraction into directories named after the archive's SHA-1 digest
//! - SHA-1 digests of arbitrary files
//! - Filename and format inspection

use anyhow::Result;
use clap::{Parser, Subcommand};
use enclose_core::config::Config;
use enclose_core::status::codes;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod extract;
mod inspect;

/// enclose - extract archives into content-addressed directories
#[derive(Parser)]
#[command(name = "enclose")]
#[command(
    author,
    version,
    about = "Extract archives into content-addressed directories",
    long_about = None
)]
struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract an archive
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Directory the output is placed in
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Name given to a single decompressed file
        #[arg(long)]
        name: Option<String>,

        /// Nest the output in a directory named after the archive's SHA-1
        #[arg(long, conflicts_with = "no_enclose")]
        enclose: bool,

        /// Extract directly into the output directory
        #[arg(long)]
        no_enclose: bool,

        /// Print the full status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print SHA-1 digests of files
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show how file names are interpreted
    Inspect {
        /// Paths to inspect
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(long, conflicts_with = "path")]
        show: bool,

        /// Show configuration file path
        #[arg(long)]
        path: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let result = run();

    match result {
        Ok(_) => process::exit(0),
        Err(e) => {
            error!("Error: {}", e);

            let exit_code = map_error_to_exit_code(&e);
            process::exit(exit_code);
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Extract {
            archive,
            output,
            name,
            enclose,
            no_enclose,
            json,
        } => {
            let config = Config::load_or_default();
            let enclosed = if enclose {
                true
            } else if no_enclose {
                false
            } else {
                config.extract.enclose
            };

            let options = extract::ExtractOptions {
                output: output.or_else(|| config.extract.destination.clone()),
                name,
                enclosed,
                json,
            };
            extract::run_extract(&config, &archive, options)?;
        }

        Commands::Hash { files } => {
            let hasher = Config::load_or_default().hasher();
            for file in files {
                let digest = hasher.hash_file(&file)?;
                println!("{}  {}", digest, file.display());
            }
        }

        Commands::Inspect { paths } => {
            for path in paths {
                inspect::print_report(&path)?;
            }
        }

        Commands::Config { show, path } => {
            if show {
                match Config::load() {
                    Ok(config) => {
                        let toml_str = toml::to_string_pretty(&config)?;
                        println!("{}", toml_str);
                    }
                    Err(e) => {
                        error!("Failed to load configuration: {}", e);
                        return Err(e.into());
                    }
                }
            } else if path {
                let config_path = Config::config_path()
                    .map_err(|e| anyhow::anyhow!("Failed to get config path: {}", e))?;
                println!("{}", config_path.display());
            } else {
                eprintln!("Please specify --show or --path");
            }
        }
    }

    info!("Done");
    Ok(())
}

/// Map errors to exit codes:
/// - 0: Success
/// - 1: General error
/// - 2: IO error or unreadable archive
/// - 3: Invalid input or unsupported format
/// - 4: Extraction failure
fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(core_err) = err.downcast_ref::<enclose_core::Error>() {
        match core_err {
            enclose_core::Error::Io(_) => 2,
            enclose_core::Error::NotFound(_) => 2,
            enclose_core::Error::InvalidPath(_) => 3,
            enclose_core::Error::InvalidHex(_) => 3,
            enclose_core::Error::UnsupportedFormat(_) => 3,
            enclose_core::Error::Config(_) => 1,
            enclose_core::Error::Zip(_) => 4,
            enclose_core::Error::Extraction { code, .. } => match *code {
                codes::OPEN_ERROR => 2,
                codes::FAILED => 3,
                _ => 4,
            },
        }
    } else if err.is::<std::io::Error>() {
        2
    } else {
        1
    }
}
