//! Configuration module

use crate::digest::FileHasher;
use crate::{Error, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Extraction defaults
    #[serde(default)]
    pub extract: ExtractConfig,
    /// Performance settings
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Extraction defaults, overridable from the command line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Nest output in a directory named after the archive's SHA-1
    pub enclose: bool,
    /// Directory extractions are placed in when none is given
    pub destination: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            enclose: true,
            destination: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Read buffer used while hashing archives, in KiB
    pub hash_buffer_size: u32,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            hash_buffer_size: 64,
        }
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| Error::Config("Unable to determine config directory".to_string()))?;

        let enclose_dir = config_dir.join("enclose");
        if !enclose_dir.exists() {
            fs::create_dir_all(&enclose_dir)?;
        }

        Ok(enclose_dir.join("config.toml"))
    }

    /// Get default configuration content with comments
    pub fn default_config_content() -> String {
        r#"# Enclose Configuration File

[extract]
# Extract into a subdirectory named after the archive's SHA-1 digest
enclose = true
# Default output directory (defaults to the current directory)
# destination = "/var/lib/enclose"

[performance]
# Read buffer used while hashing archives, in KiB
hash_buffer_size = 64
"#
        .to_string()
    }

    /// Load configuration from the default location, writing defaults if missing
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            fs::write(&path, Self::default_config_content())?;
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&path, contents)?;
        Ok(())
    }

    /// Load configuration or use defaults if loading fails
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Hasher configured with the hash buffer size
    pub fn hasher(&self) -> FileHasher {
        FileHasher::with_chunk_size(self.performance.hash_buffer_size as usize * 1024)
    }
}
