//! Configuration for opening export bundles.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

/// Default buffer between shard reads and the inflater (64 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Section of a configuration file holding [`VfsConfig`] keys.
pub const CONFIG_SECTION: &str = "vfs";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or parsed.
    #[error("failed to load config {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// The configuration text is not valid INI.
    #[error("failed to parse config: {0}")]
    Parse(#[from] ini::ParseError),

    /// A key holds a value of the wrong shape.
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Settings for virtual filesystem construction and reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsConfig {
    /// Check CRC-32 and length when an archive entry stream reaches its end.
    pub verify_checksums: bool,

    /// Buffer size between positioned shard reads and decompression.
    pub read_buffer_size: usize,

    /// Parse shard central directories on the rayon thread pool.
    ///
    /// Merging and duplicate detection still happen in one step afterwards.
    pub parallel_scan: bool,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            parallel_scan: true,
        }
    }
}

impl VfsConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable checksum verification.
    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Set the read buffer size.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Enable or disable parallel shard parsing.
    pub fn with_parallel_scan(mut self, parallel: bool) -> Self {
        self.parallel_scan = parallel;
        self
    }

    /// Load settings from the `[vfs]` section of an INI file.
    ///
    /// Missing keys keep their defaults; unknown keys are ignored.
    pub fn from_ini_file(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Load settings from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let Some(section) = ini.section(Some(CONFIG_SECTION)) else {
            return Ok(config);
        };

        if let Some(value) = section.get("verify_checksums") {
            config.verify_checksums = parse_bool("verify_checksums", value)?;
        }
        if let Some(value) = section.get("read_buffer_size") {
            config.read_buffer_size = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| invalid("read_buffer_size", value))?;
        }
        if let Some(value) = section.get("parallel_scan") {
            config.parallel_scan = parse_bool("parallel_scan", value)?;
        }

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
