use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for large value storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LargeValueConfig {
    /// Byte length at which a value is externalized (must be positive).
    pub minimum_size: u64,
    /// Whether stored bytes are zstd-compressed.
    pub compress: bool,
    /// zstd compression level.
    pub compression_level: i32,
    /// Whether reads re-hash the content and reject mismatches.
    pub verify_reads: bool,
}

impl Default for LargeValueConfig {
    fn default() -> Self {
        Self {
            minimum_size: 1024,
            compress: true,
            compression_level: 3,
            verify_reads: true,
        }
    }
}

impl LargeValueConfig {
    /// A configuration with the given threshold and default everything else.
    pub fn with_minimum_size(minimum_size: u64) -> Self {
        Self {
            minimum_size,
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_toml_file(path: &Path) -> StoreResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.minimum_size == 0 {
            return Err(StoreError::InvalidConfig(
                "minimum_size must be positive".into(),
            ));
        }
        if !zstd::compression_level_range().contains(&self.compression_level) {
            return Err(StoreError::InvalidConfig(format!(
                "compression_level {} is out of range",
                self.compression_level
            )));
        }
        Ok(())
    }
}
