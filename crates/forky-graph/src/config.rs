use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForkyConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Pixel spacing between slots (x) and lanes (y).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_spacing_x")]
    pub spacing_x: f64,
    #[serde(default = "default_spacing_y")]
    pub spacing_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spacing_x: default_spacing_x(),
            spacing_y: default_spacing_y(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Processed snapshots kept before the least recently used is evicted.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

/// Load a config file, falling back to defaults when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<ForkyConfig> {
    if !path.exists() {
        return Ok(ForkyConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ForkyConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_spacing_x() -> f64 {
    150.0
}

const fn default_spacing_y() -> f64 {
    150.0
}

const fn default_cache_capacity() -> usize {
    32
}
