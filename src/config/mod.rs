//! Configuration handling for Coalesce
//!
//! Parses and manages coalesce.toml configuration files.

mod schema;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use schema::*;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Minimum chunk size pass settings
    pub optimize: OptimizeConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOverrides {
    pub min_chunk_size: Option<f64>,
    pub chunk_overhead: Option<f64>,
    pub entry_chunk_multiplicator: Option<f64>,
}

impl ConfigOverrides {
    fn apply(&self, optimize: &mut OptimizeConfig) {
        if let Some(value) = self.min_chunk_size {
            optimize.min_chunk_size = value;
        }
        if let Some(value) = self.chunk_overhead {
            optimize.chunk_overhead = value;
        }
        if let Some(value) = self.entry_chunk_multiplicator {
            optimize.entry_chunk_multiplicator = value;
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate configuration from TOML source
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse coalesce.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file, or fall back to the overrides alone when the
    /// file does not exist and they name a minimum chunk size
    pub fn resolve<P: AsRef<Path>>(path: P, overrides: ConfigOverrides) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            let min_chunk_size = overrides.min_chunk_size.with_context(|| {
                format!(
                    "Config file {} not found and no --min-chunk-size given",
                    path.display()
                )
            })?;
            debug!("No config file at {}, using defaults", path.display());
            Self::with_min_chunk_size(min_chunk_size)
        };

        overrides.apply(&mut config.optimize);
        config.validate()?;

        Ok(config)
    }

    /// Configuration with defaults for everything but the threshold
    pub fn with_min_chunk_size(min_chunk_size: f64) -> Self {
        Self {
            optimize: OptimizeConfig::with_min_chunk_size(min_chunk_size),
            output: OutputConfig::default(),
        }
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self::with_min_chunk_size(10_000.0)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.optimize
            .consolidate_options()
            .validate()
            .context("Invalid [optimize] settings")?;
        Ok(())
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
