//! Serializable backtest configuration: which pair to load and how to trade it.
//!
//! ```toml
//! [pair]
//! label_a = "KO"
//! label_b = "PEP"
//! prices_a = "data/ko.csv"
//! prices_b = "data/pep.csv"
//!
//! [strategy]
//! lookback = 60
//! entry_z = 1.0
//! ```
//!
//! Every `[strategy]` field is optional and falls back to the engine default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pairlab_core::PairConfig;

/// Errors from reading or validating a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid strategy: {0}")]
    Invalid(#[from] pairlab_core::ConfigError),
    #[error("pair labels must be non-empty")]
    EmptyLabel,
}

/// Instruments and their price files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSection {
    pub label_a: String,
    pub label_b: String,
    pub prices_a: PathBuf,
    pub prices_b: PathBuf,
}

impl PairSection {
    /// Display name such as `KO/PEP`.
    pub fn name(&self) -> String {
        format!("{}/{}", self.label_a, self.label_b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub pair: PairSection,
    #[serde(default)]
    pub strategy: PairConfig,
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file. Relative price paths are resolved against the
    /// directory containing the config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.pair.prices_a = resolve(base, &config.pair.prices_a);
            config.pair.prices_b = resolve(base, &config.pair.prices_b);
        }
        tracing::debug!(path = %path.display(), pair = %config.pair.name(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pair.label_a.trim().is_empty() || self.pair.label_b.trim().is_empty() {
            return Err(ConfigError::EmptyLabel);
        }
        self.strategy.validate()?;
        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
