//! Configuration file loading.

use crate::settings::RelayConfig;
use std::path::Path;
use tracing::info;

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension is not a supported format.
    #[error("unsupported config format: {0} (expected yaml, toml, or json)")]
    UnsupportedFormat(String),

    /// The file contents failed to parse.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// The parsed configuration violated a validation rule.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl RelayConfig {
    /// Load and validate a configuration file, dispatching on extension.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let config = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&contents)?,
            "toml" => Self::from_toml_str(&contents)?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| ConfigError::Parse(e.to_string()))?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        config.check().map_err(ConfigError::Invalid)?;
        info!(path = %path.display(), "loaded relay configuration");
        Ok(config)
    }

    /// Parse a YAML document. Validation is the caller's responsibility when
    /// not going through [`RelayConfig::from_file`].
    pub fn from_yaml_str(contents: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse a TOML document.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
