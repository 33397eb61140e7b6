//! Configuration for the query parser.
//!
//! Resolution order used by [`Config::load`]:
//! 1. `SIFT_CONFIG` environment variable naming a TOML file
//! 2. Built-in defaults
//!
//! `SIFT_MAX_DEPTH` overrides `max_depth` on top of either source.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "SIFT_CONFIG";

/// Environment variable overriding the nesting limit.
pub const MAX_DEPTH_ENV_VAR: &str = "SIFT_MAX_DEPTH";

/// Parser limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of nested parenthesized groups.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum accepted query length in bytes.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_max_depth() -> usize {
    32
}

fn default_max_length() -> usize {
    8_192
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_length: default_max_length(),
        }
    }
}

impl Config {
    /// Create a config with an explicit nesting limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// Load config using the environment, falling back to defaults.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::load_from(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        if let Ok(raw) = std::env::var(MAX_DEPTH_ENV_VAR) {
            config.max_depth = raw.trim().parse().map_err(|e| {
                Error::Config(format!("Invalid {}={:?}: {}", MAX_DEPTH_ENV_VAR, raw, e))
            })?;
        }

        Ok(config)
    }

    /// Load config from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save config as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.max_depth, 32);
        assert_eq!(config.max_length, 8_192);
    }

    #[test]
    fn test_config_partial_toml() {
        let config = Config::from_toml_str("max_depth = 4\n").unwrap();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.max_length, 8_192);
    }

    #[test]
    fn test_config_invalid_toml() {
        let err = Config::from_toml_str("max_depth = \"deep\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_config_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load_from(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sift.toml");

        let config = Config {
            max_depth: 7,
            max_length: 256,
        };
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
