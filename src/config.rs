use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::download::DEFAULT_CONCURRENCY;

const DEFAULT_CONFIG_FILE: &str = "ciunit.toml";

/// Configuration file structure for ciunit.
///
/// Lets operators keep the CircleCI token and instance settings out of
/// their shell history. Loaded from `ciunit.toml` in the current
/// directory, or from an explicit `--config` path. CLI flags and
/// environment variables take precedence over file values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// CircleCI connection defaults
    #[serde(default)]
    pub circleci: CircleCiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CircleCiConfig {
    /// CircleCI API token
    pub token: Option<String>,

    /// CircleCI instance base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum number of artefact downloads in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for CircleCiConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_base_url() -> String {
    "https://circleci.com".to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Config {
    /// Loads configuration from the given path, or from `ciunit.toml` in
    /// the current directory when no path is given.
    ///
    /// An explicit path that does not exist is an error; a missing
    /// default file just yields the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not valid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !path.exists() {
            if explicit {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ciunit.toml");
        fs::write(
            &path,
            r#"
[circleci]
token = "secret"
base-url = "https://circleci.internal"
concurrency = 5
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.circleci.token.as_deref(), Some("secret"));
        assert_eq!(config.circleci.base_url, "https://circleci.internal");
        assert_eq!(config.circleci.concurrency, 5);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ciunit.toml");
        fs::write(&path, "[circleci]\ntoken = \"secret\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.circleci.base_url, "https://circleci.com");
        assert_eq!(config.circleci.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/ciunit.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ciunit.toml");
        fs::write(&path, "not [valid toml").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }
}
