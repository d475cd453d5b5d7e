//! Configuration management for the CLI
//!
//! Configuration is read from the first file found in:
//! - the `--config` flag or `DRILLDOWN_CONFIG`
//! - `.drilldown.yaml`, `.drilldown.json` or `drilldown.yaml` in the current directory
//! - `<config dir>/drilldown/config.yaml`
//! - `~/.drilldown.yaml`
//!
//! Relative registry override paths are resolved against the directory of
//! the file that names them.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const OUTPUT_FORMATS: &[&str] = &["human", "json", "json-pretty", "yaml"];
const LOG_FORMATS: &[&str] = &["compact", "full", "json"];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Descriptor files merged over the built-in registry, in order
    pub registry_overrides: Vec<PathBuf>,

    /// Reference time for relative windows when a request has no `now`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_now: Option<i64>,

    pub output: OutputConfig,

    pub logging: LoggingConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Used when `--output` is left at its default
    pub format: String,

    pub color: bool,

    /// Show a spinner while compiling several requests
    pub progress: bool,
}

/// Logging defaults; `-v`, `RUST_LOG` and `DRILLDOWN_LOG_*` override them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (compact, full, json)
    pub format: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_overrides: Vec::new(),
            default_now: None,
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            color: true,
            progress: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;

        let mut config: Config = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?,
            _ => serde_json::from_str(&content)?,
        };

        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        match Self::resolve_path(None) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// The file configuration would be read from, if any
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        Self::default_config_paths().into_iter().find(|p| p.exists())
    }

    /// Default configuration file paths, in lookup order
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".drilldown.yaml"),
            PathBuf::from(".drilldown.json"),
            PathBuf::from("drilldown.yaml"),
        ];

        if let Some(user) = Self::user_config_path() {
            paths.push(user);
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".drilldown.yaml"));
        }

        paths
    }

    /// `<config dir>/drilldown/config.yaml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("drilldown").join("config.yaml"))
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        for path in &mut self.registry_overrides {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if !OUTPUT_FORMATS.contains(&self.output.format.as_str()) {
            return Err(Error::config(format!(
                "Unknown output format '{}', expected one of {}",
                self.output.format,
                OUTPUT_FORMATS.join(", ")
            )));
        }
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(Error::config(format!(
                "Unknown log format '{}', expected one of {}",
                self.logging.format,
                LOG_FORMATS.join(", ")
            )));
        }
        if let Some(missing) = self.registry_overrides.iter().find(|p| !p.exists()) {
            return Err(Error::config(format!(
                "Registry override {} does not exist",
                missing.display()
            )));
        }
        Ok(())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e)))?,
            _ => serde_json::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output.format, "human");
        assert_eq!(config.logging.format, "compact");
        assert!(config.registry_overrides.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_yaml_resolves_overrides() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("reports.yaml"), "[]").unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "registry_overrides:\n  - reports.yaml\ndefault_now: 1700000000\noutput:\n  format: json\n",
        )
        .unwrap();

        let config = Config::load_with_file(Some(&path)).unwrap();

        assert_eq!(config.registry_overrides, vec![dir.path().join("reports.yaml")]);
        assert_eq!(config.default_now, Some(1_700_000_000));
        assert_eq!(config.output.format, "json");
        assert!(config.output.color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_round_trip_formats() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            default_now: Some(42),
            ..Config::default()
        };

        for name in ["config.yaml", "config.json", "config.toml"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(Config::from_file(&path).unwrap(), config, "{name}");
        }
    }

    #[test]
    fn test_validate_rejects_unknown_formats() {
        let mut config = Config::default();
        config.output.format = "xml".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.registry_overrides.push(PathBuf::from("/nonexistent/reports.yaml"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load_with_file(Some(Path::new("/nonexistent/drilldown.yaml"))).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
