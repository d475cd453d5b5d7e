//! Shared utilities for command handlers

use crate::config::Config;
use crate::error::{Error, ErrorContext, Result};
use drilldown_core::{DrillDownRequest, ReportRegistry};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The built-in registry with config overrides, then `extra`, merged over it
pub fn load_registry(extra: &[PathBuf], config: &Config) -> Result<ReportRegistry> {
    let mut registry = ReportRegistry::builtin();

    for path in config.registry_overrides.iter().chain(extra) {
        if !path.exists() {
            return Err(Error::FileNotFound { path: path.clone() });
        }
        let count = registry
            .extend_from_file(path)
            .with_context(|| format!("Failed to load registry override {}", path.display()))?;
        info!(path = %path.display(), count, "Merged registry override");
    }

    Ok(registry)
}

/// Read a drill-down request from a JSON or YAML file
pub fn load_request(path: &Path) -> Result<DrillDownRequest> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), "Read request file");

    let value: Value = if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
        })?
    } else {
        serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
        })?
    };

    Ok(DrillDownRequest::from_value(value)?)
}

pub fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false)
}
