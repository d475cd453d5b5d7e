//! Error types for the drill-down core library
//!
//! Compilation itself never fails: an unknown report compiles to an empty
//! outcome and malformed optional input is skipped. The error type below
//! covers the fallible edges around it, which are parsing requests and
//! loading registry overrides.
//!
//! Copyright (c) 2025 Drilldown Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Main error type for drill-down operations
#[derive(Error, Debug)]
pub enum Error {
    /// Registry lookups and override merges
    #[error("Registry error: {message}")]
    Registry {
        message: String,
        report_type: Option<String>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parsing errors for registry overrides
    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Validation errors for inputs
    #[error("Validation error: {field} - {message}")]
    Validation {
        field: String,
        message: String,
        expected: Option<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Configuration {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Registry {
            message: "duplicate descriptor".to_string(),
            report_type: Some("tickets_report".to_string()),
        };
        assert_eq!(err.to_string(), "Registry error: duplicate descriptor");
    }

    #[test]
    fn test_validation_display() {
        let err = Error::Validation {
            field: "report_type".to_string(),
            message: "must not be empty".to_string(),
            expected: None,
        };
        assert_eq!(
            err.to_string(),
            "Validation error: report_type - must not be empty"
        );
    }

    #[test]
    fn test_json_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse.into();
        assert!(matches!(err, Error::Json { .. }));
    }
}
