//! Error types for the riskmap core library.
//!
//! Uses `thiserror` for public API error types. Missing catalog files are not
//! errors (the store substitutes defaults); malformed files and invalid model
//! descriptions are.

use std::path::PathBuf;

/// Top-level error type for the riskmap core library.
#[derive(Debug, thiserror::Error)]
pub enum RiskmapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Errors raised while loading configuration or catalog sources.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Malformed source {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConfigError::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<Box<figment::Error>> for ConfigError {
    fn from(err: Box<figment::Error>) -> Self {
        ConfigError::Invalid {
            message: err.to_string(),
        }
    }
}

/// Errors from validating a model description before matching.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Training compute must be a finite, non-negative FLOP count (got {value})")]
    InvalidCompute { value: f64 },

    #[error("Parameter count must be a finite, non-negative number (got {value})")]
    InvalidParameters { value: f64 },

    #[error("Could not parse '{input}' as a FLOP count; use scientific notation like 1e25")]
    UnparseableCompute { input: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RiskmapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_names_path() {
        let err = ConfigError::malformed("data/processed/frameworks.json", "expected a map");
        let msg = err.to_string();
        assert!(msg.contains("frameworks.json"));
        assert!(msg.contains("expected a map"));
    }

    #[test]
    fn test_config_converts_into_top_level() {
        let err: RiskmapError = ConfigError::Invalid {
            message: "bad keyword".into(),
        }
        .into();
        assert!(matches!(err, RiskmapError::Config(ConfigError::Invalid { .. })));
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid configuration: bad keyword"
        );
    }

    #[test]
    fn test_validation_converts_into_top_level() {
        let err: RiskmapError = ValidationError::InvalidCompute { value: -1.0 }.into();
        assert!(matches!(err, RiskmapError::Validation(_)));
        assert!(err.to_string().starts_with("Validation error"));
    }
}
