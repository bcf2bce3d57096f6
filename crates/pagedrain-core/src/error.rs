//! Core error types for pagedrain.
//!
//! This module defines the error raised for invalid domain values and the
//! configuration error raised while loading or validating settings.

use thiserror::Error;

/// Error raised when constructing core domain values.
///
/// Browser failures live in `pagedrain-browser`; file and parse failures
/// are [`ConfigError`]s.
#[derive(Error, Debug)]
pub enum PagedrainError {
    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file not found
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using `PagedrainError`.
pub type Result<T> = std::result::Result<T, PagedrainError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PagedrainError::Validation("empty selector".to_string());
        assert_eq!(err.to_string(), "validation error: empty selector");

        let err = ConfigError::NoConfigDir;
        assert_eq!(
            err.to_string(),
            "could not determine config directory (XDG base directories not available)"
        );
    }

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::invalid("scroll.max_pages", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid config value for scroll.max_pages: must be at least 1"
        );
    }

    #[test]
    fn test_selector_failure_is_validation() {
        let err = crate::CssSelector::new("  ").unwrap_err();
        let PagedrainError::Validation(reason) = err;
        assert!(reason.contains("must not be empty"));
    }
}
