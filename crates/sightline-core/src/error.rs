//! Core error types for the Sightline application.
//!
//! Subsystem crates (`sightline-db`, `sightline-browser`, `sightline-scanner`,
//! `sightline-report`) each carry their own error enum; this module holds only
//! the errors produced by the core crate itself.

use thiserror::Error;

/// Errors produced by `sightline-core` operations.
#[derive(Error, Debug)]
pub enum SightlineError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file not found (may be first run)
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

/// Result type alias using `SightlineError`.
pub type Result<T> = std::result::Result<T, SightlineError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
