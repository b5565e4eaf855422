//! Error types for configuration operations.

use thiserror::Error;

/// Errors that can occur while reading, writing or applying a patch.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// One or more parameter values were rejected
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),
}
