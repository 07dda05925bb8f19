//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read the configuration file.
    #[error("failed to read configuration file '{path}': {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Failed to parse JSON content.
    #[error("failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The file extension maps to no supported format.
    #[error("unsupported config format: '{extension}' (expected .yaml, .yml, or .json)")]
    UnsupportedFormat {
        /// The offending file extension.
        extension: String,
    },

    /// Required command-line parameters are missing.
    #[error("missing required parameters: --listen and --remote")]
    MissingListenRemote,
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
