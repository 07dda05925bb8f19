//! Configuration file loading.
//!
//! The file format is selected by extension: `.yaml`/`.yml` or
//! `.json`. Loading is fatal for the whole process when driven from
//! the binary; validation of individual services happens later, at
//! service start, where failures are isolated per service.

use std::path::Path;

use super::error::{ConfigError, ConfigResult};
use super::types::Config;

/// Load configuration from a file path.
///
/// # Errors
///
/// Returns an error if the file does not exist, cannot be read, has an
/// unsupported extension, or fails to parse.
pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Config> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => from_yaml_str(&content),
        "json" => from_json_str(&content),
        other => Err(ConfigError::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}

/// Parse configuration from a YAML string.
///
/// # Errors
///
/// Returns an error if the YAML is malformed.
pub fn from_yaml_str(content: &str) -> ConfigResult<Config> {
    Ok(serde_yaml::from_str(content)?)
}

/// Parse configuration from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed.
pub fn from_json_str(content: &str) -> ConfigResult<Config> {
    Ok(serde_json::from_str(content)?)
}
