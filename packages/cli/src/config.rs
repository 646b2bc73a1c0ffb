//! Loading [`InterpolationConfig`] from TOML.

use std::path::{Path, PathBuf};

use address_interpolation_models::InterpolationConfig;
use address_interpolation_store::paths;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`InterpolationConfig`].
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
}

/// Loads configuration from `path`, or defaults when no file is given.
///
/// Without a file the database lives under [`paths::data_dir`], which
/// honours `ADDRESS_INTERPOLATION_DATA_DIR`. Keys missing from a file
/// fall back to their defaults.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<InterpolationConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(InterpolationConfig {
            database: paths::default_database_path().display().to_string(),
            ..InterpolationConfig::default()
        });
    };

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config = parse_config(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Parses configuration TOML.
///
/// # Errors
///
/// Returns the TOML error if the text is invalid.
pub fn parse_config(text: &str) -> Result<InterpolationConfig, toml::de::Error> {
    toml::from_str(text)
}
