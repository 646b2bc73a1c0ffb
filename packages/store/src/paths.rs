//! Canonical file paths for the data directory.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ADDRESS_INTERPOLATION_DATA_DIR";

/// Returns the data directory: `$ADDRESS_INTERPOLATION_DATA_DIR`, or
/// `data/` relative to the working directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV).map_or_else(|| PathBuf::from("data"), PathBuf::from)
}

/// Returns the default path of the `DuckDB` store.
#[must_use]
pub fn default_database_path() -> PathBuf {
    data_dir().join("address_interpolation.duckdb")
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
