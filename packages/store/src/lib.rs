#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Persistence and lookup of street geometries and address records.
//!
//! Two stores implement [`AddressStore`]:
//!
//! - [`database::DuckDbStore`]: a read-only view over the `DuckDB` file
//!   produced by [`writer::StoreWriter`].
//! - [`memory::MemoryStore`]: an in-memory R-tree, used by tests and for
//!   small ad-hoc datasets.
//!
//! Street names are normalized with [`normalize`] both when written and
//! when queried.

pub mod cache;
pub mod database;
pub mod memory;
pub mod normalize;
pub mod paths;
pub mod synonyms;
pub mod writer;

use address_interpolation_models::AddressRecord;

pub use cache::StatementCache;
pub use database::DuckDbStore;
pub use memory::MemoryStore;
pub use writer::StoreWriter;

/// Errors that can occur in store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` parsing error.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A stored street geometry is not a line.
    #[error("Street {id} has an invalid geometry: {message}")]
    Geometry {
        /// Street id.
        id: i64,
        /// What was wrong with it.
        message: String,
    },

    /// A record handed to a street's synthetic-record replacement is real
    /// or belongs to another street.
    #[error("Street {id} cannot store record: {message}")]
    InvalidRecord {
        /// Street id.
        id: i64,
        /// What was wrong with the record.
        message: String,
    },

    /// A stored column held an unexpected value.
    #[error("Invalid column value: {0}")]
    Decode(String),

    /// A connection mutex was poisoned.
    #[error("Store connection lock poisoned")]
    Poisoned,
}

/// Lookup of address records near a point on named streets.
///
/// Implementations must be safe to share across concurrent queries.
pub trait AddressStore: Send + Sync {
    /// Returns the records of every street whose bounding box contains
    /// `(lon, lat)` and which carries one of `names` (already normalized).
    ///
    /// At most the configured number of names are used. Records are
    /// ordered by house number ascending and truncated to the configured
    /// match limit. An empty `names` slice yields no records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying storage fails.
    fn query_addresses(
        &self,
        lon: f64,
        lat: f64,
        names: &[String],
    ) -> Result<Vec<AddressRecord>, StoreError>;
}
