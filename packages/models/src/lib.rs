#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the address interpolation engine.
//!
//! This crate contains only data types, configuration structs, and simple
//! conversions. It has no heavyweight dependencies (no geometry, no I/O).
//!
//! Records are created once by the build pipeline and are read-only at
//! query time. [`QueryResult`] values live for the duration of a single
//! lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source tag stored for synthetic geometry-anchored records.
pub const VERTEX_SOURCE: &str = "VERTEX";

/// Source tag stored for synthetic footprint-corner records.
pub const POLYGON_SOURCE: &str = "POLYGON";

/// Source tag reported on interpolated query results.
pub const MIXED_SOURCE: &str = "mixed";

/// Side of the street a point falls on, relative to the direction in
/// which the street geometry is digitised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Parity {
    /// Left of the direction of travel.
    L,
    /// Right of the direction of travel.
    R,
}

impl Parity {
    /// Both sides, in the order results are emitted.
    pub const ALL: [Self; 2] = [Self::R, Self::L];

    /// String tag used in the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::R => "R",
        }
    }

    /// Parses from the stored string tag.
    #[must_use]
    pub fn from_str_tag(s: &str) -> Option<Self> {
        match s {
            "L" => Some(Self::L),
            "R" => Some(Self::R),
            _ => None,
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// House-numbering pattern of a street.
///
/// ```text
/// zigzag: 1   3   5   7   9
///         └─┬─┴─┬─┴─┬─┴─┬─┘
///           2   4   6   8
///
/// updown: 1   2   3   4   5
///         └─┬─┴─┬─┴─┬─┴─┬─┘
///           9   8   7   6
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Odd numbers on one side, even numbers on the other.
    Zigzag,
    /// Ascending along one side and descending back along the other.
    Updown,
}

impl Scheme {
    /// String tag used in the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zigzag => "zigzag",
            Self::Updown => "updown",
        }
    }

    /// Parses from the stored string tag.
    #[must_use]
    pub fn from_str_tag(s: &str) -> Option<Self> {
        match s {
            "zigzag" => Some(Self::Zigzag),
            "updown" => Some(Self::Updown),
            _ => None,
        }
    }
}

/// Provenance of an [`AddressRecord`].
///
/// Only [`RecordKind::Real`] rows carry a source id. The two synthetic
/// kinds exist purely to calibrate interpolation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordKind {
    /// A real-world address point (e.g. `OA`, `OSM-way`, `OSM-node`).
    Real {
        /// Provenance tag of the dataset.
        source: String,
        /// Identifier of the address within its dataset.
        source_id: String,
    },
    /// Synthetic calibration point anchored on a street-geometry vertex.
    Vertex,
    /// Synthetic point derived from a footprint's bounding-box corner.
    Polygon,
}

impl RecordKind {
    /// The `source` column value for this kind.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Real { source, .. } => source,
            Self::Vertex => VERTEX_SOURCE,
            Self::Polygon => POLYGON_SOURCE,
        }
    }

    /// The `source_id` column value for this kind.
    #[must_use]
    pub fn source_id(&self) -> Option<&str> {
        match self {
            Self::Real { source_id, .. } => Some(source_id),
            Self::Vertex | Self::Polygon => None,
        }
    }

    /// Rebuilds a kind from stored `source`/`source_id` columns.
    #[must_use]
    pub fn from_columns(source: &str, source_id: Option<String>) -> Self {
        match source {
            VERTEX_SOURCE => Self::Vertex,
            POLYGON_SOURCE => Self::Polygon,
            _ => Self::Real {
                source: source.to_string(),
                source_id: source_id.unwrap_or_default(),
            },
        }
    }

    /// `true` for [`RecordKind::Vertex`] and [`RecordKind::Polygon`].
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        !matches!(self, Self::Real { .. })
    }
}

/// Projections of a footprint's bounding-box corners onto the street.
///
/// `left` is the north-east corner, `right` the south-west corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootprintProjection {
    /// Projected longitude of the north-east corner.
    pub proj_lon_left: f64,
    /// Projected latitude of the north-east corner.
    pub proj_lat_left: f64,
    /// Projected longitude of the south-west corner.
    pub proj_lon_right: f64,
    /// Projected latitude of the south-west corner.
    pub proj_lat_right: f64,
}

/// One address row attributed to a street.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Street identifier (foreign key into the street geometry).
    pub id: i64,
    /// Provenance of the row.
    pub kind: RecordKind,
    /// Integer part is the nominal number; the fraction encodes sub-units
    /// (`2a` -> `2.1`) or synthetic perturbation.
    pub housenumber: f64,
    /// Side of the street.
    pub parity: Parity,
    /// Original longitude, absent for synthetic rows.
    pub lon: Option<f64>,
    /// Original latitude, absent for synthetic rows.
    pub lat: Option<f64>,
    /// Longitude of the projection onto the street centerline.
    pub proj_lon: f64,
    /// Latitude of the projection onto the street centerline.
    pub proj_lat: f64,
    /// Corner projections for footprint-sourced addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<FootprintProjection>,
    /// Distance in meters along the centerline to the projection.
    /// Derived at build time and not persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<f64>,
}

impl AddressRecord {
    /// The `source` column value.
    #[must_use]
    pub fn source(&self) -> &str {
        self.kind.source()
    }

    /// The `source_id` column value.
    #[must_use]
    pub fn source_id(&self) -> Option<&str> {
        self.kind.source_id()
    }
}

/// A street centerline with its names.
///
/// Coordinates are `[lon, lat]` pairs in the order the street is
/// digitised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetGeometry {
    /// Street identifier.
    pub id: i64,
    /// Names the street is known by.
    #[serde(default)]
    pub names: Vec<String>,
    /// Ordered `[lon, lat]` vertices.
    pub coordinates: Vec<[f64; 2]>,
    /// Numbering scheme, once detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
}

/// Bounding box of an extended address footprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Northern latitude.
    pub n: f64,
    /// Southern latitude.
    pub s: f64,
    /// Eastern longitude.
    pub e: f64,
    /// Western longitude.
    pub w: f64,
}

/// An unprocessed address point from an external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAddress {
    /// Provenance tag of the dataset.
    pub source: String,
    /// Identifier of the address within its dataset.
    pub source_id: String,
    /// House number exactly as supplied.
    pub number: String,
    /// Longitude (WGS84).
    pub lon: f64,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Footprint bounds for way/polygon-sourced addresses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

/// Candidate streets plus the addresses an external spatial join
/// associated with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetBatch {
    /// Candidate street geometries.
    pub streets: Vec<StreetGeometry>,
    /// Address points to attribute.
    pub addresses: Vec<RawAddress>,
}

/// How a [`QueryResult`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// A real record with exactly the requested number.
    Exact,
    /// A real record with the same integer number (different sub-unit).
    Close,
    /// Interpolated between two bounding records.
    Interpolated,
}

/// A single resolved coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// How the coordinate was produced.
    #[serde(rename = "type")]
    pub match_type: MatchType,
    /// Source of the matched record, or `mixed` when interpolated.
    pub source: String,
    /// Source id of the matched record, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// House number exactly as supplied by the caller.
    pub number: String,
    /// Side of the street.
    pub parity: Parity,
    /// Confidence, `0..=100`.
    pub accuracy: f64,
    /// Lower bounding house number of an interpolation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<f64>,
    /// Upper bounding house number of an interpolation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<f64>,
    /// Latitude, rounded to 7 decimal places.
    pub lat: f64,
    /// Longitude, rounded to 7 decimal places.
    pub lon: f64,
}

/// Engine configuration, usually loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpolationConfig {
    /// Path to the `DuckDB` file holding streets and addresses.
    #[serde(default = "default_database")]
    pub database: String,

    /// Maximum number of street-name variants matched per query.
    #[serde(default = "default_max_names")]
    pub max_names: usize,

    /// Maximum number of address rows returned per query.
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,

    /// Number of street batches processed concurrently at build time.
    #[serde(default = "default_build_concurrency")]
    pub build_concurrency: usize,
}

fn default_database() -> String {
    "data/address_interpolation.duckdb".to_string()
}

const fn default_max_names() -> usize {
    10
}

const fn default_max_matches() -> usize {
    5000
}

const fn default_build_concurrency() -> usize {
    4
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            max_names: default_max_names(),
            max_matches: default_max_matches(),
            build_concurrency: default_build_concurrency(),
        }
    }
}

/// Counts of persisted records, grouped by source tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of street geometries.
    pub streets: u64,
    /// `(source, count)` pairs ordered by source.
    pub records_by_source: Vec<(String, u64)>,
}
