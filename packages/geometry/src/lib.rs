#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pure geometry for address interpolation.
//!
//! - [`project`]: projecting points onto street polylines, measuring
//!   distance along them, and deciding which side of the street a point
//!   lies on.
//! - [`geodesic`]: great-circle distance and interpolation between two
//!   points.
//!
//! Both the build pipeline and the query resolver use these; nothing in
//! this crate performs I/O.

pub mod geodesic;
pub mod project;

pub use geo::{Coord, Point};
pub use project::{Polyline, Projection};

/// Converts a `[lon, lat]` pair into a [`Coord`].
#[must_use]
pub const fn coord(lon_lat: [f64; 2]) -> Coord<f64> {
    Coord {
        x: lon_lat[0],
        y: lon_lat[1],
    }
}

/// Rounds `value` to `places` decimal places.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
