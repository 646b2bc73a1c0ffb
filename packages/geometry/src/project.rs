//! Projection of points onto street polylines.
//!
//! Projection is planar in longitude/latitude space (streets are short
//! enough for this to pick the right segment); lengths along the line
//! are geodesic, in meters.

use address_interpolation_models::Parity;
use geo::{Closest, ClosestPoint, Coord, Distance, Euclidean, Line, Point};

use crate::geodesic;

/// The closest point on a polyline to some query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// The projected point on the line.
    pub point: Coord<f64>,
    /// Index of the segment (its start vertex) the point falls on.
    pub index: usize,
    /// Start vertex of that segment.
    pub start: Coord<f64>,
    /// End vertex of that segment. Equal to `start` for single-point lines.
    pub end: Coord<f64>,
    /// Planar distance from the query point to the projection, in degrees.
    pub offset: f64,
}

/// Removes consecutive duplicate vertices.
///
/// Lines with fewer than two points are returned unchanged.
#[must_use]
pub fn dedupe(coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
    if coords.len() < 2 {
        return coords.to_vec();
    }

    let mut out: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for c in coords {
        if out.last() != Some(c) {
            out.push(*c);
        }
    }
    out
}

/// Returns the closest point on `line` to `point`.
///
/// Ties go to the earliest segment. Returns `None` for an empty line.
#[must_use]
pub fn point_on_line(line: &[Coord<f64>], point: Coord<f64>) -> Option<Projection> {
    let query = Point::from(point);

    match line {
        [] => None,
        [only] => Some(Projection {
            point: *only,
            index: 0,
            start: *only,
            end: *only,
            offset: Euclidean.distance(Point::from(*only), query),
        }),
        _ => {
            let mut best: Option<Projection> = None;

            for (index, pair) in line.windows(2).enumerate() {
                let (start, end) = (pair[0], pair[1]);
                let candidate = match Line::new(start, end).closest_point(&query) {
                    Closest::Intersection(p) | Closest::SinglePoint(p) => p,
                    Closest::Indeterminate => Point::from(start),
                };
                let offset = Euclidean.distance(candidate, query);

                if best.is_none_or(|b| offset < b.offset) {
                    best = Some(Projection {
                        point: candidate.into(),
                        index,
                        start,
                        end,
                        offset,
                    });
                }
            }

            best
        }
    }
}

/// Returns the part of `line` from its start up to the projection.
#[must_use]
pub fn slice_line_at_projection(line: &[Coord<f64>], proj: &Projection) -> Vec<Coord<f64>> {
    let upto = (proj.index + 1).min(line.len());
    let mut sliced = line[..upto].to_vec();
    if sliced.last() != Some(&proj.point) {
        sliced.push(proj.point);
    }
    sliced
}

/// Geodesic length of a line in meters.
#[must_use]
pub fn line_distance(coords: &[Coord<f64>]) -> f64 {
    coords
        .windows(2)
        .map(|pair| geodesic::distance(pair[0].into(), pair[1].into()))
        .sum()
}

/// Side of the street `point` lies on, relative to the segment its
/// projection falls on.
///
/// Positive cross product (point left of the direction of travel) is
/// [`Parity::L`]; anything else is [`Parity::R`].
#[must_use]
pub fn parity(proj: &Projection, point: Coord<f64>) -> Parity {
    let direction = proj.end - proj.start;
    let offset = point - proj.start;
    let cross = direction.x.mul_add(offset.y, -(direction.y * offset.x));

    if cross > 0.0 { Parity::L } else { Parity::R }
}

/// A deduplicated street polyline with its cumulative-distance table.
///
/// Built once per street; every projection onto it reuses the table
/// instead of re-measuring the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    coords: Vec<Coord<f64>>,
    cumulative: Vec<f64>,
}

impl Polyline {
    /// Builds a polyline, dropping consecutive duplicate vertices.
    #[must_use]
    pub fn new(coords: &[Coord<f64>]) -> Self {
        let coords = dedupe(coords);

        let mut cumulative = Vec::with_capacity(coords.len());
        let mut total = 0.0;
        for (i, c) in coords.iter().enumerate() {
            if i > 0 {
                total += geodesic::distance(coords[i - 1].into(), (*c).into());
            }
            cumulative.push(total);
        }

        Self { coords, cumulative }
    }

    /// Builds a polyline from `[lon, lat]` pairs.
    #[must_use]
    pub fn from_lon_lat(coords: &[[f64; 2]]) -> Self {
        let coords: Vec<Coord<f64>> = coords.iter().copied().map(crate::coord).collect();
        Self::new(&coords)
    }

    /// The deduplicated vertices.
    #[must_use]
    pub fn coords(&self) -> &[Coord<f64>] {
        &self.coords
    }

    /// Distance in meters from the start to each vertex. Non-decreasing,
    /// starting at `0`.
    #[must_use]
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Total length in meters.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// `true` when there are no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Projects `point` onto the polyline.
    #[must_use]
    pub fn project(&self, point: Coord<f64>) -> Option<Projection> {
        point_on_line(&self.coords, point)
    }

    /// Distance in meters along the polyline to a projection made on it.
    #[must_use]
    pub fn distance_along(&self, proj: &Projection) -> f64 {
        let Some(&base) = self.cumulative.get(proj.index) else {
            return self.length();
        };
        base + geodesic::distance(self.coords[proj.index].into(), proj.point.into())
    }
}
