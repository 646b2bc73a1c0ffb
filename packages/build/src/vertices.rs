//! Footprint corners, scheme detection and vertex synthesis.
//!
//! Runs per street once all of its real records are known, whichever
//! batches they arrived in. Footprint records get two `POLYGON` corner
//! records, every record is placed by its distance along the centerline,
//! the street's numbering scheme is classified from the odd/even spread
//! per side, and each geometry vertex gets a synthetic `VERTEX` record per
//! side carrying the house number linearly interpolated at that distance.
//! Query-time interpolation can then ignore the geometry and work from
//! records alone.

use std::cmp::Ordering;

use address_interpolation_geometry::{Coord, Point, Polyline, geodesic, round_to};
use address_interpolation_models::{AddressRecord, Parity, RecordKind, Scheme, StreetGeometry};

/// A record's house number placed along the street.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEntry {
    /// House number of the record.
    pub housenumber: f64,
    /// Meters along the centerline to the record's projection.
    pub dist: f64,
    /// Side of the street.
    pub parity: Parity,
}

/// Offset applied to footprint corner house numbers so the two corners
/// order around the real number.
pub const POLYGON_OFFSET: f64 = 0.001;

/// Output of [`synthesize_vertices`].
#[derive(Debug, Clone, PartialEq)]
pub struct VertexSynthesis {
    /// Detected numbering scheme.
    pub scheme: Scheme,
    /// `POLYGON` corner records, two per footprint record.
    pub corners: Vec<AddressRecord>,
    /// Synthetic `VERTEX` records, in vertex order, `L` before `R`.
    pub vertices: Vec<AddressRecord>,
}

impl VertexSynthesis {
    /// All synthetic records, corners first.
    #[must_use]
    pub fn into_records(self) -> Vec<AddressRecord> {
        let mut records = self.corners;
        records.extend(self.vertices);
        records
    }
}

/// Places every non-vertex record of `street_id` along `line`.
///
/// Sorted by distance ascending, ties broken by house number descending.
#[must_use]
pub fn distance_table(
    street_id: i64,
    line: &Polyline,
    records: &[AddressRecord],
) -> Vec<DistanceEntry> {
    let mut entries: Vec<DistanceEntry> = records
        .iter()
        .filter(|r| r.id == street_id && r.kind != RecordKind::Vertex)
        .filter_map(|r| {
            let proj = line.project(Coord {
                x: r.proj_lon,
                y: r.proj_lat,
            })?;
            Some(DistanceEntry {
                housenumber: r.housenumber,
                dist: line.distance_along(&proj),
                parity: r.parity,
            })
        })
        .collect();

    entries.sort_by(compare_entries);
    entries
}

fn compare_entries(a: &DistanceEntry, b: &DistanceEntry) -> Ordering {
    a.dist
        .total_cmp(&b.dist)
        .then_with(|| b.housenumber.total_cmp(&a.housenumber))
}

#[derive(Default)]
struct SideTally {
    odd: u64,
    even: u64,
    total: u64,
}

impl SideTally {
    const fn all_odd(&self) -> bool {
        self.odd == self.total
    }

    const fn all_even(&self) -> bool {
        self.even == self.total
    }
}

/// Classifies the numbering scheme from the odd/even spread per side.
///
/// [`Scheme::Zigzag`] when every number on one side is odd and every
/// number on the other is even. A side with no numbers satisfies either,
/// so a street numbered on one side only is zigzag as long as that side
/// does not mix odd and even. Anything else is [`Scheme::Updown`].
#[must_use]
pub fn detect_scheme(entries: &[DistanceEntry]) -> Scheme {
    let mut left = SideTally::default();
    let mut right = SideTally::default();

    for entry in entries {
        if entry.housenumber == 0.0 {
            continue;
        }
        let tally = match entry.parity {
            Parity::L => &mut left,
            Parity::R => &mut right,
        };
        if entry.housenumber.trunc().rem_euclid(2.0) == 0.0 {
            tally.even += 1;
        } else {
            tally.odd += 1;
        }
        tally.total += 1;
    }

    let zigzag =
        (right.all_odd() && left.all_even()) || (left.all_odd() && right.all_even());

    if zigzag { Scheme::Zigzag } else { Scheme::Updown }
}

/// Interpolates a fractional house number at `dist` from one side's
/// sorted entries.
///
/// Returns `None` before the first entry or at/after the last one:
/// extrapolation is never attempted.
#[must_use]
pub fn interpolate_at(entries: &[DistanceEntry], dist: f64) -> Option<f64> {
    for pair in entries.windows(2) {
        let (this, next) = (&pair[0], &pair[1]);

        if dist < this.dist {
            return None;
        }

        if next.dist > dist {
            let ratio = (dist - this.dist) / (next.dist - this.dist);
            let min = this.housenumber.min(next.housenumber);
            let max = this.housenumber.max(next.housenumber);
            return Some((max - min).mul_add(1.0 - ratio, min));
        }
    }

    None
}

/// Emits two `POLYGON` records for every footprint record in `records`.
///
/// The corner nearer to the next higher house number on the same street
/// side gets `n + 0.001`, the other `n - 0.001`. Without such a neighbour
/// the left (north-east) corner takes the lower number. `records` should
/// hold every real record of the street, or the choice depends on which
/// neighbours happen to be present.
#[must_use]
pub fn polygon_corners(records: &[AddressRecord]) -> Vec<AddressRecord> {
    let mut corners = Vec::new();

    for record in records {
        let Some(footprint) = record.footprint else {
            continue;
        };

        let left = Point::new(footprint.proj_lon_left, footprint.proj_lat_left);
        let right = Point::new(footprint.proj_lon_right, footprint.proj_lat_right);

        let next_higher = records
            .iter()
            .filter(|r| {
                r.id == record.id
                    && r.parity == record.parity
                    && !r.kind.is_synthetic()
                    && r.housenumber > record.housenumber
            })
            .min_by(|a, b| a.housenumber.total_cmp(&b.housenumber));

        let left_is_min = next_higher.is_none_or(|higher| {
            let target = Point::new(higher.proj_lon, higher.proj_lat);
            geodesic::distance(right, target) <= geodesic::distance(left, target)
        });

        let (left_number, right_number) = if left_is_min {
            (
                record.housenumber - POLYGON_OFFSET,
                record.housenumber + POLYGON_OFFSET,
            )
        } else {
            (
                record.housenumber + POLYGON_OFFSET,
                record.housenumber - POLYGON_OFFSET,
            )
        };

        for (housenumber, corner) in [(left_number, left), (right_number, right)] {
            corners.push(AddressRecord {
                id: record.id,
                kind: RecordKind::Polygon,
                housenumber,
                parity: record.parity,
                lon: None,
                lat: None,
                proj_lon: corner.x(),
                proj_lat: corner.y(),
                footprint: None,
                dist: None,
            });
        }
    }

    corners
}

/// Builds the street's `POLYGON` corners, classifies its scheme and
/// synthesizes `VERTEX` records at every geometry vertex except the first.
///
/// Synthetic records already in `records` are ignored, so the result only
/// depends on the street's real records. The scheme is classified from
/// real records; interpolation uses real records and corners.
#[must_use]
pub fn synthesize_vertices(street: &StreetGeometry, records: &[AddressRecord]) -> VertexSynthesis {
    let line = Polyline::from_lon_lat(&street.coordinates);

    let mut placed: Vec<AddressRecord> = records
        .iter()
        .filter(|r| r.id == street.id && !r.kind.is_synthetic())
        .cloned()
        .collect();
    let scheme = detect_scheme(&distance_table(street.id, &line, &placed));

    let corners = polygon_corners(&placed);
    placed.extend(corners.iter().cloned());
    let entries = distance_table(street.id, &line, &placed);

    let sides: Vec<(Parity, Vec<DistanceEntry>)> = [Parity::L, Parity::R]
        .into_iter()
        .map(|parity| {
            let side = entries
                .iter()
                .filter(|e| e.parity == parity)
                .copied()
                .collect();
            (parity, side)
        })
        .collect();

    let mut vertices = Vec::new();

    for (vertex, &dist) in line.coords().iter().zip(line.cumulative()).skip(1) {
        for (parity, side) in &sides {
            let Some(housenumber) = interpolate_at(side, dist) else {
                continue;
            };

            vertices.push(AddressRecord {
                id: street.id,
                kind: RecordKind::Vertex,
                housenumber: round_to(housenumber, 3),
                parity: *parity,
                lon: None,
                lat: None,
                proj_lon: vertex.x,
                proj_lat: vertex.y,
                footprint: None,
                dist: Some(dist),
            });
        }
    }

    log::debug!(
        "street {}: {} scheme, {} corner and {} vertex records from {} entries",
        street.id,
        scheme.as_str(),
        corners.len(),
        vertices.len(),
        entries.len()
    );

    VertexSynthesis {
        scheme,
        corners,
        vertices,
    }
}

#[cfg(test)]
mod tests {
    use address_interpolation_models::{Bounds, RawAddress, StreetBatch};

    use super::*;
    use crate::augment::augment_street;

    fn record(housenumber: f64, parity: Parity, lon: f64, lat: f64) -> AddressRecord {
        AddressRecord {
            id: 7,
            kind: RecordKind::Real {
                source: "OA".to_string(),
                source_id: format!("{housenumber}"),
            },
            housenumber,
            parity,
            lon: Some(lon),
            lat: Some(lat),
            proj_lon: lon,
            proj_lat: lat,
            footprint: None,
            dist: None,
        }
    }

    fn entry(housenumber: f64, dist: f64, parity: Parity) -> DistanceEntry {
        DistanceEntry {
            housenumber,
            dist,
            parity,
        }
    }

    fn street() -> StreetGeometry {
        StreetGeometry {
            id: 7,
            names: vec![],
            coordinates: vec![[0.0, 0.0], [0.001, 0.0], [0.002, 0.0]],
            scheme: None,
        }
    }

    #[test]
    fn vertex_between_two_records_is_midpoint_number() {
        let records = vec![
            record(5.0, Parity::L, 0.0, 0.0),
            record(15.0, Parity::L, 0.002, 0.0),
        ];

        let synthesis = synthesize_vertices(&street(), &records);

        assert_eq!(synthesis.vertices.len(), 1);
        let vertex = &synthesis.vertices[0];
        assert_eq!(vertex.kind, RecordKind::Vertex);
        assert!(vertex.source_id().is_none());
        assert_eq!(vertex.parity, Parity::L);
        assert!((vertex.housenumber - 10.0).abs() < f64::EPSILON);
        assert!((vertex.proj_lon - 0.001).abs() < f64::EPSILON);
        assert!(vertex.lon.is_none());
    }

    #[test]
    fn interpolation_uses_distance_ratio() {
        let side = vec![entry(5.0, 0.0, Parity::L), entry(15.0, 100.0, Parity::L)];
        let value = interpolate_at(&side, 50.0).unwrap();
        assert!((value - 10.0).abs() < 1e-12);
        let value = interpolate_at(&side, 25.0).unwrap();
        assert!((value - 12.5).abs() < 1e-12);
    }

    #[test]
    fn no_extrapolation_outside_known_records() {
        let side = vec![entry(5.0, 10.0, Parity::R), entry(15.0, 100.0, Parity::R)];
        assert!(interpolate_at(&side, 5.0).is_none());
        assert!(interpolate_at(&side, 100.0).is_none());
        assert!(interpolate_at(&side, 150.0).is_none());
        assert!(interpolate_at(&side[..1], 10.0).is_none());
    }

    #[test]
    fn sides_are_interpolated_independently() {
        let records = vec![
            record(5.0, Parity::L, 0.0, 0.0),
            record(15.0, Parity::L, 0.002, 0.0),
            record(2.0, Parity::R, 0.0005, 0.0),
            record(8.0, Parity::R, 0.0015, 0.0),
        ];

        let synthesis = synthesize_vertices(&street(), &records);

        let parities: Vec<Parity> = synthesis.vertices.iter().map(|r| r.parity).collect();
        assert_eq!(parities, vec![Parity::L, Parity::R]);
        assert!((synthesis.vertices[1].housenumber - 5.0).abs() < 1e-3);
    }

    #[test]
    fn existing_vertex_records_are_ignored() {
        let mut vertex = record(999.0, Parity::L, 0.001, 0.0);
        vertex.kind = RecordKind::Vertex;
        let records = vec![
            record(5.0, Parity::L, 0.0, 0.0),
            vertex,
            record(15.0, Parity::L, 0.002, 0.0),
        ];

        let synthesis = synthesize_vertices(&street(), &records);
        assert!((synthesis.vertices[0].housenumber - 10.0).abs() < f64::EPSILON);
    }

    fn raw(id: &str, number: &str, lon: f64, lat: f64) -> RawAddress {
        RawAddress {
            source: "OA".to_string(),
            source_id: id.to_string(),
            number: number.to_string(),
            lon,
            lat,
            bounds: None,
        }
    }

    fn building() -> RawAddress {
        let mut building = raw("way/1", "10", 0.0005, 0.00015);
        building.bounds = Some(Bounds {
            n: 0.0002,
            s: 0.0001,
            e: 0.0006,
            w: 0.0004,
        });
        building
    }

    fn batch(addresses: Vec<RawAddress>) -> StreetBatch {
        StreetBatch {
            streets: vec![street()],
            addresses,
        }
    }

    fn corner_numbers(synthesis: &VertexSynthesis) -> Vec<(f64, f64)> {
        synthesis
            .corners
            .iter()
            .map(|c| (c.proj_lon, c.housenumber))
            .collect()
    }

    #[test]
    fn corner_nearer_higher_neighbour_gets_higher_number() {
        let records = augment_street(&batch(vec![building(), raw("b", "12", 0.0009, 0.0001)]));
        let synthesis = synthesize_vertices(&street(), &records);

        assert_eq!(synthesis.corners.len(), 2);
        assert!(synthesis.corners.iter().all(|c| c.kind == RecordKind::Polygon));
        assert!(synthesis.corners.iter().all(|c| c.source_id().is_none()));
        assert!(synthesis.corners.iter().all(|c| c.parity == Parity::L));

        let corners = corner_numbers(&synthesis);
        assert!((corners[0].0 - 0.0006).abs() < 1e-12);
        assert!((corners[0].1 - 10.001).abs() < 1e-9);
        assert!((corners[1].0 - 0.0004).abs() < 1e-12);
        assert!((corners[1].1 - 9.999).abs() < 1e-9);
    }

    #[test]
    fn corner_without_higher_neighbour_puts_left_first() {
        let records = augment_street(&batch(vec![building()]));
        let corners = corner_numbers(&synthesize_vertices(&street(), &records));

        assert!((corners[0].1 - 9.999).abs() < 1e-9);
        assert!((corners[1].1 - 10.001).abs() < 1e-9);
    }

    #[test]
    fn corners_use_neighbours_from_other_batches() {
        let together = augment_street(&batch(vec![building(), raw("b", "12", 0.0009, 0.0001)]));

        let mut split = augment_street(&batch(vec![building()]));
        split.extend(augment_street(&batch(vec![raw("b", "12", 0.0009, 0.0001)])));

        let synthesis = synthesize_vertices(&street(), &split);
        assert_eq!(synthesis, synthesize_vertices(&street(), &together));
        assert!((corner_numbers(&synthesis)[0].1 - 10.001).abs() < 1e-9);
    }

    #[test]
    fn stored_corners_are_rebuilt_not_reused() {
        let mut records = augment_street(&batch(vec![building()]));
        let stale = polygon_corners(&records);
        records.extend(stale);
        records.push(augment_street(&batch(vec![raw("b", "12", 0.0009, 0.0001)])).remove(0));

        let corners = corner_numbers(&synthesize_vertices(&street(), &records));
        assert_eq!(corners.len(), 2);
        assert!((corners[0].1 - 10.001).abs() < 1e-9);
    }

    #[test]
    fn corners_bound_vertex_interpolation() {
        let records = augment_street(&batch(vec![
            raw("a", "2", 0.0, 0.0001),
            building(),
        ]));
        let synthesis = synthesize_vertices(&street(), &records);

        // Both later vertices lie past the farthest corner (0.0006), so
        // nothing brackets them on the L side.
        assert!(synthesis.vertices.is_empty());
        assert_eq!(synthesis.clone().into_records().len(), 2);
    }

    #[test]
    fn table_sorts_by_distance_then_number_descending() {
        let line = Polyline::from_lon_lat(&street().coordinates);
        let records = vec![
            record(9.0, Parity::L, 0.002, 0.0),
            record(3.0, Parity::L, 0.0, 0.0),
            record(4.0, Parity::R, 0.0, 0.0),
        ];

        let numbers: Vec<f64> = distance_table(7, &line, &records)
            .iter()
            .map(|e| e.housenumber)
            .collect();
        assert_eq!(numbers, vec![4.0, 3.0, 9.0]);
    }

    #[test]
    fn zigzag_when_sides_split_odd_and_even() {
        let entries = vec![
            entry(1.0, 0.0, Parity::R),
            entry(3.0, 10.0, Parity::R),
            entry(2.0, 0.0, Parity::L),
            entry(4.0, 10.0, Parity::L),
        ];
        assert_eq!(detect_scheme(&entries), Scheme::Zigzag);
    }

    #[test]
    fn updown_when_a_side_is_mixed() {
        let entries = vec![
            entry(1.0, 0.0, Parity::R),
            entry(2.0, 10.0, Parity::R),
            entry(4.0, 0.0, Parity::L),
        ];
        assert_eq!(detect_scheme(&entries), Scheme::Updown);
    }

    #[test]
    fn zigzag_when_only_one_side_is_numbered() {
        let entries = vec![
            entry(1.0, 0.0, Parity::R),
            entry(3.0, 10.0, Parity::R),
            entry(5.0, 20.0, Parity::R),
        ];
        assert_eq!(detect_scheme(&entries), Scheme::Zigzag);
    }

    #[test]
    fn updown_when_the_only_numbered_side_is_mixed() {
        let entries = vec![entry(1.0, 0.0, Parity::L), entry(2.0, 10.0, Parity::L)];
        assert_eq!(detect_scheme(&entries), Scheme::Updown);
    }

    #[test]
    fn apartment_fractions_count_by_whole_number() {
        let entries = vec![
            entry(1.1, 0.0, Parity::R),
            entry(3.0, 10.0, Parity::R),
            entry(2.2, 0.0, Parity::L),
        ];
        assert_eq!(detect_scheme(&entries), Scheme::Zigzag);
    }
}
