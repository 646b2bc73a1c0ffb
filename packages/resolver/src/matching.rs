//! Candidate selection for the resolver.

use std::collections::BTreeMap;

use address_interpolation_geometry::{Point, geodesic, round_to};
use address_interpolation_models::AddressRecord;

/// Two records of one side straddling a target house number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment<'a> {
    /// Record with the next lower house number.
    pub before: &'a AddressRecord,
    /// Record with the next higher house number.
    pub after: &'a AddressRecord,
    /// `before.housenumber - target` (negative).
    pub diff_before: f64,
    /// `after.housenumber - target` (positive).
    pub diff_after: f64,
}

impl Segment<'_> {
    /// Summed absolute offsets of the pair from the target.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.diff_before.abs() + self.diff_after.abs()
    }
}

/// First real record whose house number equals `target`.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn exact_match(records: &[AddressRecord], target: f64) -> Option<&AddressRecord> {
    records
        .iter()
        .find(|r| !r.kind.is_synthetic() && r.housenumber == target)
}

/// First real record sharing the whole part of `target`.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn close_match(records: &[AddressRecord], target: f64) -> Option<&AddressRecord> {
    records
        .iter()
        .find(|r| !r.kind.is_synthetic() && r.housenumber.floor() == target.floor())
}

/// Finds the tightest bracketing pair among one side's records.
///
/// Records are grouped by street id and ordered by house number within
/// each group; each group contributes at most one consecutive pair with
/// `before < target < after`. The pair with the smallest
/// [`Segment::spread`] wins, lower street id first on ties.
#[must_use]
pub fn tightest_segment<'a>(side: &[&'a AddressRecord], target: f64) -> Option<Segment<'a>> {
    let mut by_street: BTreeMap<i64, Vec<&'a AddressRecord>> = BTreeMap::new();
    for &record in side {
        by_street.entry(record.id).or_default().push(record);
    }

    by_street
        .into_values()
        .filter_map(|mut group| {
            group.sort_by(|a, b| a.housenumber.total_cmp(&b.housenumber));
            group
                .windows(2)
                .find(|pair| pair[0].housenumber < target && pair[1].housenumber > target)
                .map(|pair| Segment {
                    before: pair[0],
                    after: pair[1],
                    diff_before: pair[0].housenumber - target,
                    diff_after: pair[1].housenumber - target,
                })
        })
        .min_by(|a, b| a.spread().total_cmp(&b.spread()))
}

/// Geodesically interpolates the target's position between the pair's
/// projections. Coincident projections yield `before`'s position.
#[must_use]
pub fn interpolate(segment: &Segment<'_>, target: f64) -> Point<f64> {
    let a = Point::new(segment.before.proj_lon, segment.before.proj_lat);
    let b = Point::new(segment.after.proj_lon, segment.after.proj_lat);

    let distance = geodesic::distance(a, b);
    if distance <= 0.0 {
        return a;
    }

    let ratio = (target - segment.before.housenumber)
        / (segment.after.housenumber - segment.before.housenumber);

    geodesic::interpolate(distance, ratio, a, b)
}

/// Percentage of `side` whose whole house number has the same odd/even
/// parity as `target`, rounded to two decimals.
#[must_use]
pub fn parity_accuracy(side: &[&AddressRecord], target: f64) -> f64 {
    if side.is_empty() {
        return 0.0;
    }

    let target_even = is_even(target);
    let agreeing = side.iter().filter(|r| is_even(r.housenumber) == target_even).count();

    #[allow(clippy::cast_precision_loss)]
    let rate = agreeing as f64 / side.len() as f64;

    round_to(rate * 100.0, 2)
}

fn is_even(housenumber: f64) -> bool {
    housenumber.floor().rem_euclid(2.0) == 0.0
}
