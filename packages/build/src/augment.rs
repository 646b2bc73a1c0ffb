//! Street augmentation.
//!
//! Attributes each address of a [`StreetBatch`] to its nearest candidate
//! street, projects it onto the centerline, and records which side of the
//! street it is on. Footprint addresses (ways/polygons) additionally get
//! their bounding-box corners projected onto the same street. The corner
//! `POLYGON` records themselves are emitted by vertex synthesis, which
//! sees every record of the street.

use address_interpolation_geometry::{Coord, Polyline, Projection, project};
use address_interpolation_models::{
    AddressRecord, FootprintProjection, RawAddress, RecordKind, StreetBatch, StreetGeometry,
};

use crate::RecordError;
use crate::analyze::parse_housenumber;

/// A candidate street with its polyline decoded once per batch.
struct Candidate<'a> {
    street: &'a StreetGeometry,
    line: Polyline,
}

/// Where a point landed on its nearest street.
struct Nearest {
    street_id: i64,
    proj: Projection,
    dist: f64,
}

/// Augments every address in the batch.
///
/// Addresses with unparsable numbers, or that cannot be attributed to any
/// street, are logged and dropped; the rest of the batch is unaffected.
/// Returns one record per kept address, in input order.
#[must_use]
pub fn augment_street(batch: &StreetBatch) -> Vec<AddressRecord> {
    let candidates: Vec<Candidate<'_>> = batch
        .streets
        .iter()
        .map(|street| Candidate {
            street,
            line: Polyline::from_lon_lat(&street.coordinates),
        })
        .filter(|c| !c.line.is_empty())
        .collect();

    let mut records = Vec::with_capacity(batch.addresses.len());

    for address in &batch.addresses {
        match augment_address(&candidates, address) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("{e}"),
        }
    }

    log::debug!(
        "augmented {} of {} addresses across {} street(s)",
        records.len(),
        batch.addresses.len(),
        candidates.len()
    );

    records
}

fn augment_address(
    candidates: &[Candidate<'_>],
    address: &RawAddress,
) -> Result<AddressRecord, RecordError> {
    let housenumber = parse_housenumber(&address.number).ok_or_else(|| RecordError::Parse {
        source_id: address.source_id.clone(),
        number: address.number.clone(),
    })?;

    let attribution = || RecordError::Attribution {
        source_id: address.source_id.clone(),
    };

    let point = Coord {
        x: address.lon,
        y: address.lat,
    };
    let nearest = nearest_street(candidates, point).ok_or_else(attribution)?;
    let parity = project::parity(&nearest.proj, point);

    let footprint = match address.bounds {
        Some(bounds) => {
            let left = nearest_street(candidates, Coord {
                x: bounds.e,
                y: bounds.n,
            })
            .ok_or_else(attribution)?;
            let right = nearest_street(candidates, Coord {
                x: bounds.w,
                y: bounds.s,
            })
            .ok_or_else(attribution)?;

            Some(FootprintProjection {
                proj_lon_left: left.proj.point.x,
                proj_lat_left: left.proj.point.y,
                proj_lon_right: right.proj.point.x,
                proj_lat_right: right.proj.point.y,
            })
        }
        None => None,
    };

    Ok(AddressRecord {
        id: nearest.street_id,
        kind: RecordKind::Real {
            source: address.source.clone(),
            source_id: address.source_id.clone(),
        },
        housenumber,
        parity,
        lon: Some(address.lon),
        lat: Some(address.lat),
        proj_lon: nearest.proj.point.x,
        proj_lat: nearest.proj.point.y,
        footprint,
        dist: Some(nearest.dist),
    })
}

/// Projects `point` onto every candidate and keeps the closest.
fn nearest_street(candidates: &[Candidate<'_>], point: Coord<f64>) -> Option<Nearest> {
    let mut best: Option<(&Candidate<'_>, Projection)> = None;

    for candidate in candidates {
        let Some(proj) = candidate.line.project(point) else {
            continue;
        };
        if best.as_ref().is_none_or(|(_, b)| proj.offset < b.offset) {
            best = Some((candidate, proj));
        }
    }

    best.map(|(candidate, proj)| Nearest {
        street_id: candidate.street.id,
        dist: candidate.line.distance_along(&proj),
        proj,
    })
}
