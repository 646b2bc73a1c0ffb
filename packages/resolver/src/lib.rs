#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query-time resolution of a house number on a named street near a
//! coordinate.
//!
//! Candidate records come from an [`AddressStore`]. The resolver tries,
//! in order:
//!
//! 1. an **exact** match on a real record's house number (accuracy 100),
//! 2. a **close** match on the same whole number, e.g. another apartment
//!    of the same building (accuracy 90),
//! 3. per side of the street, an **interpolated** position between the
//!    tightest pair of records bracketing the target number.
//!
//! The resolver is stateless and never writes to the store, so one
//! instance can serve any number of concurrent queries.

pub mod matching;
pub mod validate;

use address_interpolation_geometry::round_to;
use address_interpolation_models::{AddressRecord, MatchType, Parity, QueryResult};
use address_interpolation_store::{AddressStore, StoreError};

pub use validate::{Coordinate, ValidatedQuery, ValidationError};

/// Decimal places of returned coordinates.
pub const COORDINATE_PLACES: i32 = 7;

/// Errors returned by [`Resolver::resolve`].
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The caller's input was rejected before any lookup.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store query failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Resolves addresses against an [`AddressStore`].
pub struct Resolver<S> {
    store: S,
}

impl<S: AddressStore> Resolver<S> {
    /// Wraps a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolves `number` on `street` near `point`.
    ///
    /// Returns an empty list when nothing matches. Results are ordered by
    /// accuracy, highest first.
    ///
    /// # Errors
    ///
    /// * [`ResolveError::Validation`] if the coordinate, number, or street
    ///   is unusable. The store is not queried in that case.
    /// * [`ResolveError::Store`] if the store query fails.
    pub fn resolve(
        &self,
        point: Coordinate,
        number: &str,
        street: &str,
    ) -> Result<Vec<QueryResult>, ResolveError> {
        let query = validate::validate(point, number, street)?;

        let records = self
            .store
            .query_addresses(query.point.lon, query.point.lat, &query.names)?;

        log::debug!(
            "{} candidate record(s) for '{number}' on {:?}",
            records.len(),
            query.names
        );

        Ok(resolve_records(&records, &query))
    }
}

/// Runs the matching cascade over records already fetched from a store.
#[must_use]
pub fn resolve_records(records: &[AddressRecord], query: &ValidatedQuery) -> Vec<QueryResult> {
    if records.is_empty() {
        return Vec::new();
    }

    if let Some(record) = matching::exact_match(records, query.number) {
        return vec![point_result(record, MatchType::Exact, 100.0, &query.raw_number)];
    }

    if let Some(record) = matching::close_match(records, query.number) {
        return vec![point_result(record, MatchType::Close, 90.0, &query.raw_number)];
    }

    let mut results: Vec<QueryResult> = Parity::ALL
        .into_iter()
        .filter_map(|parity| {
            let side: Vec<&AddressRecord> = records.iter().filter(|r| r.parity == parity).collect();
            let segment = matching::tightest_segment(&side, query.number)?;
            let position = matching::interpolate(&segment, query.number);

            Some(QueryResult {
                match_type: MatchType::Interpolated,
                source: address_interpolation_models::MIXED_SOURCE.to_string(),
                source_id: None,
                number: query.raw_number.clone(),
                parity,
                accuracy: matching::parity_accuracy(&side, query.number),
                before: Some(segment.before.housenumber),
                after: Some(segment.after.housenumber),
                lat: round_to(position.y(), COORDINATE_PLACES),
                lon: round_to(position.x(), COORDINATE_PLACES),
            })
        })
        .collect();

    results.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
    results
}

fn point_result(
    record: &AddressRecord,
    match_type: MatchType,
    accuracy: f64,
    number: &str,
) -> QueryResult {
    QueryResult {
        match_type,
        source: record.source().to_string(),
        source_id: record.source_id().map(str::to_string),
        number: number.to_string(),
        parity: record.parity,
        accuracy,
        before: None,
        after: None,
        lat: round_to(record.lat.unwrap_or(record.proj_lat), COORDINATE_PLACES),
        lon: round_to(record.lon.unwrap_or(record.proj_lon), COORDINATE_PLACES),
    }
}
