//! In-memory address store backed by an R-tree of street bounding boxes.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use address_interpolation_models::{AddressRecord, InterpolationConfig, StreetGeometry};
use rstar::{AABB, RTree, RTreeObject};

use crate::writer::bbox;
use crate::{AddressStore, StoreError, normalize};

/// A street's bounding box and normalized names stored in the R-tree.
struct StreetEntry {
    id: i64,
    names: BTreeSet<String>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for StreetEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Address lookups over streets and records held in memory.
///
/// Behaves like [`crate::DuckDbStore`]: same bounding-box and name
/// filter, same ordering, same limits.
pub struct MemoryStore {
    streets: RTree<StreetEntry>,
    records: BTreeMap<i64, Vec<AddressRecord>>,
    max_names: usize,
    max_matches: usize,
}

impl MemoryStore {
    /// Indexes `streets` and groups `records` by street id.
    ///
    /// Streets without coordinates are skipped.
    #[must_use]
    pub fn new(
        streets: &[StreetGeometry],
        records: impl IntoIterator<Item = AddressRecord>,
        config: &InterpolationConfig,
    ) -> Self {
        let entries: Vec<StreetEntry> = streets
            .iter()
            .filter_map(|street| {
                let (min_x, max_x, min_y, max_y) = bbox(&street.coordinates)?;
                Some(StreetEntry {
                    id: street.id,
                    names: street
                        .names
                        .iter()
                        .flat_map(|name| normalize::street_variants(name))
                        .collect(),
                    envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
                })
            })
            .collect();

        let mut grouped: BTreeMap<i64, Vec<AddressRecord>> = BTreeMap::new();
        for record in records {
            grouped.entry(record.id).or_default().push(record);
        }

        log::debug!(
            "Indexed {} street(s) with records for {} street(s)",
            entries.len(),
            grouped.len()
        );

        Self {
            streets: RTree::bulk_load(entries),
            records: grouped,
            max_names: config.max_names,
            max_matches: config.max_matches,
        }
    }
}

impl AddressStore for MemoryStore {
    fn query_addresses(
        &self,
        lon: f64,
        lat: f64,
        names: &[String],
    ) -> Result<Vec<AddressRecord>, StoreError> {
        let names = &names[..names.len().min(self.max_names)];
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let query_env = AABB::from_point([lon, lat]);
        let ids: BTreeSet<i64> = self
            .streets
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| names.iter().any(|n| entry.names.contains(n)))
            .map(|entry| entry.id)
            .collect();

        let mut matched: Vec<AddressRecord> = ids
            .iter()
            .filter_map(|id| self.records.get(id))
            .flatten()
            .cloned()
            .collect();

        matched.sort_by(record_order);
        matched.truncate(self.max_matches);

        Ok(matched)
    }
}

/// House number ascending, then the same tie-breaks the `DuckDB` query
/// uses.
fn record_order(a: &AddressRecord, b: &AddressRecord) -> Ordering {
    a.housenumber
        .total_cmp(&b.housenumber)
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.parity.as_str().cmp(b.parity.as_str()))
        .then_with(|| a.source().cmp(b.source()))
        .then_with(|| a.proj_lon.total_cmp(&b.proj_lon))
        .then_with(|| a.proj_lat.total_cmp(&b.proj_lat))
}
