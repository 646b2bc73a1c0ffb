//! Read-only `DuckDB` address store.

use std::path::Path;
use std::sync::{Arc, Mutex};

use address_interpolation_models::{
    AddressRecord, FootprintProjection, InterpolationConfig, Parity, RecordKind,
};
use duckdb::Connection;

use crate::cache::{CacheKey, StatementCache};
use crate::{AddressStore, StoreError};

/// Columns selected for every [`AddressRecord`], in [`read_record`] order.
pub(crate) const RECORD_COLUMNS: &str = "a.id, a.source, a.source_id, a.housenumber, a.lon, \
     a.lat, a.parity, a.proj_lon, a.proj_lat, a.proj_lon_left, a.proj_lat_left, \
     a.proj_lon_right, a.proj_lat_right";

/// Address lookups against a `DuckDB` file opened read-only.
///
/// `duckdb::Connection` is `Send` but not `Sync`, so the connection is
/// kept behind a `Mutex` and each query runs on a clone of it.
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    identity: String,
    cache: Arc<StatementCache>,
    max_names: usize,
    max_matches: usize,
}

impl DuckDbStore {
    /// Opens the store at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be opened.
    pub fn open(
        path: &Path,
        config: &InterpolationConfig,
        cache: Arc<StatementCache>,
    ) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            duckdb::Config::default().access_mode(duckdb::AccessMode::ReadOnly)?,
        )?;

        log::debug!("Opened address store {} read-only", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            identity: path.display().to_string(),
            cache,
            max_names: config.max_names,
            max_matches: config.max_matches,
        })
    }

    fn connection(&self) -> Result<Connection, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(conn.try_clone()?)
    }
}

impl AddressStore for DuckDbStore {
    fn query_addresses(
        &self,
        lon: f64,
        lat: f64,
        names: &[String],
    ) -> Result<Vec<AddressRecord>, StoreError> {
        let name_count = names.len().min(self.max_names);
        if name_count == 0 {
            return Ok(Vec::new());
        }

        let key = CacheKey {
            store: self.identity.clone(),
            name_count,
        };
        let sql = self
            .cache
            .get_or_insert_with(key, || address_query_sql(name_count, self.max_matches));

        let conn = self.connection()?;
        let mut stmt = conn.prepare(&sql)?;

        stmt.raw_bind_parameter(1, lon)?;
        stmt.raw_bind_parameter(2, lon)?;
        stmt.raw_bind_parameter(3, lat)?;
        stmt.raw_bind_parameter(4, lat)?;
        for (i, name) in names.iter().take(name_count).enumerate() {
            stmt.raw_bind_parameter(i + 5, name)?;
        }

        stmt.raw_execute()?;
        let mut rows = stmt.raw_query();

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(read_record(row)?);
        }

        log::trace!(
            "{} record(s) near ({lon}, {lat}) for {name_count} name(s)",
            records.len()
        );

        Ok(records)
    }
}

/// Builds the address query for `name_count` name conditions.
///
/// Parameters: `lon, lon, lat, lat`, then one per name.
#[must_use]
pub fn address_query_sql(name_count: usize, max_matches: usize) -> String {
    let names = vec!["n.name = ?"; name_count.max(1)].join(" OR ");

    format!(
        "SELECT {RECORD_COLUMNS}
         FROM address a
         WHERE a.id IN (
             SELECT s.id FROM street s
             JOIN street_name n ON n.id = s.id
             WHERE s.min_x <= ? AND s.max_x >= ?
               AND s.min_y <= ? AND s.max_y >= ?
               AND ({names})
         )
         ORDER BY a.housenumber ASC, a.id ASC, a.parity ASC, a.source ASC,
                  a.proj_lon ASC, a.proj_lat ASC
         LIMIT {max_matches}"
    )
}

/// Reads one row selected with [`RECORD_COLUMNS`].
pub(crate) fn read_record(row: &duckdb::Row<'_>) -> Result<AddressRecord, StoreError> {
    let source: String = row.get(1)?;
    let source_id: Option<String> = row.get(2)?;
    let parity: String = row.get(6)?;
    let parity = Parity::from_str_tag(&parity)
        .ok_or_else(|| StoreError::Decode(format!("unknown parity '{parity}'")))?;

    let left: (Option<f64>, Option<f64>) = (row.get(9)?, row.get(10)?);
    let right: (Option<f64>, Option<f64>) = (row.get(11)?, row.get(12)?);
    let footprint = match (left, right) {
        ((Some(lon_l), Some(lat_l)), (Some(lon_r), Some(lat_r))) => Some(FootprintProjection {
            proj_lon_left: lon_l,
            proj_lat_left: lat_l,
            proj_lon_right: lon_r,
            proj_lat_right: lat_r,
        }),
        _ => None,
    };

    Ok(AddressRecord {
        id: row.get(0)?,
        kind: RecordKind::from_columns(&source, source_id),
        housenumber: row.get(3)?,
        parity,
        lon: row.get(4)?,
        lat: row.get(5)?,
        proj_lon: row.get(7)?,
        proj_lat: row.get(8)?,
        footprint,
        dist: None,
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use address_interpolation_models::StreetGeometry;

    use super::*;
    use crate::normalize;
    use crate::writer::StoreWriter;

    fn temp_db(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "address_interpolation_store_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("store.duckdb")
    }

    fn record(id: i64, housenumber: f64, parity: Parity, lon: f64) -> AddressRecord {
        AddressRecord {
            id,
            kind: RecordKind::Real {
                source: "OA".to_string(),
                source_id: format!("{id}-{housenumber}"),
            },
            housenumber,
            parity,
            lon: Some(lon),
            lat: Some(0.0001),
            proj_lon: lon,
            proj_lat: 0.0,
            footprint: None,
            dist: None,
        }
    }

    fn seed(path: &Path) {
        let mut writer = StoreWriter::open(path).unwrap();
        writer
            .insert_streets(&[
                StreetGeometry {
                    id: 1,
                    names: vec!["Main St".to_string()],
                    coordinates: vec![[0.0, 0.0], [0.002, 0.0]],
                    scheme: None,
                },
                StreetGeometry {
                    id: 2,
                    names: vec!["Elm Street".to_string()],
                    coordinates: vec![[0.0, 0.0], [0.0, 0.002]],
                    scheme: None,
                },
            ])
            .unwrap();

        let mut vertex = record(1, 4.0, Parity::R, 0.001);
        vertex.kind = RecordKind::Vertex;
        vertex.lon = None;
        vertex.lat = None;

        writer
            .insert_records(&[
                record(1, 9.0, Parity::L, 0.0018),
                record(1, 1.0, Parity::L, 0.0002),
                vertex,
                record(2, 3.0, Parity::R, 0.0),
            ])
            .unwrap();
    }

    fn open(path: &Path, cache: Arc<StatementCache>) -> DuckDbStore {
        DuckDbStore::open(path, &InterpolationConfig::default(), cache).unwrap()
    }

    #[test]
    fn returns_records_of_matching_street_sorted_by_number() {
        let path = temp_db("sorted");
        seed(&path);
        let store = open(&path, Arc::new(StatementCache::new()));

        let names = normalize::street_variants("main street");
        let records = store.query_addresses(0.001, 0.0, &names).unwrap();

        let numbers: Vec<f64> = records.iter().map(|r| r.housenumber).collect();
        assert_eq!(numbers, vec![1.0, 4.0, 9.0]);
        assert!(records.iter().all(|r| r.id == 1));
        assert_eq!(records[1].kind, RecordKind::Vertex);
        assert!(records[1].lon.is_none());
        assert_eq!(records[0].source_id(), Some("1-1"));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn point_outside_bounding_box_matches_nothing() {
        let path = temp_db("outside");
        seed(&path);
        let store = open(&path, Arc::new(StatementCache::new()));

        let names = normalize::street_variants("Main St");
        assert!(store.query_addresses(1.0, 1.0, &names).unwrap().is_empty());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn empty_names_match_nothing() {
        let path = temp_db("empty_names");
        seed(&path);
        let store = open(&path, Arc::new(StatementCache::new()));

        assert!(store.query_addresses(0.001, 0.0, &[]).unwrap().is_empty());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn statements_are_cached_per_name_count() {
        let path = temp_db("cache");
        seed(&path);
        let cache = Arc::new(StatementCache::new());
        let store = open(&path, Arc::clone(&cache));

        store
            .query_addresses(0.001, 0.0, &["MAIN STREET".to_string()])
            .unwrap();
        store
            .query_addresses(0.0, 0.001, &["ELM STREET".to_string()])
            .unwrap();
        assert_eq!(cache.len(), 1);

        store
            .query_addresses(
                0.001,
                0.0,
                &["MAIN STREET".to_string(), "MAIN ST".to_string()],
            )
            .unwrap();
        assert_eq!(cache.len(), 2);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn query_sql_has_one_condition_per_name() {
        let sql = address_query_sql(3, 5000);
        assert_eq!(sql.matches("n.name = ?").count(), 3);
        assert!(sql.contains("LIMIT 5000"));
        assert!(sql.contains("ORDER BY a.housenumber ASC"));
    }
}
