//! Build-time writer for the `DuckDB` address store.
//!
//! Creates the schema, persists street geometries with their bounding
//! boxes and normalized names, and appends address records. The same
//! handle reads streets and records back for vertex synthesis.

use std::path::Path;

use address_interpolation_models::{
    AddressRecord, POLYGON_SOURCE, Scheme, StoreStats, StreetGeometry, VERTEX_SOURCE,
};
use duckdb::{Connection, Statement};
use geojson::GeoJson;

use crate::StoreError;
use crate::database::{RECORD_COLUMNS, read_record};
use crate::normalize;

const INSERT_RECORD: &str = "INSERT INTO address (id, source, source_id, housenumber, lon, lat,
     parity, proj_lon, proj_lat, proj_lon_left, proj_lat_left, proj_lon_right, proj_lat_right)
 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Read-write handle on the `DuckDB` store.
pub struct StoreWriter {
    conn: Connection,
}

impl StoreWriter {
    /// Opens (or creates) the store at `path` and ensures the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the connection or schema creation fails.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            crate::paths::ensure_dir(parent)?;
        }

        let conn = Connection::open(path)?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Inserts street geometries and their normalized names.
    ///
    /// Streets already present (the same street is a candidate in many
    /// batches) are left untouched. Returns the number of new streets.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if encoding or an insert fails.
    pub fn insert_streets(&mut self, streets: &[StreetGeometry]) -> Result<u64, StoreError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0u64;

        {
            let mut street_stmt = tx.prepare(
                "INSERT INTO street (id, line, min_x, max_x, min_y, max_y, scheme)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (id) DO NOTHING",
            )?;
            let mut name_stmt = tx.prepare(
                "INSERT INTO street_name (id, name) VALUES (?, ?)
                 ON CONFLICT (id, name) DO NOTHING",
            )?;

            for street in streets {
                let Some((min_x, max_x, min_y, max_y)) = bbox(&street.coordinates) else {
                    log::warn!("Skipping street {} with no coordinates", street.id);
                    continue;
                };

                let line = encode_line(&street.coordinates)?;
                let scheme = street.scheme.map(Scheme::as_str);
                let rows = street_stmt.execute(duckdb::params![
                    street.id, line, min_x, max_x, min_y, max_y, scheme,
                ])?;
                inserted += rows as u64;

                for name in &street.names {
                    for variant in normalize::street_variants(name) {
                        name_stmt.execute(duckdb::params![street.id, variant])?;
                    }
                }
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Appends address records in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if an insert fails.
    pub fn insert_records(&mut self, records: &[AddressRecord]) -> Result<u64, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare(INSERT_RECORD)?;
            for r in records {
                insert_record(&mut stmt, r)?;
            }
        }

        tx.commit()?;
        Ok(records.len() as u64)
    }

    /// Replaces a street's `VERTEX` and `POLYGON` records and stores its
    /// scheme, all in one transaction. Returns the number of records
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`] if a record is real or belongs
    /// to another street, or [`StoreError`] if a statement fails. The
    /// street is left unchanged on error.
    pub fn replace_synthetic(
        &mut self,
        id: i64,
        scheme: Scheme,
        records: &[AddressRecord],
    ) -> Result<u64, StoreError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM address WHERE id = ? AND source IN (?, ?)",
            duckdb::params![id, VERTEX_SOURCE, POLYGON_SOURCE],
        )?;
        tx.execute(
            "UPDATE street SET scheme = ? WHERE id = ?",
            duckdb::params![scheme.as_str(), id],
        )?;

        {
            let mut stmt = tx.prepare(INSERT_RECORD)?;
            for r in records {
                if r.id != id || !r.kind.is_synthetic() {
                    return Err(StoreError::InvalidRecord {
                        id,
                        message: format!("{} record of street {}", r.source(), r.id),
                    });
                }
                insert_record(&mut stmt, r)?;
            }
        }

        tx.commit()?;
        Ok(records.len() as u64)
    }

    /// Ids of all stored streets, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub fn street_ids(&self) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT id FROM street ORDER BY id")?;
        let mut rows = stmt.query([])?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }

    /// Reads one street geometry with its stored names.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails or the geometry is not a
    /// line.
    pub fn street(&self, id: i64) -> Result<Option<StreetGeometry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT line, scheme FROM street WHERE id = ?")?;
        let result = stmt.query_row([id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        });

        let (line, scheme) = match result {
            Ok(v) => v,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(StoreError::DuckDb(e)),
        };

        let mut stmt = self
            .conn
            .prepare("SELECT name FROM street_name WHERE id = ? ORDER BY name")?;
        let mut rows = stmt.query([id])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get(0)?);
        }

        Ok(Some(StreetGeometry {
            id,
            names,
            coordinates: decode_line(id, &line)?,
            scheme: scheme.as_deref().and_then(Scheme::from_str_tag),
        }))
    }

    /// All records of one street, in insertion-independent order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub fn records_for_street(&self, id: i64) -> Result<Vec<AddressRecord>, StoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM address a WHERE a.id = ?
             ORDER BY a.housenumber ASC, a.parity ASC, a.source ASC, a.proj_lon ASC, a.proj_lat ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(read_record(row)?);
        }
        Ok(records)
    }

    /// Counts streets and records per source.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a query fails.
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let streets: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM street", [], |row| row.get(0))?;

        let mut stmt = self
            .conn
            .prepare("SELECT source, COUNT(*) FROM address GROUP BY source ORDER BY source")?;
        let mut rows = stmt.query([])?;

        let mut records_by_source = Vec::new();
        while let Some(row) = rows.next()? {
            let source: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            records_by_source.push((source, count.unsigned_abs()));
        }

        Ok(StoreStats {
            streets: streets.unsigned_abs(),
            records_by_source,
        })
    }
}

fn insert_record(stmt: &mut Statement<'_>, r: &AddressRecord) -> Result<(), StoreError> {
    let fp = r.footprint;
    stmt.execute(duckdb::params![
        r.id,
        r.source(),
        r.source_id(),
        r.housenumber,
        r.lon,
        r.lat,
        r.parity.as_str(),
        r.proj_lon,
        r.proj_lat,
        fp.map(|f| f.proj_lon_left),
        fp.map(|f| f.proj_lat_left),
        fp.map(|f| f.proj_lon_right),
        fp.map(|f| f.proj_lat_right),
    ])?;
    Ok(())
}

fn create_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS street (
            id BIGINT PRIMARY KEY,
            line TEXT NOT NULL,
            min_x DOUBLE NOT NULL,
            max_x DOUBLE NOT NULL,
            min_y DOUBLE NOT NULL,
            max_y DOUBLE NOT NULL,
            scheme TEXT
        );
        CREATE TABLE IF NOT EXISTS street_name (
            id BIGINT NOT NULL,
            name TEXT NOT NULL,
            PRIMARY KEY (id, name)
        );
        CREATE TABLE IF NOT EXISTS address (
            id BIGINT NOT NULL,
            source TEXT NOT NULL,
            source_id TEXT,
            housenumber DOUBLE NOT NULL,
            lon DOUBLE,
            lat DOUBLE,
            parity TEXT NOT NULL,
            proj_lon DOUBLE NOT NULL,
            proj_lat DOUBLE NOT NULL,
            proj_lon_left DOUBLE,
            proj_lat_left DOUBLE,
            proj_lon_right DOUBLE,
            proj_lat_right DOUBLE
        );
        CREATE INDEX IF NOT EXISTS idx_address_id ON address(id);
        CREATE INDEX IF NOT EXISTS idx_street_name_name ON street_name(name);",
    )?;
    Ok(())
}

/// Bounding box of `[lon, lat]` pairs as `(min_x, max_x, min_y, max_y)`.
#[must_use]
pub fn bbox(coords: &[[f64; 2]]) -> Option<(f64, f64, f64, f64)> {
    let first = coords.first()?;
    let init = (first[0], first[0], first[1], first[1]);

    Some(coords.iter().fold(init, |(min_x, max_x, min_y, max_y), c| {
        (min_x.min(c[0]), max_x.max(c[0]), min_y.min(c[1]), max_y.max(c[1]))
    }))
}

/// Encodes `[lon, lat]` pairs as a `GeoJSON` `LineString`.
///
/// # Errors
///
/// Returns [`StoreError::Json`] if serialization fails.
pub fn encode_line(coords: &[[f64; 2]]) -> Result<String, StoreError> {
    let line: geo::LineString<f64> = coords.iter().map(|c| (c[0], c[1])).collect();
    let geometry = geojson::Geometry::new(geojson::Value::from(&line));
    Ok(serde_json::to_string(&geometry)?)
}

/// Decodes a `GeoJSON` `LineString` into `[lon, lat]` pairs.
///
/// # Errors
///
/// Returns [`StoreError`] if the text is not `GeoJSON` or not a line.
pub fn decode_line(id: i64, text: &str) -> Result<Vec<[f64; 2]>, StoreError> {
    let GeoJson::Geometry(geometry) = text.parse::<GeoJson>()? else {
        return Err(StoreError::Geometry {
            id,
            message: "not a bare geometry".to_string(),
        });
    };

    match geo::Geometry::<f64>::try_from(geometry)? {
        geo::Geometry::LineString(line) => Ok(line.coords().map(|c| [c.x, c.y]).collect()),
        other => Err(StoreError::Geometry {
            id,
            message: format!("expected LineString, found {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use address_interpolation_models::{FootprintProjection, Parity, RecordKind};

    use super::*;

    fn temp_db(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "address_interpolation_writer_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir.join("nested").join("store.duckdb")
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent().and_then(Path::parent) {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    fn street() -> StreetGeometry {
        StreetGeometry {
            id: 42,
            names: vec!["N Main St".to_string()],
            coordinates: vec![[-87.63, 41.88], [-87.62, 41.88], [-87.62, 41.89]],
            scheme: None,
        }
    }

    #[test]
    fn creates_parent_directories() {
        let path = temp_db("parents");
        StoreWriter::open(&path).unwrap();
        assert!(path.exists());
        cleanup(&path);
    }

    #[test]
    fn street_round_trips_with_normalized_names() {
        let path = temp_db("street");
        let mut writer = StoreWriter::open(&path).unwrap();

        assert_eq!(writer.insert_streets(&[street()]).unwrap(), 1);
        assert_eq!(writer.insert_streets(&[street()]).unwrap(), 0);
        assert_eq!(writer.street_ids().unwrap(), vec![42]);

        let stored = writer.street(42).unwrap().unwrap();
        assert_eq!(stored.coordinates, street().coordinates);
        assert_eq!(
            stored.names,
            vec!["N MAIN ST".to_string(), "NORTH MAIN STREET".to_string()]
        );
        assert!(stored.scheme.is_none());
        assert!(writer.street(7).unwrap().is_none());

        cleanup(&path);
    }

    #[test]
    fn scheme_is_persisted() {
        let path = temp_db("scheme");
        let mut writer = StoreWriter::open(&path).unwrap();
        writer.insert_streets(&[street()]).unwrap();

        writer.replace_synthetic(42, Scheme::Zigzag, &[]).unwrap();
        assert_eq!(writer.street(42).unwrap().unwrap().scheme, Some(Scheme::Zigzag));

        cleanup(&path);
    }

    fn real_record() -> AddressRecord {
        AddressRecord {
            id: 42,
            kind: RecordKind::Real {
                source: "OSM".to_string(),
                source_id: "way/9".to_string(),
            },
            housenumber: 12.0,
            parity: Parity::L,
            lon: Some(-87.625),
            lat: Some(41.8801),
            proj_lon: -87.625,
            proj_lat: 41.88,
            footprint: Some(FootprintProjection {
                proj_lon_left: -87.6249,
                proj_lat_left: 41.88,
                proj_lon_right: -87.6251,
                proj_lat_right: 41.88,
            }),
            dist: Some(414.0),
        }
    }

    fn vertex_record(housenumber: f64) -> AddressRecord {
        AddressRecord {
            kind: RecordKind::Vertex,
            housenumber,
            lon: None,
            lat: None,
            footprint: None,
            dist: None,
            ..real_record()
        }
    }

    #[test]
    fn records_round_trip_and_synthetic_records_can_be_replaced() {
        let path = temp_db("records");
        let mut writer = StoreWriter::open(&path).unwrap();
        writer.insert_streets(&[street()]).unwrap();

        let real = real_record();
        let vertex = vertex_record(20.5);
        let corner = AddressRecord {
            kind: RecordKind::Polygon,
            housenumber: 12.001,
            ..vertex_record(0.0)
        };

        writer
            .insert_records(&[vertex.clone(), real.clone(), corner])
            .unwrap();

        let stored = writer.records_for_street(42).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0], AddressRecord { dist: None, ..real.clone() });
        assert_eq!(stored[2], vertex);

        let replacement = vertex_record(30.0);
        assert_eq!(
            writer
                .replace_synthetic(42, Scheme::Updown, &[replacement.clone()])
                .unwrap(),
            1
        );

        let stored = writer.records_for_street(42).unwrap();
        assert_eq!(stored, vec![AddressRecord { dist: None, ..real }, replacement]);
        assert_eq!(writer.street(42).unwrap().unwrap().scheme, Some(Scheme::Updown));

        cleanup(&path);
    }

    #[test]
    fn failed_replacement_leaves_street_untouched() {
        let path = temp_db("rollback");
        let mut writer = StoreWriter::open(&path).unwrap();
        writer.insert_streets(&[street()]).unwrap();
        writer
            .replace_synthetic(42, Scheme::Zigzag, &[vertex_record(20.5)])
            .unwrap();

        let result = writer.replace_synthetic(
            42,
            Scheme::Updown,
            &[vertex_record(30.0), real_record()],
        );
        assert!(matches!(result, Err(StoreError::InvalidRecord { id: 42, .. })));

        let stored = writer.records_for_street(42).unwrap();
        assert_eq!(stored, vec![vertex_record(20.5)]);
        assert_eq!(writer.street(42).unwrap().unwrap().scheme, Some(Scheme::Zigzag));

        cleanup(&path);
    }

    #[test]
    fn stats_group_by_source() {
        let path = temp_db("stats");
        let mut writer = StoreWriter::open(&path).unwrap();
        writer.insert_streets(&[street()]).unwrap();

        let base = AddressRecord {
            id: 42,
            kind: RecordKind::Polygon,
            housenumber: 1.0,
            parity: Parity::R,
            lon: None,
            lat: None,
            proj_lon: -87.63,
            proj_lat: 41.88,
            footprint: None,
            dist: None,
        };
        writer
            .insert_records(&[
                base.clone(),
                base.clone(),
                AddressRecord {
                    kind: RecordKind::Vertex,
                    ..base
                },
            ])
            .unwrap();

        let stats = writer.stats().unwrap();
        assert_eq!(stats.streets, 1);
        assert_eq!(
            stats.records_by_source,
            vec![("POLYGON".to_string(), 2), ("VERTEX".to_string(), 1)]
        );

        cleanup(&path);
    }

    #[test]
    fn bbox_spans_all_coordinates() {
        assert_eq!(
            bbox(&[[1.0, 5.0], [-2.0, 3.0], [0.5, 7.0]]),
            Some((-2.0, 1.0, 3.0, 7.0))
        );
        assert!(bbox(&[]).is_none());
    }

    #[test]
    fn decode_rejects_non_line_geometry() {
        let point = r#"{"type":"Point","coordinates":[1.0,2.0]}"#;
        assert!(matches!(
            decode_line(3, point),
            Err(StoreError::Geometry { id: 3, .. })
        ));
        assert!(decode_line(3, "not json").is_err());
    }
}
