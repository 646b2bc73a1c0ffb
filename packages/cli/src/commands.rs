//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use address_interpolation_build::{BuildError, augment_street, run_batches, synthesize_vertices};
use address_interpolation_models::{
    AddressRecord, InterpolationConfig, QueryResult, StoreStats, StreetBatch, StreetGeometry,
};
use address_interpolation_resolver::{Coordinate, ResolveError, Resolver};
use address_interpolation_store::{DuckDbStore, StatementCache, StoreError, StoreWriter};
use indicatif::MultiProgress;

use crate::progress;

/// Errors from running a subcommand.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line of the batch input is not a valid street batch.
    #[error("Invalid street batch on line {line}: {source}")]
    Batch {
        /// 1-based input line number.
        line: usize,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Build pipeline error.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Resolver error.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Totals of a `build` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Street batches processed.
    pub batches: u64,
    /// Street geometries newly stored.
    pub streets: u64,
    /// Address records written.
    pub records: u64,
}

/// Parses JSON-lines street batches. Blank lines are skipped.
///
/// # Errors
///
/// Returns [`CommandError::Batch`] for the first malformed line.
pub fn parse_batches(text: &str) -> Result<Vec<StreetBatch>, CommandError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| CommandError::Batch {
                line: i + 1,
                source,
            })
        })
        .collect()
}

/// Augments every street batch in `input` and writes streets and records
/// to the store.
///
/// # Errors
///
/// Returns [`CommandError`] if the input cannot be read or a write fails.
pub async fn build(
    config: &InterpolationConfig,
    input: &Path,
    multi: &MultiProgress,
) -> Result<BuildSummary, CommandError> {
    let start = Instant::now();

    let reading = progress::spinner(multi, &format!("Reading {}", input.display()));
    let text = tokio::fs::read_to_string(input).await?;
    let batches = parse_batches(&text)?;
    reading.finish_and_clear();

    log::info!(
        "Building from {} street batch(es) with concurrency {}",
        batches.len(),
        config.build_concurrency
    );

    let mut writer = StoreWriter::open(Path::new(&config.database))?;
    let bar = progress::steps_bar(multi, "Augmenting streets", batches.len() as u64);
    let mut streets_written = 0u64;
    let mut records_written = 0u64;

    let processed = run_batches(
        batches,
        config.build_concurrency,
        |batch: StreetBatch| {
            let records = augment_street(&batch);
            (batch.streets, records)
        },
        |(streets, records): (Vec<StreetGeometry>, Vec<AddressRecord>)| {
            streets_written += writer.insert_streets(&streets)?;
            records_written += writer.insert_records(&records)?;
            bar.inc(1);
            Ok::<(), CommandError>(())
        },
    )
    .await?;

    let summary = BuildSummary {
        batches: processed,
        streets: streets_written,
        records: records_written,
    };

    bar.finish_with_message("Augmented streets");

    log::info!(
        "Wrote {} street(s) and {} record(s) in {:.1}s",
        summary.streets,
        summary.records,
        start.elapsed().as_secs_f64()
    );

    Ok(summary)
}

/// Rebuilds every stored street's `POLYGON` corners and `VERTEX` records
/// and classifies its scheme, one transaction per street. Returns the
/// number of synthetic records written.
///
/// # Errors
///
/// Returns [`CommandError`] if a store read or write fails.
pub fn vertices(config: &InterpolationConfig, multi: &MultiProgress) -> Result<u64, CommandError> {
    let start = Instant::now();
    let mut writer = StoreWriter::open(Path::new(&config.database))?;

    let ids = writer.street_ids()?;
    let bar = progress::steps_bar(multi, "Synthesizing vertices", ids.len() as u64);
    let mut written = 0u64;

    for id in ids {
        bar.inc(1);

        let Some(street) = writer.street(id)? else {
            continue;
        };

        let records = writer.records_for_street(id)?;
        if records.iter().all(|r| r.kind.is_synthetic()) {
            continue;
        }

        let synthesis = synthesize_vertices(&street, &records);
        let scheme = synthesis.scheme;
        written += writer.replace_synthetic(id, scheme, &synthesis.into_records())?;
    }

    bar.finish_with_message("Synthesized vertices");

    log::info!(
        "Wrote {written} synthetic record(s) in {:.1}s",
        start.elapsed().as_secs_f64()
    );

    Ok(written)
}

/// Resolves one address against the store, opened read-only.
///
/// # Errors
///
/// Returns [`CommandError`] if the store cannot be opened, the input is
/// invalid, or the query fails.
pub fn search(
    config: &InterpolationConfig,
    point: Coordinate,
    number: &str,
    street: &str,
) -> Result<Vec<QueryResult>, CommandError> {
    let store = DuckDbStore::open(
        Path::new(&config.database),
        config,
        Arc::new(StatementCache::new()),
    )?;
    let resolver = Resolver::new(store);

    Ok(resolver.resolve(point, number, street)?)
}

/// Counts streets and records per source.
///
/// # Errors
///
/// Returns [`CommandError`] if the store cannot be read.
pub fn stats(config: &InterpolationConfig) -> Result<StoreStats, CommandError> {
    let writer = StoreWriter::open(Path::new(&config.database))?;
    Ok(writer.stats()?)
}
