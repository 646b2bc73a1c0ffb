#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Build-time pipeline for address interpolation.
//!
//! # Stages
//!
//! 1. **Augmentation** ([`augment::augment_street`]): every raw address of
//!    a street batch is attributed to its nearest street, projected onto
//!    the centerline, and assigned a side (`L`/`R`).
//! 2. **Vertex synthesis** ([`vertices::synthesize_vertices`]): once all
//!    records of a street are stored, footprint corners become `POLYGON`
//!    records, the street's numbering scheme is classified, and synthetic
//!    `VERTEX` records are generated at every geometry vertex.
//!
//! Both stages are pure functions from an input batch to output records;
//! persistence is left to the caller. [`runner::run_batches`] fans
//! independent batches out over blocking workers.

pub mod analyze;
pub mod augment;
pub mod runner;
pub mod vertices;

pub use augment::augment_street;
pub use runner::run_batches;
pub use vertices::{VertexSynthesis, synthesize_vertices};

/// Per-record build failures.
///
/// These never abort a batch: the offending address is logged and
/// skipped.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The house number could not be parsed.
    #[error("could not reliably parse housenumber '{number}' for address {source_id}")]
    Parse {
        /// Identifier of the address.
        source_id: String,
        /// The raw house number token.
        number: String,
    },

    /// No candidate street geometry was available.
    #[error("unable to find nearest street for address {source_id}")]
    Attribution {
        /// Identifier of the address.
        source_id: String,
    },
}

/// Errors from running the build pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A worker task panicked or was cancelled.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The output sink rejected a batch.
    #[error("Sink error: {0}")]
    Sink(String),
}
