#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the address interpolation engine.
//!
//! `build` augments JSON-lines street batches into the store, `vertices`
//! adds synthetic calibration records per street, `search` resolves one
//! address, and `stats` summarizes the store.
//!
//! Uses `indicatif-log-bridge` (via [`progress::init_logger`]) to route
//! `log` output through `indicatif::MultiProgress` so that log lines and
//! progress bars never fight for the terminal.

mod commands;
mod config;
mod progress;

use std::path::PathBuf;

use address_interpolation_resolver::Coordinate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "address_interpolation",
    about = "Address interpolation build and query tool"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// `DuckDB` store path (overrides the config file)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Augment street batches and write them to the store
    Build {
        /// JSON-lines file of street batches from the spatial join
        #[arg(long)]
        input: PathBuf,
        /// Number of batches processed concurrently
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Detect numbering schemes and synthesize vertex records
    Vertices,
    /// Resolve an address near a coordinate
    Search {
        /// Latitude of the coordinate hint
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude of the coordinate hint
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// House number, e.g. "12" or "12b"
        #[arg(long)]
        number: String,
        /// Street name
        #[arg(long)]
        street: String,
    },
    /// Show record counts per source
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = progress::init_logger();
    let cli = Cli::parse();

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database.display().to_string();
    }

    match cli.command {
        Commands::Build { input, concurrency } => {
            if let Some(concurrency) = concurrency {
                config.build_concurrency = concurrency;
            }
            let summary = commands::build(&config, &input, &multi).await?;
            println!(
                "{} batch(es), {} street(s), {} record(s)",
                summary.batches, summary.streets, summary.records
            );
        }
        Commands::Vertices => {
            let written = commands::vertices(&config, &multi)?;
            println!("{written} synthetic record(s)");
        }
        Commands::Search {
            lat,
            lon,
            number,
            street,
        } => {
            let results = commands::search(&config, Coordinate { lat, lon }, &number, &street)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Stats => {
            let stats = commands::stats(&config)?;
            println!("Streets: {}", stats.streets);
            println!();
            println!("{:<20} RECORDS", "SOURCE");
            println!("{}", "-".repeat(30));
            for (source, count) in &stats.records_by_source {
                println!("{source:<20} {count}");
            }
        }
    }

    Ok(())
}
