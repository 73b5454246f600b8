//! Build the biodiversity dataset for a directory of satellite tiles.
//!
//! Expects `<input>/<city>/<prefix>_<lat>_<lon>.<ext>` and writes one CSV per
//! city, optionally combined into a single table at the end.

use anyhow::{Context, Result};
use clap::Parser;
use gbio_cli::dataset::combine_csvs;
use gbio_cli::logging::init_tracing;
use gbio_cli::{check_radius, GbioConfig, Pipeline, PipelineOptions};
use gbio_core::SpeciesCache;
use std::path::PathBuf;

/// Query GBIF around every tile and write per-city biodiversity CSVs
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (falls back to $GBIO_CONFIG, then config.yml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory with one sub-directory of tiles per city
    #[arg(long)]
    input: PathBuf,

    /// Directory for the per-city CSV files
    #[arg(long, default_value = "data/csv")]
    csv_dir: PathBuf,

    /// Also write all cities into this single CSV
    #[arg(long)]
    combined: Option<PathBuf>,

    /// Species cache file (overrides the config)
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Geofence half-width in km (overrides the config)
    #[arg(long)]
    radius_km: Option<f64>,

    /// Rebuild cities that already have a CSV
    #[arg(long = "override")]
    override_existing: bool,

    /// City to leave out (repeatable)
    #[arg(long)]
    skip: Vec<String>,
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let config_path = GbioConfig::resolve_path(args.config);
    let config = GbioConfig::load(&config_path)
        .with_context(|| format!("Invalid configuration {}", config_path.display()))?;
    let client = config.client()?;

    let cache_path = args.cache.unwrap_or_else(|| config.cache_path.clone());
    let cache = SpeciesCache::load(&cache_path)?;

    let radius_km = match args.radius_km {
        Some(radius_km) => check_radius("--radius-km", radius_km)?,
        None => config.query.radius_km,
    };

    let options = PipelineOptions {
        radius_km,
        override_existing: args.override_existing,
        skip: args.skip,
        cache_path,
    };

    tracing::info!("Building dataset from {}", args.input.display());
    let mut pipeline = Pipeline::new(&client, cache, options);
    let reports = pipeline
        .process_all(&args.input, &args.csv_dir)
        .context("Dataset build failed")?;

    let rows: usize = reports.iter().map(|r| r.rows).sum();
    tracing::info!(
        "Processed {} cities, {} rows, {} species cached",
        reports.len(),
        rows,
        pipeline.cache().len()
    );

    if let Some(combined) = args.combined {
        combine_csvs(&args.csv_dir, &combined)?;
    }

    Ok(())
}
