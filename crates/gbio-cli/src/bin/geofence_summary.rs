//! Print the biodiversity summary for the geofence around one coordinate.

use anyhow::{Context, Result};
use clap::Parser;
use gbio_cli::logging::init_tracing;
use gbio_cli::{check_radius, GbioConfig};
use gbio_core::{geo, Aggregator, Coordinate, SpeciesCache};
use std::path::PathBuf;

/// Species richness and red list counts around a point
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (falls back to $GBIO_CONFIG, then config.yml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Center latitude (default: Kensal Green, London)
    #[arg(long, default_value_t = 51.530583299426304, allow_hyphen_values = true)]
    lat: f64,

    /// Center longitude
    #[arg(long, default_value_t = -0.2164985443965517, allow_hyphen_values = true)]
    lon: f64,

    /// Geofence half-width in km (overrides the config)
    #[arg(long)]
    radius_km: Option<f64>,

    /// Do not write fetched species back to the cache
    #[arg(long)]
    no_cache_write: bool,
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let config_path = GbioConfig::resolve_path(args.config);
    let config = GbioConfig::load(&config_path)
        .with_context(|| format!("Invalid configuration {}", config_path.display()))?;
    let client = config.client()?;

    let center = Coordinate::new(args.lat, args.lon)?;
    let radius_km = match args.radius_km {
        Some(radius_km) => check_radius("--radius-km", radius_km)?,
        None => config.query.radius_km,
    };
    tracing::info!("Geofence {}", geo::geofence(center, radius_km));

    let cache = SpeciesCache::load(&config.cache_path)?;
    let mut aggregator = Aggregator::new(&client, cache);

    let response = client.query_by_geofence(center, radius_km);
    let summary = aggregator.summarize(response.as_ref())?;

    match summary {
        Some(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
        None => {
            eprintln!("No GBIF data for {}", center);
        }
    }

    if !args.no_cache_write {
        aggregator.cache().persist(&config.cache_path)?;
    }
    Ok(())
}
