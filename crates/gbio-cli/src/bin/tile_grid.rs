//! Print the tile centres of a square grid around a city centre as CSV.
//!
//! The `name` column is the file stem the tile exporter should use, so the
//! downloaded tiles can be fed straight into `build_dataset`.

use anyhow::Result;
use clap::Parser;
use gbio_cli::TileName;
use gbio_core::{geo, Coordinate};

/// Tile centres around a point (name, latitude, longitude)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Center latitude (default: Manchester)
    #[arg(long, default_value_t = 53.4808, allow_hyphen_values = true)]
    lat: f64,

    /// Center longitude
    #[arg(long, default_value_t = -2.2426, allow_hyphen_values = true)]
    lon: f64,

    /// Tile width in km
    #[arg(long, default_value_t = 1.5)]
    tile_width_km: f64,

    /// Tiles per side (odd recommended)
    #[arg(long, default_value_t = 14)]
    tiles_per_side: usize,

    /// File name prefix
    #[arg(long, default_value = "tile")]
    prefix: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let center = Coordinate::new(args.lat, args.lon)?;

    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["name", "latitude", "longitude"])?;
    for tile in geo::tile_grid(center, args.tile_width_km, args.tiles_per_side)? {
        writer.write_record([
            TileName::stem_for(&args.prefix, tile),
            tile.lat.to_string(),
            tile.lon.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
