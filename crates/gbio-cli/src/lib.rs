//! gbio CLI - dataset assembly for geofenced biodiversity statistics.
//!
//! Binaries:
//! - build_dataset: per-city tile iteration, GBIF summaries, CSV output
//! - geofence_summary: summary for a single coordinate
//! - tile_grid: tile centres around a city centre
//! - combine_csvs: merge per-city CSVs into one table

pub mod config;
pub mod dataset;
pub mod logging;
pub mod pipeline;

pub use config::{check_radius, Endpoints, GbioConfig};
pub use dataset::{DatasetRow, TileName};
pub use pipeline::{OccurrenceSearch, Pipeline, PipelineOptions};
