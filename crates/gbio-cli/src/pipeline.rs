//! Per-city, per-tile dataset driver.
//!
//! Input layout is `<input_root>/<city>/<tile files>`; output is one CSV per
//! city in `csv_dir`. A tile that yields no summary is logged and skipped; the
//! batch carries on. Rows already in a city CSV are kept, so a rerun only
//! queries the tiles still missing from it.

use gbio_core::{Aggregator, Coordinate, SpeciesCache, SpeciesSource, SummaryRecord};
use gbio_gbif::OccurrenceClient;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dataset::{io_error, read_rows, write_rows, DatasetRow, Result, TileName};

/// Geofenced occurrence search, abstracted for the driver.
pub trait OccurrenceSearch {
    fn query_by_geofence(&self, center: Coordinate, radius_km: f64) -> Option<Value>;
}

impl OccurrenceSearch for OccurrenceClient {
    fn query_by_geofence(&self, center: Coordinate, radius_km: f64) -> Option<Value> {
        OccurrenceClient::query_by_geofence(self, center, radius_km)
    }
}

impl<T: OccurrenceSearch + ?Sized> OccurrenceSearch for &T {
    fn query_by_geofence(&self, center: Coordinate, radius_km: f64) -> Option<Value> {
        (**self).query_by_geofence(center, radius_km)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub radius_km: f64,
    /// Discard existing city CSVs and query every tile again
    pub override_existing: bool,
    /// City directory names to leave out
    pub skip: Vec<String>,
    pub cache_path: PathBuf,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            radius_km: 1.0,
            override_existing: false,
            skip: Vec::new(),
            cache_path: PathBuf::from("data/species_cache.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityReport {
    pub city: String,
    pub csv_path: PathBuf,
    pub tiles: usize,
    /// Rows in the written CSV
    pub rows: usize,
    /// Rows carried over from an earlier run
    pub reused: usize,
    /// Tiles without a row after this run
    pub skipped: usize,
}

pub struct Pipeline<'a, C> {
    search: &'a C,
    aggregator: Aggregator<&'a C>,
    options: PipelineOptions,
    persisted_len: usize,
}

impl<'a, C> Pipeline<'a, C>
where
    C: OccurrenceSearch + SpeciesSource,
{
    pub fn new(client: &'a C, cache: SpeciesCache, options: PipelineOptions) -> Self {
        let persisted_len = cache.len();
        Self {
            search: client,
            aggregator: Aggregator::new(client, cache),
            options,
            persisted_len,
        }
    }

    pub fn cache(&self) -> &SpeciesCache {
        self.aggregator.cache()
    }

    /// Write the species cache if it grew since the last checkpoint.
    pub fn checkpoint(&mut self) -> Result<()> {
        let len = self.aggregator.cache().len();
        if len != self.persisted_len {
            self.aggregator.cache().persist(&self.options.cache_path)?;
            self.persisted_len = len;
        }
        Ok(())
    }

    /// Query and summarize the geofence around one coordinate.
    ///
    /// `None` covers both a failed query and a response of unexpected shape;
    /// both are logged.
    pub fn summarize_at(&mut self, center: Coordinate) -> Option<SummaryRecord> {
        let response = self.search.query_by_geofence(center, self.options.radius_km);
        match self.aggregator.summarize(response.as_ref()) {
            Ok(Some(summary)) => Some(summary),
            Ok(None) => {
                tracing::info!("No GBIF data for {}", center);
                None
            }
            Err(err) => {
                tracing::error!("Cannot summarize GBIF response for {}: {}", center, err);
                None
            }
        }
    }

    /// Process one city directory and write `<csv_dir>/<city>.csv`.
    ///
    /// Tiles that already have a row in the city CSV are not queried again
    /// unless `override_existing` is set.
    pub fn process_city(&mut self, city_dir: &Path, csv_dir: &Path) -> Result<CityReport> {
        let city = dir_name(city_dir);
        let csv_path = csv_dir.join(format!("{}.csv", city));
        let tiles = list_visible(city_dir, |p| p.is_file())?;

        let mut rows = if !self.options.override_existing && csv_path.exists() {
            read_rows(&csv_path)?
        } else {
            Vec::new()
        };
        let reused = rows.len();
        let done: HashSet<String> = rows.iter().map(|r| r.full_name.clone()).collect();

        let pending: Vec<&PathBuf> = tiles
            .iter()
            .filter(|p| !done.contains(&dir_name(p)))
            .collect();
        if pending.is_empty() && csv_path.exists() && !self.options.override_existing {
            tracing::info!("City {} already processed ({})", city, csv_path.display());
            return Ok(CityReport {
                city,
                csv_path,
                tiles: tiles.len(),
                rows: reused,
                reused,
                skipped: 0,
            });
        }

        tracing::info!(
            "Processing city {} ({} of {} tiles pending)",
            city,
            pending.len(),
            tiles.len()
        );
        let mut skipped = 0usize;

        for tile_path in pending {
            let file_name = dir_name(tile_path);
            let tile = match TileName::parse(&file_name) {
                Ok(tile) => tile,
                Err(err) => {
                    tracing::warn!("Skipping {}: {}", tile_path.display(), err);
                    skipped += 1;
                    continue;
                }
            };

            match self.summarize_at(tile.coordinate) {
                Some(summary) => rows.push(DatasetRow::new(&tile, &city, summary)),
                None => skipped += 1,
            }
            self.checkpoint()?;
        }

        rows.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        write_rows(&csv_path, &rows)?;
        Ok(CityReport {
            city,
            csv_path,
            tiles: tiles.len(),
            rows: rows.len(),
            reused,
            skipped,
        })
    }

    /// Process every city directory under `input_root`.
    pub fn process_all(&mut self, input_root: &Path, csv_dir: &Path) -> Result<Vec<CityReport>> {
        fs::create_dir_all(csv_dir).map_err(io_error(csv_dir))?;
        let cities = list_visible(input_root, |p| p.is_dir())?;

        let mut reports = Vec::new();
        for city_dir in cities {
            let city = dir_name(&city_dir);
            if self.options.skip.iter().any(|s| *s == city) {
                tracing::info!("Skipping city {}", city);
                continue;
            }
            let report = self.process_city(&city_dir, csv_dir)?;
            tracing::info!(
                "City {}: {} rows from {} tiles ({} reused, {} skipped)",
                report.city,
                report.rows,
                report.tiles,
                report.reused,
                report.skipped
            );
            reports.push(report);
        }

        self.checkpoint()?;
        Ok(reports)
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Sorted non-hidden entries of `dir` matching `keep`.
fn list_visible(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_error(dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| !dir_name(p).starts_with('.'))
        .filter(|p| keep(p.as_path()))
        .collect();
    entries.sort();
    Ok(entries)
}
