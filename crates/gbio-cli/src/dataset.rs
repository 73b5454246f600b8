//! Tile naming and the tabular dataset written per city.

use gbio_core::{Coordinate, CoreError, RedlistCategory, SummaryRecord};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const INDEX_COLUMN: &str = "id";

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("tile name '{0}' is not <prefix>_<lat>_<lon>.<ext>")]
    TileName(String),

    #[error("{path} row {row}: {reason}")]
    MalformedRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, DatasetError>;

pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DatasetError + '_ {
    move |source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A satellite tile file named `<prefix>_<lat>_<lon>.<ext>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileName {
    pub full_name: String,
    pub prefix: String,
    pub coordinate: Coordinate,
}

impl TileName {
    pub fn parse(file_name: &str) -> Result<Self> {
        let bad = || DatasetError::TileName(file_name.to_string());

        // a numeric suffix is part of the longitude, not an extension
        let stem = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphabetic()) => {
                stem
            }
            _ => file_name,
        };
        let mut parts = stem.rsplitn(3, '_');
        let lon = parts.next().ok_or_else(bad)?;
        let lat = parts.next().ok_or_else(bad)?;
        let prefix = parts.next().ok_or_else(bad)?;

        let lat: f64 = lat.parse().map_err(|_| bad())?;
        let lon: f64 = lon.parse().map_err(|_| bad())?;

        Ok(Self {
            full_name: file_name.to_string(),
            prefix: prefix.to_string(),
            coordinate: Coordinate::new(lat, lon)?,
        })
    }

    /// File stem the tile exporter uses for a tile centre.
    pub fn stem_for(prefix: &str, center: Coordinate) -> String {
        format!("{}_{}_{}", prefix, center.lat, center.lon)
    }
}

/// One output row: tile metadata plus the geofence summary.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub full_name: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub summary: SummaryRecord,
}

impl DatasetRow {
    pub fn new(tile: &TileName, city: &str, summary: SummaryRecord) -> Self {
        Self {
            full_name: tile.full_name.clone(),
            city: city.to_string(),
            latitude: tile.coordinate.lat,
            longitude: tile.coordinate.lon,
            summary,
        }
    }

    pub fn headers() -> Vec<String> {
        let mut headers: Vec<String> = ["full_name", "city", "latitude", "longitude"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        headers.push("species_richness".to_string());
        headers.extend(
            RedlistCategory::ALL
                .iter()
                .map(|c| format!("redlist_{}", c.code())),
        );
        headers.push("unresolved".to_string());
        headers
    }

    /// Rebuild a row from a dataset CSV record, looking columns up by name.
    pub fn from_record(
        headers: &csv::StringRecord,
        record: &csv::StringRecord,
    ) -> std::result::Result<Self, String> {
        let count = |name: &str| -> std::result::Result<u64, String> {
            let value = column(headers, record, name)?;
            value
                .parse()
                .map_err(|_| format!("{} '{}' is not a count", name, value))
        };
        let degrees = |name: &str| -> std::result::Result<f64, String> {
            let value = column(headers, record, name)?;
            value
                .parse()
                .map_err(|_| format!("{} '{}' is not a number", name, value))
        };

        let mut summary = SummaryRecord {
            species_richness: count("species_richness")?,
            unresolved: count("unresolved")?,
            ..SummaryRecord::default()
        };
        for category in RedlistCategory::ALL {
            summary.set_count(category, count(&format!("redlist_{}", category.code()))?);
        }

        Ok(Self {
            full_name: column(headers, record, "full_name")?.to_string(),
            city: column(headers, record, "city")?.to_string(),
            latitude: degrees("latitude")?,
            longitude: degrees("longitude")?,
            summary,
        })
    }

    pub fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.full_name.clone(),
            self.city.clone(),
            self.latitude.to_string(),
            self.longitude.to_string(),
            self.summary.species_richness.to_string(),
        ];
        fields.extend(
            RedlistCategory::ALL
                .iter()
                .map(|c| self.summary.count(*c).to_string()),
        );
        fields.push(self.summary.unresolved.to_string());
        fields
    }
}

fn column<'r>(
    headers: &csv::StringRecord,
    record: &'r csv::StringRecord,
    name: &str,
) -> std::result::Result<&'r str, String> {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|i| record.get(i))
        .ok_or_else(|| format!("missing column {}", name))
}

/// Rows of a CSV previously written by [`write_rows`].
pub fn read_rows(path: &Path) -> Result<Vec<DatasetRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let parsed = DatasetRow::from_record(&headers, &record).map_err(|reason| {
            DatasetError::MalformedRow {
                path: path.to_path_buf(),
                row,
                reason,
            }
        })?;
        rows.push(parsed);
    }
    Ok(rows)
}

/// Write rows with a leading `id` index column.
pub fn write_rows(path: &Path, rows: &[DatasetRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec![INDEX_COLUMN.to_string()];
    header.extend(DatasetRow::headers());
    writer.write_record(&header)?;

    for (id, row) in rows.iter().enumerate() {
        let mut record = vec![id.to_string()];
        record.extend(row.fields());
        writer.write_record(&record)?;
    }
    writer.flush().map_err(io_error(path))?;

    tracing::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Concatenate every `*.csv` in `input_dir` into `output_file`.
///
/// Each input's `id` column is dropped and the output re-indexed. Columns are
/// aligned by name in first-seen order; cells a file lacks are left empty.
/// Returns the number of data rows written.
pub fn combine_csvs(input_dir: &Path, output_file: &Path) -> Result<usize> {
    let mut inputs: Vec<PathBuf> = fs::read_dir(input_dir)
        .map_err(io_error(input_dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"))
        .filter(|p| p.as_path() != output_file)
        .collect();
    inputs.sort();

    let mut columns: Vec<String> = Vec::new();
    let mut rows: Vec<HashMap<String, String>> = Vec::new();

    for input in &inputs {
        let mut reader = csv::Reader::from_path(input)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        for name in &headers {
            if name != INDEX_COLUMN && !columns.contains(name) {
                columns.push(name.clone());
            }
        }

        for record in reader.records() {
            let record = record?;
            let row: HashMap<String, String> = headers
                .iter()
                .zip(record.iter())
                .filter(|(name, _)| name.as_str() != INDEX_COLUMN)
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect();
            rows.push(row);
        }
        tracing::debug!("Read {}", input.display());
    }

    let mut writer = csv::Writer::from_path(output_file)?;
    let mut header = vec![INDEX_COLUMN.to_string()];
    header.extend(columns.iter().cloned());
    writer.write_record(&header)?;

    for (id, row) in rows.iter().enumerate() {
        let mut record = vec![id.to_string()];
        record.extend(
            columns
                .iter()
                .map(|c| row.get(c).cloned().unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }
    writer.flush().map_err(io_error(output_file))?;

    tracing::info!(
        "Combined {} files into {} ({} rows, {} columns)",
        inputs.len(),
        output_file.display(),
        rows.len(),
        columns.len()
    );
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exported_tile_name() {
        let tile = TileName::parse("tile_53.4808_-2.2426.jpg").unwrap();
        assert_eq!(tile.prefix, "tile");
        assert_eq!(tile.coordinate.lat, 53.4808);
        assert_eq!(tile.coordinate.lon, -2.2426);
        assert_eq!(tile.full_name, "tile_53.4808_-2.2426.jpg");
    }

    #[test]
    fn prefix_may_contain_underscores() {
        let tile = TileName::parse("manchester_tile_53.5_-2.25.tif").unwrap();
        assert_eq!(tile.prefix, "manchester_tile");
        assert_eq!(tile.coordinate.lon, -2.25);

        let bare = TileName::parse("tile_53.48_-2.24").unwrap();
        assert_eq!(bare.coordinate.lon, -2.24);
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(TileName::parse("tile.jpg").is_err());
        assert!(TileName::parse("53.5_-2.25.jpg").is_err());
        assert!(TileName::parse("tile_north_west.jpg").is_err());
        assert!(matches!(
            TileName::parse("tile_95.0_10.0.jpg"),
            Err(DatasetError::Core(CoreError::InvalidCoordinate { .. }))
        ));
    }

    #[test]
    fn stem_for_parses_back() {
        let center = Coordinate::new(51.530583299426304, -0.2164985443965517).unwrap();
        let name = format!("{}.tif", TileName::stem_for("tile", center));
        assert_eq!(TileName::parse(&name).unwrap().coordinate, center);
    }

    #[test]
    fn headers_and_fields_align() {
        let tile = TileName::parse("tile_1.0_2.0.jpg").unwrap();
        let mut summary = SummaryRecord::default();
        summary.species_richness = 3;
        summary.increment(RedlistCategory::Lc);
        let row = DatasetRow::new(&tile, "leeds", summary);

        let headers = DatasetRow::headers();
        let fields = row.fields();
        assert_eq!(headers.len(), fields.len());
        assert_eq!(headers.len(), 4 + 1 + 9 + 1);

        let lc = headers.iter().position(|h| h == "redlist_LC").unwrap();
        assert_eq!(fields[lc], "1");
        assert_eq!(fields[1], "leeds");
    }

    #[test]
    fn written_rows_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leeds.csv");

        let mut summary = SummaryRecord::default();
        summary.species_richness = 4;
        summary.unresolved = 1;
        summary.increment(RedlistCategory::Vu);
        summary.increment(RedlistCategory::Ne);
        summary.increment(RedlistCategory::Ne);
        let rows = vec![
            DatasetRow::new(&TileName::parse("tile_53.8_-1.55.jpg").unwrap(), "leeds", summary),
            DatasetRow::new(
                &TileName::parse("tile_53.81_-1.56.jpg").unwrap(),
                "leeds",
                SummaryRecord::default(),
            ),
        ];
        write_rows(&path, &rows).unwrap();

        assert_eq!(read_rows(&path).unwrap(), rows);
    }

    #[test]
    fn read_rows_reports_malformed_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "id,full_name,city
0,x.jpg,a
").unwrap();

        match read_rows(&path) {
            Err(DatasetError::MalformedRow { row, reason, .. }) => {
                assert_eq!(row, 0);
                assert!(reason.contains("missing column"));
            }
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn combine_reindexes_and_aligns_columns() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "id,full_name,city\n0,x.jpg,a\n1,y.jpg,a\n").unwrap();
        fs::write(dir.path().join("b.csv"), "id,city,full_name,extra\n0,b,z.jpg,9\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let output = dir.path().join("combined.csv");
        let written = combine_csvs(dir.path(), &output).unwrap();
        assert_eq!(written, 3);

        let text = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,full_name,city,extra");
        assert_eq!(lines[1], "0,x.jpg,a,");
        assert_eq!(lines[2], "1,y.jpg,a,");
        assert_eq!(lines[3], "2,z.jpg,b,9");
    }

    #[test]
    fn write_rows_has_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("csv").join("leeds.csv");
        let tile = TileName::parse("tile_53.8_-1.55.jpg").unwrap();
        let rows = vec![
            DatasetRow::new(&tile, "leeds", SummaryRecord::default()),
            DatasetRow::new(&tile, "leeds", SummaryRecord::default()),
        ];
        write_rows(&path, &rows).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(&reader.headers().unwrap()[0], "id");
        let ids: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[0].to_string())
            .collect();
        assert_eq!(ids, vec!["0", "1"]);
    }
}
