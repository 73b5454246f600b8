//! Persistent species-key → species-record cache.
//!
//! The cache only grows during a run; the driver decides when to persist it.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::models::SpeciesRecord;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeciesCache {
    entries: BTreeMap<u64, SpeciesRecord>,
}

impl SpeciesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a cache from disk. A missing file yields an empty cache.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No species cache at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let bytes = fs::read(path).map_err(|source| CoreError::CacheIo {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: BTreeMap<u64, SpeciesRecord> =
            serde_json::from_slice(&bytes).map_err(|source| CoreError::CacheFormat {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!(
            "Loaded {} cached species from {}",
            entries.len(),
            path.display()
        );
        Ok(Self { entries })
    }

    /// Write the whole mapping to `path`.
    ///
    /// Data goes to a sibling temp file first and is renamed into place, so an
    /// interrupted write leaves the previous cache intact.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let io_err = |source| CoreError::CacheIo {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp_path = temp_path(path);
        let file = fs::File::create(&tmp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.entries).map_err(|source| {
            CoreError::CacheFormat {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        fs::rename(&tmp_path, path).map_err(io_err)?;
        tracing::debug!("Persisted {} species to {}", self.len(), path.display());
        Ok(())
    }

    pub fn get(&self, species_key: u64) -> Option<&SpeciesRecord> {
        self.entries.get(&species_key)
    }

    /// Insert or overwrite an entry.
    pub fn put(&mut self, species_key: u64, record: SpeciesRecord) {
        self.entries.insert(species_key, record);
    }

    pub fn contains(&self, species_key: u64) -> bool {
        self.entries.contains_key(&species_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RedlistAssessment, RedlistCategory};
    use serde_json::{json, Map};

    fn blackbird() -> SpeciesRecord {
        let mut details = Map::new();
        details.insert("key".into(), json!(2490719));
        details.insert("scientificName".into(), json!("Turdus merula Linnaeus, 1758"));
        details.insert("kingdom".into(), json!("Animalia"));

        let mut redlist = RedlistAssessment::with_code("LC");
        redlist
            .fields
            .insert("category".into(), json!("LEAST_CONCERN"));
        SpeciesRecord::new(details, Some(redlist))
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SpeciesCache::load(dir.path().join("absent.json")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn empty_cache_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("species_cache.json");
        SpeciesCache::new().persist(&path).unwrap();
        let loaded = SpeciesCache::load(&path).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn single_entry_round_trips_with_redlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("species_cache.json");

        let mut cache = SpeciesCache::new();
        cache.put(2490719, blackbird());
        cache.persist(&path).unwrap();

        let loaded = SpeciesCache::load(&path).unwrap();
        assert_eq!(loaded, cache);
        let record = loaded.get(2490719).unwrap();
        assert_eq!(record.status(), RedlistCategory::Lc);
        assert_eq!(
            record.redlist.as_ref().unwrap().fields.get("category"),
            Some(&json!("LEAST_CONCERN"))
        );
        assert!(!path.with_file_name("species_cache.json.tmp").exists());
    }

    #[test]
    fn put_overwrites() {
        let mut cache = SpeciesCache::new();
        cache.put(1, SpeciesRecord::default());
        cache.put(1, blackbird());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).unwrap().key(), Some(2490719));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("species_cache.json");
        fs::write(&path, b"not json").unwrap();
        assert!(matches!(
            SpeciesCache::load(&path),
            Err(CoreError::CacheFormat { .. })
        ));
    }
}
