//! YAML configuration: API endpoints, query options and cache location.

use gbio_gbif::{GbifError, OccurrenceClient, QueryOptions};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the config file when `--config` is not given.
pub const CONFIG_ENV: &str = "GBIO_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// `api-paths` entry for the occurrence search endpoint.
pub const SEARCH_API: &str = "GBIF";
/// `api-paths` entry for the species endpoint.
pub const SPECIES_API: &str = "GBIF-species";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing configuration key: {0}")]
    MissingKey(String),

    #[error("invalid configuration value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error(transparent)]
    Client(#[from] GbifError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct GbioConfig {
    #[serde(rename = "api-paths", default)]
    pub api_paths: BTreeMap<String, ApiPath>,
    #[serde(default)]
    pub query: QueryOptions,
    /// Request timeout; unset keeps the HTTP client default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPath {
    #[serde(default)]
    pub url: Option<String>,
}

/// Validated endpoint URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub search_url: String,
    pub species_url: String,
}

/// A geofence radius must be a positive number of kilometres.
pub fn check_radius(key: &str, radius_km: f64) -> Result<f64, ConfigError> {
    if radius_km.is_finite() && radius_km > 0.0 {
        Ok(radius_km)
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("{} is not a positive distance in km", radius_km),
        })
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/species_cache.json")
}

impl GbioConfig {
    /// Config path from the CLI flag, then `GBIO_CONFIG`, then `config.yml`.
    pub fn resolve_path(cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Read, parse and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        tracing::info!("Loaded config from {}", path.display());
        tracing::debug!("Config: {:?}", config);
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Fails with the first required key that is absent, blank or out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoints()?;
        check_radius("query.radius_km", self.query.radius_km)?;
        Ok(())
    }

    /// Both endpoints, or the first missing key.
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        Ok(Endpoints {
            search_url: self.api_url(SEARCH_API)?,
            species_url: self.api_url(SPECIES_API)?,
        })
    }

    fn api_url(&self, name: &str) -> Result<String, ConfigError> {
        self.api_paths
            .get(name)
            .and_then(|api| api.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingKey(format!("api-paths.{}.url", name)))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn client(&self) -> Result<OccurrenceClient, ConfigError> {
        let endpoints = self.endpoints()?;
        let client = OccurrenceClient::with_options(
            endpoints.search_url,
            endpoints.species_url,
            self.query.clone(),
            self.timeout(),
        )?;
        Ok(client)
    }
}
