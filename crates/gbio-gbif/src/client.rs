//! Blocking HTTP client for the GBIF occurrence and species APIs.

use gbio_core::{Coordinate, RedlistAssessment, SpeciesRecord, SpeciesSource};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

use crate::error::{GbifError, Result};
use crate::params::{geofence_params, QueryOptions};

/// Client for the occurrence search endpoint and the species endpoint.
pub struct OccurrenceClient {
    pub(crate) client: Client,
    pub(crate) search_url: String,
    pub(crate) species_url: String,
    pub(crate) options: QueryOptions,
}

impl OccurrenceClient {
    /// Create a client with library-default timeouts.
    pub fn new(search_url: impl Into<String>, species_url: impl Into<String>) -> Result<Self> {
        Self::build(search_url.into(), species_url.into(), QueryOptions::default(), None)
    }

    /// Create a client with explicit query options and an optional request timeout.
    pub fn with_options(
        search_url: impl Into<String>,
        species_url: impl Into<String>,
        options: QueryOptions,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        Self::build(search_url.into(), species_url.into(), options, timeout)
    }

    fn build(
        search_url: String,
        species_url: String,
        options: QueryOptions,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(GbifError::ClientBuild)?;
        Ok(Self::from_parts(client, search_url, species_url, options))
    }

    /// Wrap an already configured HTTP client (proxy, TLS, headers).
    pub fn from_parts(
        client: Client,
        search_url: impl Into<String>,
        species_url: impl Into<String>,
        options: QueryOptions,
    ) -> Self {
        Self {
            client,
            search_url: trim_url(search_url.into()),
            species_url: trim_url(species_url.into()),
            options,
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Species-key facet counts for the square geofence of side `2 * radius_km`
    /// around `center`. `None` when the request failed.
    pub fn query_by_geofence(&self, center: Coordinate, radius_km: f64) -> Option<Value> {
        let params = geofence_params(center, radius_km, &self.options);
        self.query(&params, None)
    }

    /// Same as [`query_by_geofence`](Self::query_by_geofence) with the configured radius.
    pub fn query_default_geofence(&self, center: Coordinate) -> Option<Value> {
        self.query_by_geofence(center, self.options.radius_km)
    }

    /// GET `endpoint_override` (or the search endpoint) with `params`.
    ///
    /// Failures are logged and reported as `None`; the caller treats that as
    /// "no data".
    pub fn query<K, V>(&self, params: &[(K, V)], endpoint_override: Option<&str>) -> Option<Value>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        match self.try_query(params, endpoint_override) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("GBIF query failed: {}", err);
                None
            }
        }
    }

    /// Like [`query`](Self::query) but returns the failure.
    ///
    /// A 2xx response with an empty body decodes to `Value::Null`.
    pub fn try_query<K, V>(&self, params: &[(K, V)], endpoint_override: Option<&str>) -> Result<Value>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let url = endpoint_override.unwrap_or(self.search_url.as_str()).to_string();
        let pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .collect();

        let response = self
            .client
            .get(&url)
            .query(&pairs)
            .send()
            .map_err(|source| GbifError::Transport {
                url: url.clone(),
                source,
            })?;
        tracing::debug!("GET {}", response.url());

        let status = response.status();
        let body = response.text().map_err(|source| GbifError::Transport {
            url: url.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(GbifError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|source| GbifError::Decode { url, source })
    }

    /// Species record with its red list category attached.
    ///
    /// Both the species document and the `iucnRedListCategory` sub-resource
    /// must be fetched successfully. Nothing is cached here.
    pub fn fetch_species_detail(&self, species_key: u64) -> Option<SpeciesRecord> {
        match self.try_fetch_species_detail(species_key) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!("Species detail lookup failed: {}", err);
                None
            }
        }
    }

    pub fn try_fetch_species_detail(&self, species_key: u64) -> Result<SpeciesRecord> {
        let no_params: [(&str, &str); 0] = [];

        let species_url = self.species_url_for(species_key);
        let details = match self.try_query(&no_params, Some(species_url.as_str()))? {
            Value::Object(map) => map,
            other => {
                return Err(GbifError::InvalidSpecies {
                    species_key,
                    reason: format!("species document is not an object: {}", other),
                })
            }
        };

        let redlist_url = self.redlist_url_for(species_key);
        let redlist = match self.try_query(&no_params, Some(redlist_url.as_str()))? {
            // no assessment published for this species
            Value::Null => RedlistAssessment::default(),
            value => serde_json::from_value(value).map_err(|e| GbifError::InvalidSpecies {
                species_key,
                reason: format!("red list document: {}", e),
            })?,
        };

        Ok(SpeciesRecord::new(details, Some(redlist)))
    }

    pub fn species_url_for(&self, species_key: u64) -> String {
        format!("{}/{}", self.species_url, species_key)
    }

    pub fn redlist_url_for(&self, species_key: u64) -> String {
        format!("{}/{}/iucnRedListCategory", self.species_url, species_key)
    }
}

impl SpeciesSource for OccurrenceClient {
    fn fetch_species_detail(&self, species_key: u64) -> Option<SpeciesRecord> {
        OccurrenceClient::fetch_species_detail(self, species_key)
    }
}

fn trim_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_urls_are_path_embedded() {
        let client = OccurrenceClient::new(
            "https://api.gbif.org/v1/occurrence/search",
            "https://api.gbif.org/v1/species/",
        )
        .unwrap();

        assert_eq!(
            client.species_url_for(2490719),
            "https://api.gbif.org/v1/species/2490719"
        );
        assert_eq!(
            client.redlist_url_for(2490719),
            "https://api.gbif.org/v1/species/2490719/iucnRedListCategory"
        );
    }

    #[test]
    fn default_options_use_one_km_radius() {
        let client = OccurrenceClient::new("http://localhost:1", "http://localhost:1").unwrap();
        assert_eq!(client.options().radius_km, 1.0);
        assert_eq!(client.options().facet_limit, 1000);
    }

    #[test]
    fn unreachable_endpoint_yields_none() {
        // port 9 (discard) on loopback is closed in test environments
        let client = OccurrenceClient::with_options(
            "http://127.0.0.1:9/search",
            "http://127.0.0.1:9/species",
            QueryOptions::default(),
            Some(Duration::from_secs(2)),
        )
        .unwrap();
        let center = Coordinate::new(51.53, -0.21).unwrap();
        assert!(client.query_by_geofence(center, 1.0).is_none());
        assert!(client.fetch_species_detail(1).is_none());
    }
}
