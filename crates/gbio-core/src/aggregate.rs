//! Species richness and red list aggregation over an occurrence facet response.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::SpeciesCache;
use crate::error::{unexpected_shape, Result};
use crate::models::{OccurrenceResponse, RedlistCategory, SpeciesRecord, SummaryRecord};

/// Something that can look up a species record by key, typically over the network.
pub trait SpeciesSource {
    /// Returns `None` when the record could not be fetched.
    fn fetch_species_detail(&self, species_key: u64) -> Option<SpeciesRecord>;
}

impl<T: SpeciesSource + ?Sized> SpeciesSource for &T {
    fn fetch_species_detail(&self, species_key: u64) -> Option<SpeciesRecord> {
        (**self).fetch_species_detail(species_key)
    }
}

/// Resolves species through the cache first and the source second.
///
/// Species that cannot be resolved are counted in `unresolved`, still count
/// toward `species_richness`, and are not cached.
pub struct Aggregator<S> {
    source: S,
    cache: SpeciesCache,
}

impl<S: SpeciesSource> Aggregator<S> {
    pub fn new(source: S, cache: SpeciesCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &SpeciesCache {
        &self.cache
    }

    pub fn into_cache(self) -> SpeciesCache {
        self.cache
    }

    /// Summarize a raw occurrence search response.
    ///
    /// `None` in means `None` out (the upstream query failed). A document
    /// without a species facet is an `UnexpectedResponseShape` error.
    pub fn summarize(&mut self, response: Option<&Value>) -> Result<Option<SummaryRecord>> {
        let Some(response) = response else {
            return Ok(None);
        };
        let parsed = OccurrenceResponse::deserialize(response)
            .map_err(|e| unexpected_shape(format!("occurrence response: {e}")))?;
        self.summarize_response(&parsed).map(Some)
    }

    pub fn summarize_response(&mut self, response: &OccurrenceResponse) -> Result<SummaryRecord> {
        let facet = response
            .facets
            .first()
            .ok_or_else(|| unexpected_shape("response has no facets"))?;

        let mut summary = SummaryRecord::default();
        for entry in &facet.counts {
            let species_key: u64 = entry.name.trim().parse().map_err(|_| {
                unexpected_shape(format!("facet entry '{}' is not a species key", entry.name))
            })?;

            summary.species_richness += 1;
            match self.resolve(species_key) {
                Some(category) => summary.increment(category),
                None => {
                    tracing::warn!("Species {} could not be resolved", species_key);
                    summary.unresolved += 1;
                }
            }
        }

        tracing::debug!(
            "Summarized {} species ({} unresolved)",
            summary.species_richness,
            summary.unresolved
        );
        Ok(summary)
    }

    /// Red list status for a species key, fetching and caching on a miss.
    pub fn resolve(&mut self, species_key: u64) -> Option<RedlistCategory> {
        if let Some(record) = self.cache.get(species_key) {
            return Some(record.status());
        }

        let record = self.source.fetch_species_detail(species_key)?;
        let status = record.status();
        self.cache.put(species_key, record);
        Some(status)
    }
}
