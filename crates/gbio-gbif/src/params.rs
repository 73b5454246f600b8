//! Query parameters for the occurrence search endpoint.

use gbio_core::{geo, Coordinate};
use serde::{Deserialize, Serialize};

/// GBIF backbone key of the Animalia kingdom.
pub const ANIMALIA_TAXON_KEY: &str = "1";

/// Facet dimension requested from the search endpoint. Facet names are read
/// back as species keys, so this is not configurable.
pub const SPECIES_FACET: &str = "speciesKey";

/// Tunables for geofenced occurrence queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryOptions {
    /// Half-width of the square geofence in kilometres
    pub radius_km: f64,
    /// Maximum number of facet buckets returned
    pub facet_limit: u32,
    /// Taxon filter applied to occurrences
    pub taxon_key: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            radius_km: 1.0,
            facet_limit: 1000,
            taxon_key: ANIMALIA_TAXON_KEY.to_string(),
        }
    }
}

/// Facet-only search parameters for the geofence around `center`.
///
/// `limit=0` asks for no occurrence records, only the facet counts.
pub fn geofence_params(
    center: Coordinate,
    radius_km: f64,
    options: &QueryOptions,
) -> Vec<(&'static str, String)> {
    let polygon = geo::geofence(center, radius_km);
    vec![
        ("geometry", polygon.to_wkt()),
        ("limit", "0".to_string()),
        ("hasCoordinate", "true".to_string()),
        ("facet", SPECIES_FACET.to_string()),
        ("facetLimit", options.facet_limit.to_string()),
        ("taxonKey", options.taxon_key.clone()),
    ]
}
