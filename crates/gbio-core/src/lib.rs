pub mod aggregate;
pub mod cache;
pub mod error;
pub mod geo;
pub mod models;

pub use aggregate::{Aggregator, SpeciesSource};
pub use cache::SpeciesCache;
pub use error::{CoreError, Result};
pub use geo::{bounding_polygon, km_to_degrees, tile_grid};
pub use models::{
    BoundingPolygon, Coordinate, Facet, FacetCount, OccurrenceResponse, RedlistAssessment,
    RedlistCategory, SpeciesRecord, SummaryRecord,
};
