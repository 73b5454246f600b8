//! gbio GBIF - occurrence API client
//!
//! Handles all communication with the GBIF occurrence search and species endpoints.

pub mod client;
pub mod error;
pub mod params;

pub use client::OccurrenceClient;
pub use error::{GbifError, Result};
pub use params::{QueryOptions, SPECIES_FACET};
