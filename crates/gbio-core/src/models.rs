//! Core data models for the biodiversity pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{CoreError, Result};

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoreError;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        Coordinate::new(raw.lat, raw.lon)
    }
}

impl Coordinate {
    /// Create a coordinate, rejecting values outside the WGS84 ranges.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoreError::InvalidCoordinate {
                lat,
                lon,
                reason: "not a finite number",
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::InvalidCoordinate {
                lat,
                lon,
                reason: "latitude outside [-90, 90]",
            });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoreError::InvalidCoordinate {
                lat,
                lon,
                reason: "longitude outside [-180, 180]",
            });
        }
        Ok(Self { lat, lon })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// Axis-aligned geofence rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingPolygon {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl BoundingPolygon {
    /// Closed ring of (lon, lat) vertices, starting and ending at the south-west corner.
    pub fn ring(&self) -> [(f64, f64); 5] {
        [
            (self.lon_min, self.lat_min),
            (self.lon_min, self.lat_max),
            (self.lon_max, self.lat_max),
            (self.lon_max, self.lat_min),
            (self.lon_min, self.lat_min),
        ]
    }

    /// Center as (lon, lat).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.lon_min + self.lon_max) / 2.0,
            (self.lat_min + self.lat_max) / 2.0,
        )
    }

    /// WKT rendering understood by the occurrence API `geometry` parameter.
    pub fn to_wkt(&self) -> String {
        let vertices: Vec<String> = self
            .ring()
            .iter()
            .map(|(lon, lat)| format!("{} {}", lon, lat))
            .collect();
        format!("POLYGON(({}))", vertices.join(", "))
    }
}

impl fmt::Display for BoundingPolygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wkt())
    }
}

/// IUCN Red List category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RedlistCategory {
    /// Extinct
    Ex,
    /// Extinct in the wild
    Ew,
    /// Critically endangered
    Cr,
    /// Endangered
    En,
    /// Vulnerable
    Vu,
    /// Near threatened
    Nt,
    /// Least concern
    Lc,
    /// Data deficient
    Dd,
    /// Not evaluated
    #[default]
    Ne,
}

impl RedlistCategory {
    pub const ALL: [RedlistCategory; 9] = [
        RedlistCategory::Ex,
        RedlistCategory::Ew,
        RedlistCategory::Cr,
        RedlistCategory::En,
        RedlistCategory::Vu,
        RedlistCategory::Nt,
        RedlistCategory::Lc,
        RedlistCategory::Dd,
        RedlistCategory::Ne,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            RedlistCategory::Ex => "EX",
            RedlistCategory::Ew => "EW",
            RedlistCategory::Cr => "CR",
            RedlistCategory::En => "EN",
            RedlistCategory::Vu => "VU",
            RedlistCategory::Nt => "NT",
            RedlistCategory::Lc => "LC",
            RedlistCategory::Dd => "DD",
            RedlistCategory::Ne => "NE",
        }
    }

    /// Parse a status code. Anything outside the closed set maps to `Ne`.
    pub fn from_code(code: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|category| category.code().eq_ignore_ascii_case(code.trim()))
            .unwrap_or_default()
    }
}

impl fmt::Display for RedlistCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The `iucnRedListCategory` document attached to a species, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedlistAssessment {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RedlistAssessment {
    /// Assessment carrying only a status `code`.
    pub fn with_code(code: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("code".into(), Value::String(code.to_string()));
        Self { fields }
    }

    /// The status code; `None` when absent, `null` or not a string.
    pub fn code(&self) -> Option<&str> {
        self.fields.get("code").and_then(Value::as_str)
    }

    pub fn category(&self) -> RedlistCategory {
        self.code()
            .map(RedlistCategory::from_code)
            .unwrap_or_default()
    }
}

/// A species document with its red list assessment attached under `redlist`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    #[serde(flatten)]
    pub details: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redlist: Option<RedlistAssessment>,
}

impl SpeciesRecord {
    pub fn new(details: Map<String, Value>, redlist: Option<RedlistAssessment>) -> Self {
        Self { details, redlist }
    }

    /// Conservation status, `Ne` when no assessment is attached.
    pub fn status(&self) -> RedlistCategory {
        self.redlist
            .as_ref()
            .map(RedlistAssessment::category)
            .unwrap_or_default()
    }

    pub fn key(&self) -> Option<u64> {
        self.details.get("key").and_then(Value::as_u64)
    }

    pub fn scientific_name(&self) -> Option<&str> {
        self.details.get("scientificName").and_then(Value::as_str)
    }
}

/// Occurrence search response. Only the facet layout is relied upon.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OccurrenceResponse {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub facets: Vec<Facet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Facet {
    /// GBIF reports the facet dimension under `field`.
    #[serde(default, alias = "field")]
    pub name: String,
    pub counts: Vec<FacetCount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacetCount {
    pub name: String,
    #[serde(default)]
    pub count: u64,
}

/// Flat per-geofence biodiversity summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub species_richness: u64,
    #[serde(rename = "redlist_EX")]
    pub redlist_ex: u64,
    #[serde(rename = "redlist_EW")]
    pub redlist_ew: u64,
    #[serde(rename = "redlist_CR")]
    pub redlist_cr: u64,
    #[serde(rename = "redlist_EN")]
    pub redlist_en: u64,
    #[serde(rename = "redlist_VU")]
    pub redlist_vu: u64,
    #[serde(rename = "redlist_NT")]
    pub redlist_nt: u64,
    #[serde(rename = "redlist_LC")]
    pub redlist_lc: u64,
    #[serde(rename = "redlist_DD")]
    pub redlist_dd: u64,
    #[serde(rename = "redlist_NE")]
    pub redlist_ne: u64,
    /// Species keys whose detail lookup failed.
    pub unresolved: u64,
}

impl SummaryRecord {
    fn slot(&mut self, category: RedlistCategory) -> &mut u64 {
        match category {
            RedlistCategory::Ex => &mut self.redlist_ex,
            RedlistCategory::Ew => &mut self.redlist_ew,
            RedlistCategory::Cr => &mut self.redlist_cr,
            RedlistCategory::En => &mut self.redlist_en,
            RedlistCategory::Vu => &mut self.redlist_vu,
            RedlistCategory::Nt => &mut self.redlist_nt,
            RedlistCategory::Lc => &mut self.redlist_lc,
            RedlistCategory::Dd => &mut self.redlist_dd,
            RedlistCategory::Ne => &mut self.redlist_ne,
        }
    }

    pub fn increment(&mut self, category: RedlistCategory) {
        *self.slot(category) += 1;
    }

    pub fn set_count(&mut self, category: RedlistCategory, count: u64) {
        *self.slot(category) = count;
    }

    pub fn count(&self, category: RedlistCategory) -> u64 {
        match category {
            RedlistCategory::Ex => self.redlist_ex,
            RedlistCategory::Ew => self.redlist_ew,
            RedlistCategory::Cr => self.redlist_cr,
            RedlistCategory::En => self.redlist_en,
            RedlistCategory::Vu => self.redlist_vu,
            RedlistCategory::Nt => self.redlist_nt,
            RedlistCategory::Lc => self.redlist_lc,
            RedlistCategory::Dd => self.redlist_dd,
            RedlistCategory::Ne => self.redlist_ne,
        }
    }

    /// Sum over all red list buckets.
    pub fn assessed(&self) -> u64 {
        RedlistCategory::ALL.iter().map(|c| self.count(*c)).sum()
    }
}
