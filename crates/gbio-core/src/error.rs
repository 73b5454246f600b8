//! Error types for the core crate.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid coordinate (lat {lat}, lon {lon}): {reason}")]
    InvalidCoordinate { lat: f64, lon: f64, reason: &'static str },

    /// The occurrence API returned a document without the facet layout we asked for.
    #[error("unexpected response shape: {0}")]
    UnexpectedResponseShape(String),

    #[error("species cache I/O error at {path}: {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("species cache at {path} is not valid: {source}")]
    CacheFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn unexpected_shape(msg: impl ToString) -> CoreError {
    CoreError::UnexpectedResponseShape(msg.to_string())
}
