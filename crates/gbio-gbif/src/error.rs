use thiserror::Error;

pub type Result<T> = std::result::Result<T, GbifError>;

#[derive(Error, Debug)]
pub enum GbifError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("response from {url} is not JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("species {species_key}: {reason}")]
    InvalidSpecies { species_key: u64, reason: String },
}
