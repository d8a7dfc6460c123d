// crates/hotelstat-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("series has no observations to align")]
    InsufficientData,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration could not be parsed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fetcher setup failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
