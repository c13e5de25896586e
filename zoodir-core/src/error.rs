use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop an operation outright.
///
/// Problems with the content of CMS records are never reported through this
/// type; they travel as errors and warnings inside [`crate::Validation`].
#[derive(Error, Debug)]
pub enum ZooError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates '{0}', expected LAT,LNG")]
    InvalidCoordinates(String),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unknown sort key '{0}', expected name, price or rating")]
    UnknownSortKey(String),
}

/// Result type for zoodir operations
pub type ZooResult<T> = Result<T, ZooError>;
