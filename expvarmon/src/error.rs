//! Error type shared by the fetcher, the document lookups and config validation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure or non-success HTTP status.
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("request timed out")]
    Timeout,

    /// The response body was not a JSON document.
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("{path}: expected {expected}")]
    WrongType { path: String, expected: &'static str },

    #[error("invalid ports: {0}")]
    InvalidPorts(String),

    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_decode() {
            Error::Decode(err.to_string())
        } else {
            Error::Fetch(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
