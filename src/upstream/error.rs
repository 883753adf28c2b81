use crate::config::ConfigError;
use thiserror::Error;

/// Failure of a single upstream call, classified by where it went wrong
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// Missing or invalid credential/base URL; no request was sent
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The request never produced an HTTP response
    #[error("transport error: {0}")]
    Transport(String),
    /// The API answered with a non-2xx status
    #[error("upstream returned {code}: {message}")]
    Status { code: u16, message: String },
    /// The body was not valid JSON
    #[error("invalid JSON response from API: {0}")]
    Decode(String),
}

impl From<ConfigError> for UpstreamError {
    fn from(err: ConfigError) -> Self {
        UpstreamError::Configuration(err.to_string())
    }
}
