// In crates/api-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    /// The signal service answered with its `{"error": ...}` envelope
    /// instead of a record array.
    #[error("Signal service error: {0}")]
    EndpointError(String),
    /// A bearer token could not be minted for the request.
    #[error("Failed to obtain a bearer token: {0}")]
    AuthToken(String),
}

pub type Result<T> = std::result::Result<T, Error>;
