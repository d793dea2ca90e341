// In crates/identity/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    /// An error reported by the identity provider itself (e.g.,
    /// "EMAIL_NOT_FOUND", "INVALID_PASSWORD").
    #[error("Identity provider error: code {code}, message: {message}")]
    ApiError { code: i64, message: String },
    /// The user is authenticated but has no profile document. This must lead
    /// to account re-creation, never to a default entitlement.
    #[error("No subscription profile found for uid {uid}")]
    ProfileNotFound { uid: String },
    /// A token was requested but no session is active.
    #[error("No active session")]
    NotSignedIn,
}

pub type Result<T> = std::result::Result<T, Error>;
