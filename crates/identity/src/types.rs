// In crates/identity/src/types.rs

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A snapshot of the identity provider's session state, as delivered by the
/// session-change subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
}

/// The credential material backing a session. Held by the `AuthClient`,
/// never handed out directly; consumers mint short-lived bearer tokens
/// through `AuthClient::fresh_token`.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

// --- Wire types for the identity provider's REST API ---

/// Response to `accounts:signUp` and `accounts:signInWithPassword`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignInResponse {
    pub local_id: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    /// Lifetime of the id token in seconds, sent as a string.
    pub expires_in: String,
}

/// Response to `accounts:lookup`.
#[derive(Debug, Deserialize)]
pub(crate) struct LookupResponse {
    pub users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LookupUser {
    pub local_id: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
}

/// Response to the token refresh endpoint, which uses snake_case keys.
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: String,
}
