// In crates/identity/src/provider.rs

use crate::types::{LookupResponse, RefreshResponse, SessionInfo, SessionTokens, SignInResponse};
use crate::{Error, Result};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

/// How close to expiry an id token may be before it is refreshed instead of
/// reused.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// A client for the external identity/session provider.
///
/// Owns the session credentials and acts as the single source of truth for
/// session state: every sign-in, refresh and sign-out is published on a
/// watch channel, so consumers observe session changes push-style instead of
/// re-querying ambient state inside timers and callbacks.
#[derive(Clone)]
pub struct AuthClient {
    http_client: reqwest::Client,
    api_key: String,
    auth_base_url: String,
    token_base_url: String,
    tokens: Arc<Mutex<Option<SessionTokens>>>,
    sessions: Arc<watch::Sender<Option<SessionInfo>>>,
}

impl AuthClient {
    pub fn new(
        api_key: impl Into<String>,
        auth_base_url: impl Into<String>,
        token_base_url: impl Into<String>,
    ) -> Self {
        let (sessions, _) = watch::channel(None);
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.into(),
            auth_base_url: auth_base_url.into(),
            token_base_url: token_base_url.into(),
            tokens: Arc::new(Mutex::new(None)),
            sessions: Arc::new(sessions),
        }
    }

    /// The session-change subscription.
    ///
    /// Yields the current session snapshot (or `None` when signed out) and
    /// every subsequent change. This is the only sanctioned way to observe
    /// session state.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionInfo>> {
        self.sessions.subscribe()
    }

    /// Creates a new email/password account. The account starts unverified;
    /// a verification email is dispatched separately.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SessionInfo> {
        let response: SignInResponse = self
            .post_auth(
                "accounts:signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        self.adopt_session(response, false).await
    }

    /// Signs in with email and password and publishes the new session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionInfo> {
        let response: SignInResponse = self
            .post_auth(
                "accounts:signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;

        // The sign-in response does not carry the verification flag; look the
        // account up first, so subscribers only ever observe one, correct
        // snapshot instead of an unverified intermediate.
        let verified = self.lookup_verified(&response.id_token).await?;
        self.adopt_session(response, verified).await
    }

    /// Dispatches the email-verification message for the active session.
    pub async fn send_email_verification(&self) -> Result<()> {
        let id_token = self.fresh_token().await?;
        let _: Value = self
            .post_auth(
                "accounts:sendOobCode",
                json!({ "requestType": "VERIFY_EMAIL", "idToken": id_token }),
            )
            .await?;
        Ok(())
    }

    /// Re-queries the provider for the active session and publishes the
    /// result. Used to pick up changes that happened elsewhere, e.g. the
    /// verification link being clicked.
    pub async fn reload_session(&self) -> Result<SessionInfo> {
        let id_token = self.fresh_token().await?;
        let lookup: LookupResponse = self
            .post_auth("accounts:lookup", json!({ "idToken": id_token }))
            .await?;
        let user = lookup
            .users
            .into_iter()
            .next()
            .ok_or(Error::NotSignedIn)?;

        let session = SessionInfo {
            uid: user.local_id,
            email: user.email,
            email_verified: user.email_verified,
        };
        self.sessions.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Ends the session locally and notifies subscribers.
    pub async fn sign_out(&self) {
        *self.tokens.lock().await = None;
        self.sessions.send_replace(None);
        tracing::info!("Signed out.");
    }

    /// Mints a bearer token for the active session, refreshing it first if it
    /// is at or near expiry.
    pub async fn fresh_token(&self) -> Result<String> {
        let mut guard = self.tokens.lock().await;
        let tokens = guard.as_mut().ok_or(Error::NotSignedIn)?;

        let deadline = Utc::now() + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS);
        if tokens.expires_at <= deadline {
            tracing::debug!("Id token near expiry; refreshing.");
            *tokens = self.refresh(&tokens.refresh_token).await?;
        }

        Ok(tokens.id_token.clone())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens> {
        let url = format!("{}/v1/token?key={}", self.token_base_url, self.api_key);
        let text = self
            .http_client
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;

        let value: Value = serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;
        Self::check_api_error(&value)?;

        let response: RefreshResponse =
            serde_json::from_value(value).map_err(Error::DeserializationFailed)?;
        Ok(Self::tokens_from(
            response.id_token,
            response.refresh_token,
            &response.expires_in,
        ))
    }

    /// Stores the credential material from a sign-in/sign-up response and
    /// publishes the session snapshot exactly once, with the verification
    /// flag the caller established.
    async fn adopt_session(
        &self,
        response: SignInResponse,
        email_verified: bool,
    ) -> Result<SessionInfo> {
        let session = SessionInfo {
            uid: response.local_id,
            email: response.email,
            email_verified,
        };

        *self.tokens.lock().await = Some(Self::tokens_from(
            response.id_token,
            response.refresh_token,
            &response.expires_in,
        ));
        self.sessions.send_replace(Some(session.clone()));

        tracing::info!(uid = %session.uid, "Session established.");
        Ok(session)
    }

    async fn lookup_verified(&self, id_token: &str) -> Result<bool> {
        let lookup: LookupResponse = self
            .post_auth("accounts:lookup", json!({ "idToken": id_token }))
            .await?;
        Ok(lookup
            .users
            .first()
            .map(|u| u.email_verified)
            .unwrap_or(false))
    }

    async fn post_auth<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Value,
    ) -> Result<T> {
        let url = format!("{}/v1/{}?key={}", self.auth_base_url, endpoint, self.api_key);

        let text = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;

        let value: Value = serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;
        Self::check_api_error(&value)?;

        serde_json::from_value(value).map_err(Error::DeserializationFailed)
    }

    /// The provider reports failures as `{"error": {"code": ..., "message": ...}}`.
    fn check_api_error(value: &Value) -> Result<()> {
        if let Some(error) = value.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(-1);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Err(Error::ApiError { code, message });
        }
        Ok(())
    }

    fn tokens_from(id_token: String, refresh_token: String, expires_in: &str) -> SessionTokens {
        let lifetime_secs = expires_in.parse::<i64>().unwrap_or(3600);
        SessionTokens {
            id_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(lifetime_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_envelope_is_detected() {
        let value = json!({ "error": { "code": 400, "message": "EMAIL_NOT_FOUND" } });
        let err = AuthClient::check_api_error(&value).unwrap_err();
        match err {
            Error::ApiError { code, message } => {
                assert_eq!(code, 400);
                assert_eq!(message, "EMAIL_NOT_FOUND");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(AuthClient::check_api_error(&json!({ "users": [] })).is_ok());
    }

    #[tokio::test]
    async fn fresh_token_without_a_session_is_not_signed_in() {
        let client = AuthClient::new("key", "http://127.0.0.1:1", "http://127.0.0.1:1");
        assert!(matches!(
            client.fresh_token().await,
            Err(Error::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn adopt_session_publishes_one_snapshot_with_the_established_flag() {
        let client = AuthClient::new("key", "http://127.0.0.1:1", "http://127.0.0.1:1");
        let mut sessions = client.subscribe();
        assert!(sessions.borrow_and_update().is_none());

        let response = SignInResponse {
            local_id: "uid-1".to_string(),
            email: "trader@example.com".to_string(),
            id_token: "id-token".to_string(),
            refresh_token: "refresh-token".to_string(),
            expires_in: "3600".to_string(),
        };
        client.adopt_session(response, true).await.unwrap();

        // A subscriber sees the verified session directly; there is no
        // unverified intermediate to race against.
        assert!(sessions.has_changed().unwrap());
        let session = sessions.borrow_and_update().clone().unwrap();
        assert!(session.email_verified);
        assert_eq!(session.uid, "uid-1");
        assert!(!sessions.has_changed().unwrap());
    }

    #[tokio::test]
    async fn sign_out_publishes_a_null_session() {
        let client = AuthClient::new("key", "http://127.0.0.1:1", "http://127.0.0.1:1");
        let mut sessions = client.subscribe();
        assert!(sessions.borrow_and_update().is_none());

        client.sign_out().await;
        assert!(sessions.has_changed().unwrap());
        assert!(sessions.borrow_and_update().is_none());
    }
}
