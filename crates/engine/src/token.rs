// In crates/engine/src/token.rs

use api_client::TokenSource;
use async_trait::async_trait;
use identity::AuthClient;

/// Adapts the identity client to the signal service's `TokenSource`.
///
/// The signal service wants a freshly-minted token per request; the identity
/// client owns the refresh logic. This adapter is what threads the session
/// explicitly into the feed instead of letting it read ambient auth state.
pub struct SessionTokenSource {
    auth: AuthClient,
}

impl SessionTokenSource {
    pub fn new(auth: AuthClient) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl TokenSource for SessionTokenSource {
    async fn bearer_token(&self) -> api_client::Result<String> {
        self.auth
            .fresh_token()
            .await
            .map_err(|e| api_client::Error::AuthToken(e.to_string()))
    }
}
