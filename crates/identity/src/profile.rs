// In crates/identity/src/profile.rs

use crate::{Error, ProfileStore, Result};
use async_trait::async_trait;
use core_types::SubscriptionProfile;
use reqwest::StatusCode;

/// A client for the external profile document store.
///
/// Documents live at `{base}/profiles/{uid}` and are read with the same
/// short-lived bearer tokens the signal service accepts.
#[derive(Clone)]
pub struct ProfileStoreClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ProfileStoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn document_url(&self, uid: &str) -> String {
        format!("{}/profiles/{}", self.base_url, uid)
    }
}

#[async_trait]
impl ProfileStore for ProfileStoreClient {
    async fn fetch_profile(&self, uid: &str, bearer_token: &str) -> Result<SubscriptionProfile> {
        let response = self
            .http_client
            .get(self.document_url(uid))
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        // A missing document is a distinct outcome, not a transport error:
        // it means the account was never fully created.
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::ProfileNotFound {
                uid: uid.to_string(),
            });
        }

        let response = response.error_for_status().map_err(Error::RequestFailed)?;
        let profile: SubscriptionProfile =
            response.json().await.map_err(Error::RequestFailed)?;

        tracing::debug!(uid = %uid, plan = %profile.plan, "Profile document fetched.");
        Ok(profile)
    }

    async fn create_profile(
        &self,
        uid: &str,
        profile: &SubscriptionProfile,
        bearer_token: &str,
    ) -> Result<()> {
        self.http_client
            .put(self.document_url(uid))
            .bearer_auth(bearer_token)
            .json(profile)
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .error_for_status()
            .map_err(Error::RequestFailed)?;

        tracing::info!(uid = %uid, plan = %profile.plan, "Profile document created.");
        Ok(())
    }
}
