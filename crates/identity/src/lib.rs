// In crates/identity/src/lib.rs

use async_trait::async_trait;
use core_types::SubscriptionProfile;

pub mod error;
pub mod profile;
pub mod provider;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use profile::ProfileStoreClient;
pub use provider::AuthClient;
pub use types::{SessionInfo, SessionTokens};

/// The universal interface to the profile document store.
///
/// The store holds one subscription profile document per user, keyed by uid.
/// This core reads it once per authorization cycle; the single write happens
/// at account creation and is owned by the signup flow.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the subscription profile for a user.
    ///
    /// A missing document is `Error::ProfileNotFound`, which callers must
    /// treat differently from a transport failure: the former means the
    /// account was never fully created, the latter is retryable.
    async fn fetch_profile(&self, uid: &str, bearer_token: &str) -> Result<SubscriptionProfile>;

    /// Writes the profile document at account creation.
    async fn create_profile(
        &self,
        uid: &str,
        profile: &SubscriptionProfile,
        bearer_token: &str,
    ) -> Result<()>;
}
