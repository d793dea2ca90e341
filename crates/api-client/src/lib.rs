// In crates/api-client/src/lib.rs

use async_trait::async_trait;
use core_types::Symbol;
use serde_json::Value;

pub mod error;
pub mod signal_feed;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use signal_feed::SignalFeed;
pub use types::*;

/// A source of short-lived bearer tokens for the signal service.
///
/// The token must be minted fresh for each request rather than cached by the
/// caller; expiry and refresh are the implementor's concern. Keeping this as
/// a trait keeps ambient identity state out of the client: whoever owns the
/// session passes it in explicitly.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

/// An HTTP client for the external signal-query service.
#[derive(Clone)]
pub struct SignalApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SignalApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetches the signal/candle rows for one symbol.
    ///
    /// This corresponds to the `GET /signals/{symbol}?interval={i}&limit={n}`
    /// endpoint. The returned batch is tagged with the `(symbol, interval)`
    /// it was requested for so the caller can reject it if the selection has
    /// moved on by the time it arrives.
    pub async fn get_signals(
        &self,
        symbol: &Symbol,
        interval: &str,
        limit: u16,
        bearer_token: &str,
    ) -> Result<SignalBatch> {
        let url = format!(
            "{}/signals/{}?interval={}&limit={}",
            self.base_url, symbol.0, interval, limit
        );

        let text = self
            .http_client
            .get(&url)
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;

        let value: Value = serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;

        // The service reports failures as a top-level error object, so we
        // check for that before expecting a record array.
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return Err(Error::EndpointError(message.to_string()));
        }

        let candles: Vec<SignalCandle> =
            serde_json::from_value(value).map_err(Error::DeserializationFailed)?;

        Ok(SignalBatch {
            symbol: symbol.clone(),
            interval: interval.to_string(),
            candles,
        })
    }

    /// Fetches the full ranked signal list across all symbols the service
    /// tracks.
    ///
    /// This corresponds to the `GET /signals?interval={i}` endpoint. The
    /// order of the returned records is the service's ranking and is
    /// preserved as-is; entitlement slicing happens downstream.
    pub async fn get_ranked_signals(
        &self,
        interval: &str,
        bearer_token: &str,
    ) -> Result<RankedBatch> {
        let url = format!("{}/signals?interval={}", self.base_url, interval);

        let text = self
            .http_client
            .get(&url)
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;

        let value: Value = serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return Err(Error::EndpointError(message.to_string()));
        }

        let records: Vec<core_types::SignalRecord> =
            serde_json::from_value(value).map_err(Error::DeserializationFailed)?;

        Ok(RankedBatch {
            interval: interval.to_string(),
            records,
        })
    }
}
