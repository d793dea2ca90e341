// In crates/api-client/src/signal_feed.rs

use crate::types::{RankedBatch, SignalBatch};
use crate::{Result, SignalApiClient, TokenSource};
use async_stream::stream;
use core_types::Symbol;
use futures::Stream;
use std::sync::Arc;
use std::time::Duration;

/// A polling subscription to the signal service for one `(symbol, interval)`
/// pair.
///
/// The service only offers request/response HTTP, so the feed wraps a
/// fixed-interval poll in a stream: the consumer gets a cancellable
/// subscription it can drop when the selection changes, instead of managing
/// a bare timer. Each poll mints a fresh bearer token and each yielded batch
/// carries its request tag.
#[derive(Clone)]
pub struct SignalFeed {
    client: SignalApiClient,
    tokens: Arc<dyn TokenSource>,
    poll_interval: Duration,
}

impl SignalFeed {
    pub fn new(
        client: SignalApiClient,
        tokens: Arc<dyn TokenSource>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            tokens,
            poll_interval,
        }
    }

    /// Subscribes to one selection and returns an asynchronous stream of
    /// tagged batches.
    ///
    /// A failed poll yields an `Err` item and the feed keeps going; it is the
    /// consumer's decision what to display in the meantime. Dropping the
    /// stream cancels the subscription.
    pub fn subscribe(
        &self,
        symbol: &Symbol,
        interval: &str,
        limit: u16,
    ) -> impl Stream<Item = Result<SignalBatch>> + use<> {
        let client = self.client.clone();
        let tokens = self.tokens.clone();
        let poll_interval = self.poll_interval;
        let symbol = symbol.clone();
        let interval = interval.to_string();

        stream! {
            tracing::info!(symbol = %symbol, interval = %interval, "Starting signal feed.");
            let mut ticker = tokio::time::interval(poll_interval);
            // A poll slower than the interval must not cause a burst of
            // catch-up requests afterwards.
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let token = match tokens.bearer_token().await {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::warn!(symbol = %symbol, error = %e, "Could not mint a bearer token for this poll.");
                        yield Err(e);
                        continue;
                    }
                };

                match client.get_signals(&symbol, &interval, limit, &token).await {
                    Ok(batch) => {
                        tracing::debug!(
                            symbol = %symbol,
                            interval = %interval,
                            candles = batch.candles.len(),
                            "Signal batch received."
                        );
                        yield Ok(batch);
                    }
                    Err(e) => {
                        tracing::warn!(symbol = %symbol, error = %e, "Signal poll failed.");
                        yield Err(e);
                    }
                }
            }
        }
    }

    /// Subscribes to the full ranked signal list and returns an asynchronous
    /// stream of interval-tagged refreshes.
    ///
    /// Each refresh is a complete replacement for the previous list; the
    /// consumer never merges.
    pub fn subscribe_ranked(&self, interval: &str) -> impl Stream<Item = Result<RankedBatch>> + use<> {
        let client = self.client.clone();
        let tokens = self.tokens.clone();
        let poll_interval = self.poll_interval;
        let interval = interval.to_string();

        stream! {
            tracing::info!(interval = %interval, "Starting ranked signal feed.");
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let token = match tokens.bearer_token().await {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not mint a bearer token for this poll.");
                        yield Err(e);
                        continue;
                    }
                };

                match client.get_ranked_signals(&interval, &token).await {
                    Ok(batch) => {
                        tracing::debug!(
                            interval = %interval,
                            records = batch.records.len(),
                            "Ranked list refresh received."
                        );
                        yield Ok(batch);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Ranked list poll failed.");
                        yield Err(e);
                    }
                }
            }
        }
    }
}
