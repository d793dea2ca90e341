// In crates/engine/src/lib.rs

pub mod auth;
pub mod token;

use anyhow::Result;
use api_client::{RankedBatch, SignalBatch, SignalFeed};
use core_types::{AnalyticsLevel, SubscriptionProfile, SubscriptionTier, Symbol};
use events::{FocusView, SignalsView, ViewMessage};
use futures::StreamExt;
use identity::{AuthClient, ProfileStore, SessionInfo};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

pub use auth::{AuthCommand, AuthState, DenialReason, on_profile_result, on_session_change};
pub use token::SessionTokenSource;

/// The `(symbol, interval)` pair the subscriber is currently focused on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub symbol: Symbol,
    pub interval: String,
}

/// The orchestrator for one subscriber session.
///
/// Observes the identity session, resolves the subscription profile into an
/// entitlement through the authorization gate, and while authorized runs two
/// feeds: the ranked signal list (partitioned per the entitlement) and the
/// focused pair's detail stream. The controller is the sole owner of the
/// current tier and signal state; everything it learns is published as
/// `ViewMessage`s.
pub struct DashboardController {
    auth: AuthClient,
    profile_store: Arc<dyn ProfileStore>,
    feed: SignalFeed,
    /// Interval the ranked list is computed over.
    list_interval: String,
    /// Candles requested per focus poll.
    limit: u16,
    selection_rx: watch::Receiver<Selection>,
    ui_tx: broadcast::Sender<ViewMessage>,
}

impl DashboardController {
    pub fn new(
        auth: AuthClient,
        profile_store: Arc<dyn ProfileStore>,
        feed: SignalFeed,
        list_interval: String,
        limit: u16,
        selection_rx: watch::Receiver<Selection>,
        ui_tx: broadcast::Sender<ViewMessage>,
    ) -> Self {
        Self {
            auth,
            profile_store,
            feed,
            list_interval,
            limit,
            selection_rx,
            ui_tx,
        }
    }

    /// The main, long-running loop for this session.
    ///
    /// Re-runs the authorization gate on every session-change event and only
    /// enters the signal loops from a fully resolved `Authorized` state.
    /// Returns once the session channel closes.
    pub async fn run(&self) -> Result<()> {
        let mut sessions = self.auth.subscribe();

        loop {
            let event = sessions.borrow_and_update().clone();
            let (state, command) = auth::on_session_change(event.as_ref());
            let state = self.apply_command(state, command).await;

            if let AuthState::Authorized { uid, tier } = &state {
                tracing::info!(uid = %uid, plan = %tier, "Session authorized.");
                if !self.run_authorized(*tier, &mut sessions).await? {
                    break;
                }
                // A session event interrupted the signal loops; re-evaluate.
                continue;
            }

            tracing::debug!(state = ?state, "Waiting for the next session event.");
            if sessions.changed().await.is_err() {
                break;
            }
        }

        tracing::info!("Session channel closed; dashboard controller stopping.");
        Ok(())
    }

    /// Executes the side effect an authorization transition asked for and
    /// returns the state the machine lands in.
    async fn apply_command(&self, state: AuthState, command: AuthCommand) -> AuthState {
        match command {
            AuthCommand::None => state,
            AuthCommand::RedirectToLogin => {
                let _ = self.ui_tx.send(ViewMessage::RedirectToLogin);
                state
            }
            AuthCommand::RedirectToSignup => {
                let _ = self.ui_tx.send(ViewMessage::RedirectToSignup);
                state
            }
            AuthCommand::SurfaceError { message } => {
                let _ = self.ui_tx.send(ViewMessage::TransientError { message });
                state
            }
            AuthCommand::FetchProfile { uid } => {
                let result = self.fetch_profile(&uid).await;
                let (next, follow_up) = auth::on_profile_result(&state, result);
                // The follow-up is never another fetch, so one level of
                // handling suffices.
                match follow_up {
                    AuthCommand::RedirectToSignup => {
                        let _ = self.ui_tx.send(ViewMessage::RedirectToSignup);
                    }
                    AuthCommand::SurfaceError { message } => {
                        let _ = self.ui_tx.send(ViewMessage::TransientError { message });
                    }
                    _ => {}
                }
                next
            }
        }
    }

    /// One profile read per authorization cycle, with an explicitly threaded
    /// bearer token.
    async fn fetch_profile(&self, uid: &str) -> identity::Result<SubscriptionProfile> {
        let token = self.auth.fresh_token().await?;
        self.profile_store.fetch_profile(uid, &token).await
    }

    /// The signal loops for an authorized session.
    ///
    /// Runs until the session changes (returns `Ok(true)`, caller
    /// re-evaluates the gate) or the session channel closes (`Ok(false)`).
    /// A selection change cancels and rebuilds the focus feed; the ranked
    /// feed lives for the whole authorized phase.
    async fn run_authorized(
        &self,
        tier: SubscriptionTier,
        sessions: &mut watch::Receiver<Option<SessionInfo>>,
    ) -> Result<bool> {
        let entitlement = entitlements::entitlement_for(tier);
        tracing::info!(
            plan = %tier,
            allowance = ?entitlement.symbol_allowance,
            analytics = ?entitlement.analytics_level,
            "Entitlement resolved."
        );

        // Two handles onto the selection: one armed for change notifications
        // inside select!, one for tag checks against the current value.
        let mut selection_watch = self.selection_rx.clone();
        let selection_reader = self.selection_rx.clone();
        let mut selection_open = true;

        let ranked = self.feed.subscribe_ranked(&self.list_interval);
        tokio::pin!(ranked);

        'selection: loop {
            let selection = selection_watch.borrow_and_update().clone();
            tracing::info!(
                symbol = %selection.symbol,
                interval = %selection.interval,
                "Focus selection active."
            );
            let focus = self
                .feed
                .subscribe(&selection.symbol, &selection.interval, self.limit);
            tokio::pin!(focus);

            loop {
                tokio::select! {
                    changed = sessions.changed() => {
                        tracing::info!("Session event received; leaving the signal loops.");
                        return Ok(changed.is_ok());
                    }
                    changed = selection_watch.changed(), if selection_open => {
                        match changed {
                            Ok(()) => {
                                tracing::info!("Selection changed; cancelling the focus feed.");
                                continue 'selection;
                            }
                            Err(_) => {
                                // No more selection changes will arrive; keep
                                // serving the current one.
                                selection_open = false;
                            }
                        }
                    }
                    item = ranked.next() => {
                        self.on_ranked_item(item, tier, entitlement.analytics_level, entitlement.symbol_allowance)?;
                    }
                    item = focus.next() => {
                        let current = selection_reader.borrow().clone();
                        self.on_focus_item(item, &current, entitlement.analytics_level)?;
                    }
                }
            }
        }
    }

    fn on_ranked_item(
        &self,
        item: Option<api_client::Result<RankedBatch>>,
        tier: SubscriptionTier,
        analytics_level: AnalyticsLevel,
        allowance: core_types::SymbolAllowance,
    ) -> Result<()> {
        match item {
            Some(Ok(batch)) => {
                if batch.records.is_empty() {
                    // An explicit empty state, never stale data.
                    let _ = self.ui_tx.send(ViewMessage::SignalsUnavailable {
                        interval: batch.interval,
                    });
                    return Ok(());
                }
                let partition = entitlements::partition(&batch.records, allowance);
                tracing::info!(
                    visible = partition.visible.len(),
                    locked = partition.locked.len(),
                    "Ranked signal list refreshed."
                );
                let _ = self.ui_tx.send(ViewMessage::SignalsUpdated(SignalsView {
                    plan: tier,
                    analytics_level,
                    interval: batch.interval,
                    signals: partition,
                }));
                Ok(())
            }
            Some(Err(e)) => {
                // Authorized state and any displayed signals stay put; the
                // failure is surfaced inline.
                let _ = self.ui_tx.send(ViewMessage::TransientError {
                    message: e.to_string(),
                });
                Ok(())
            }
            None => anyhow::bail!("Ranked signal feed ended unexpectedly."),
        }
    }

    fn on_focus_item(
        &self,
        item: Option<api_client::Result<SignalBatch>>,
        current: &Selection,
        analytics_level: AnalyticsLevel,
    ) -> Result<()> {
        match item {
            Some(Ok(batch)) => {
                if !batch.matches(&current.symbol, &current.interval) {
                    // A late response for a superseded selection; discard.
                    tracing::warn!(
                        got_symbol = %batch.symbol,
                        got_interval = %batch.interval,
                        want_symbol = %current.symbol,
                        want_interval = %current.interval,
                        "Discarding stale focus batch."
                    );
                    return Ok(());
                }
                if let Some(view) = focus_view(&batch, analytics_level) {
                    let _ = self.ui_tx.send(ViewMessage::FocusUpdated(view));
                } else {
                    // An explicit empty state, never stale data.
                    let _ = self.ui_tx.send(ViewMessage::FocusUnavailable {
                        symbol: batch.symbol,
                        interval: batch.interval,
                    });
                }
                Ok(())
            }
            Some(Err(e)) => {
                let _ = self.ui_tx.send(ViewMessage::TransientError {
                    message: e.to_string(),
                });
                Ok(())
            }
            None => anyhow::bail!("Focus feed for {} ended unexpectedly.", current.symbol),
        }
    }
}

/// Builds the focus detail view from the latest candle of a batch, keeping
/// only the analytics columns the subscriber's tier unlocks.
///
/// A recommendation value this client version does not know is passed on as
/// `None`, never coerced to a recommendation the service did not issue.
pub fn focus_view(batch: &SignalBatch, analytics_level: AnalyticsLevel) -> Option<FocusView> {
    let latest = batch.candles.last()?;
    let action = latest.action();
    if action.is_none() {
        tracing::warn!(signal = %latest.signal, "Unrecognized signal value; showing no recommendation.");
    }

    let advanced = analytics_level >= AnalyticsLevel::Advanced;
    Some(FocusView {
        symbol: batch.symbol.clone(),
        interval: batch.interval.clone(),
        action,
        close: latest.close,
        ema9: latest.ema9,
        ema21: latest.ema21,
        rsi: if advanced { latest.rsi } else { None },
        macd: if advanced { latest.macd } else { None },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::{SignalApiClient, SignalCandle, TokenSource};
    use async_trait::async_trait;
    use core_types::SignalAction;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn candle(signal: &str) -> SignalCandle {
        SignalCandle {
            open_time: 1_767_225_600_000,
            close: dec!(45234.50),
            ema9: dec!(45100.12),
            ema21: dec!(44987.33),
            rsi: Some(dec!(65.0)),
            macd: Some(dec!(12.4)),
            macd_signal: Some(dec!(10.1)),
            signal: signal.to_string(),
        }
    }

    fn batch(symbol: &str, interval: &str, candles: Vec<SignalCandle>) -> SignalBatch {
        SignalBatch {
            symbol: Symbol(symbol.to_string()),
            interval: interval.to_string(),
            candles,
        }
    }

    #[test]
    fn stale_focus_batch_is_detected_by_tag() {
        // A poll for (BTCUSDT, 5m) arriving after the selection moved on to
        // (ETHUSDT, 5m) must not be applied.
        let late = batch("BTCUSDT", "5m", vec![candle("BUY")]);
        let current = Selection {
            symbol: Symbol("ETHUSDT".to_string()),
            interval: "5m".to_string(),
        };
        assert!(!late.matches(&current.symbol, &current.interval));

        let current = Selection {
            symbol: Symbol("BTCUSDT".to_string()),
            interval: "5m".to_string(),
        };
        assert!(late.matches(&current.symbol, &current.interval));
    }

    #[test]
    fn focus_view_uses_the_latest_candle() {
        let b = batch("BTCUSDT", "5m", vec![candle("HOLD"), candle("BUY")]);
        let view = focus_view(&b, AnalyticsLevel::Premium).unwrap();
        assert_eq!(view.action, Some(SignalAction::Buy));
        assert_eq!(view.symbol.0, "BTCUSDT");
        assert_eq!(view.close, dec!(45234.50));
    }

    #[test]
    fn focus_view_strips_analytics_below_advanced() {
        let b = batch("BTCUSDT", "5m", vec![candle("BUY")]);

        let basic = focus_view(&b, AnalyticsLevel::Basic).unwrap();
        assert!(basic.rsi.is_none());
        assert!(basic.macd.is_none());

        let advanced = focus_view(&b, AnalyticsLevel::Advanced).unwrap();
        assert_eq!(advanced.rsi, Some(dec!(65.0)));
        assert_eq!(advanced.macd, Some(dec!(12.4)));
    }

    #[test]
    fn focus_view_of_an_empty_batch_is_none() {
        let b = batch("BTCUSDT", "5m", vec![]);
        assert!(focus_view(&b, AnalyticsLevel::Premium).is_none());
    }

    #[test]
    fn unknown_signal_value_shows_no_recommendation() {
        // The view must never display an action the service did not issue.
        let b = batch("BTCUSDT", "5m", vec![candle("MOON")]);
        let view = focus_view(&b, AnalyticsLevel::Basic).unwrap();
        assert_eq!(view.action, None);
    }

    struct NoProfiles;

    #[async_trait]
    impl ProfileStore for NoProfiles {
        async fn fetch_profile(
            &self,
            uid: &str,
            _bearer_token: &str,
        ) -> identity::Result<SubscriptionProfile> {
            Err(identity::Error::ProfileNotFound {
                uid: uid.to_string(),
            })
        }

        async fn create_profile(
            &self,
            _uid: &str,
            _profile: &SubscriptionProfile,
            _bearer_token: &str,
        ) -> identity::Result<()> {
            Ok(())
        }
    }

    struct StaticToken;

    #[async_trait]
    impl TokenSource for StaticToken {
        async fn bearer_token(&self) -> api_client::Result<String> {
            Ok("token".to_string())
        }
    }

    fn controller() -> (DashboardController, broadcast::Receiver<ViewMessage>) {
        let auth = AuthClient::new("key", "http://127.0.0.1:1", "http://127.0.0.1:1");
        let feed = SignalFeed::new(
            SignalApiClient::new("http://127.0.0.1:1"),
            Arc::new(StaticToken),
            Duration::from_secs(5),
        );
        let (selection_tx, selection_rx) = watch::channel(Selection {
            symbol: Symbol("BTCUSDT".to_string()),
            interval: "5m".to_string(),
        });
        // The selection sender is not needed by these tests.
        drop(selection_tx);
        let (ui_tx, ui_rx) = broadcast::channel(16);
        let controller = DashboardController::new(
            auth,
            Arc::new(NoProfiles),
            feed,
            "5m".to_string(),
            50,
            selection_rx,
            ui_tx,
        );
        (controller, ui_rx)
    }

    #[tokio::test]
    async fn empty_focus_batch_publishes_an_explicit_empty_state() {
        let (controller, mut ui_rx) = controller();
        let current = Selection {
            symbol: Symbol("BTCUSDT".to_string()),
            interval: "5m".to_string(),
        };

        let b = batch("BTCUSDT", "5m", vec![]);
        controller
            .on_focus_item(Some(Ok(b)), &current, AnalyticsLevel::Basic)
            .unwrap();

        match ui_rx.try_recv().unwrap() {
            ViewMessage::FocusUnavailable { symbol, interval } => {
                assert_eq!(symbol.0, "BTCUSDT");
                assert_eq!(interval, "5m");
            }
            other => panic!("unexpected view message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_focus_batch_publishes_nothing() {
        let (controller, mut ui_rx) = controller();
        let current = Selection {
            symbol: Symbol("ETHUSDT".to_string()),
            interval: "5m".to_string(),
        };

        let late = batch("BTCUSDT", "5m", vec![candle("BUY")]);
        controller
            .on_focus_item(Some(Ok(late)), &current, AnalyticsLevel::Basic)
            .unwrap();

        assert!(ui_rx.try_recv().is_err());
    }
}
