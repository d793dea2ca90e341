// --- View Message Structures (consumed by the UI layer) ---

use chrono::{DateTime, Utc};
use core_types::{AnalyticsLevel, SignalAction, SubscriptionTier, Symbol};
use entitlements::Partition;
use rust_decimal::Decimal;
use serde::Serialize;

/// Represents a log message event to be forwarded to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct ViewLogMessage {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
}

/// A fully partitioned snapshot of the ranked signal list for the authorized
/// subscriber. Replaces any previous snapshot wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct SignalsView {
    pub plan: SubscriptionTier,
    pub analytics_level: AnalyticsLevel,
    /// The chart interval this snapshot was computed over.
    pub interval: String,
    pub signals: Partition,
}

/// The live detail panel for the focused `(symbol, interval)` pair. The
/// analytics fields are already filtered down to what the subscriber's tier
/// unlocks. `action` is `None` when the service sent a recommendation this
/// client version does not recognize; the renderer shows a neutral state.
#[derive(Debug, Clone, Serialize)]
pub struct FocusView {
    pub symbol: Symbol,
    pub interval: String,
    pub action: Option<SignalAction>,
    pub close: Decimal,
    pub ema9: Decimal,
    pub ema21: Decimal,
    pub rsi: Option<Decimal>,
    pub macd: Option<Decimal>,
}

/// The top-level view message enum.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ViewMessage {
    Log(ViewLogMessage),
    /// A new ranked-list snapshot.
    SignalsUpdated(SignalsView),
    /// A new detail snapshot for the focused pair.
    FocusUpdated(FocusView),
    /// No verified session; the caller must route to the login entry point.
    RedirectToLogin,
    /// A verified session with no profile document; route to account
    /// re-creation rather than proceeding with a default entitlement.
    RedirectToSignup,
    /// A retryable failure against an external collaborator. Any signals
    /// already on screen stay on screen.
    TransientError { message: String },
    /// The signal service returned nothing for the current interval.
    SignalsUnavailable { interval: String },
    /// The focus feed returned no candles for the current pair.
    FocusUnavailable { symbol: Symbol, interval: String },
}
