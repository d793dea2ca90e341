// In crates/core-types/src/types.rs

use crate::error::Error;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A newtype wrapper for an exchange pair identifier (e.g., "BTCUSDT").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of subscription plans, in ascending rank order.
///
/// The canonical plan names are "1 Month", "6 Months" and "Annual". The
/// historical "12 Months" spelling was a rename, not a separate plan, and is
/// rejected at parse time; stored profiles still carrying it must be migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SubscriptionTier {
    Basic,
    Advanced,
    Premium,
}

impl SubscriptionTier {
    /// The canonical plan name as it appears in profile documents and on the
    /// pricing page.
    pub fn plan_name(&self) -> &'static str {
        match self {
            SubscriptionTier::Basic => "1 Month",
            SubscriptionTier::Advanced => "6 Months",
            SubscriptionTier::Premium => "Annual",
        }
    }
}

impl FromStr for SubscriptionTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1 Month" => Ok(SubscriptionTier::Basic),
            "6 Months" => Ok(SubscriptionTier::Advanced),
            "Annual" => Ok(SubscriptionTier::Premium),
            other => Err(Error::UnknownTier(other.to_string())),
        }
    }
}

impl TryFrom<String> for SubscriptionTier {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SubscriptionTier> for String {
    fn from(tier: SubscriptionTier) -> Self {
        tier.plan_name().to_string()
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.plan_name())
    }
}

/// How many symbols a tier may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolAllowance {
    Limited(u32),
    Unlimited,
}

impl SymbolAllowance {
    /// The number of signals visible out of a list of `total`.
    pub fn visible_count(&self, total: usize) -> usize {
        match self {
            SymbolAllowance::Limited(n) => (*n as usize).min(total),
            SymbolAllowance::Unlimited => total,
        }
    }
}

/// The depth of analytics a tier unlocks, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsLevel {
    Basic,
    Advanced,
    Premium,
}

/// The capability set derived from a subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub symbol_allowance: SymbolAllowance,
    pub analytics_level: AnalyticsLevel,
}

/// The recommendation attached to one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

/// One externally computed trading recommendation for a symbol.
///
/// Produced by the signal service; opaque and immutable once received. The
/// position of a record within its batch is significant (the service returns
/// a fixed, meaningful rank).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub symbol: Symbol,
    pub action: SignalAction,
    /// Model confidence, 0-100.
    pub confidence: u8,
    pub price: Decimal,
    /// Signed 24h change, in percent.
    pub change: Decimal,
}

/// The subscription profile document stored per user, keyed by uid.
///
/// `plan` stays a raw string here: the document is external data, and an
/// unrecognized plan name must surface as an `UnknownTier` error at
/// resolution time, not disappear into a deserialization failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionProfile {
    pub plan: String,
    pub billing_cycle: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
