// In crates/api-client/src/types.rs

use core_types::{SignalAction, SignalRecord, Symbol};
use rust_decimal::Decimal;
use serde::Deserialize;

/// One candle row as returned by `GET /signals/{symbol}`.
///
/// The endpoint is a versioned external contract: the analytics columns are
/// only present for consumers whose tier unlocks them, and new columns may
/// appear at any time, so everything beyond the core price/EMA fields is
/// optional and unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignalCandle {
    pub open_time: i64,
    pub close: Decimal,
    pub ema9: Decimal,
    pub ema21: Decimal,
    #[serde(default)]
    pub rsi: Option<Decimal>,
    #[serde(default)]
    pub macd: Option<Decimal>,
    #[serde(default)]
    pub macd_signal: Option<Decimal>,
    /// The service's recommendation for this candle ("BUY", "SELL", "HOLD").
    pub signal: String,
}

impl SignalCandle {
    /// The recommendation as a typed action, or `None` for a value this
    /// client version does not know.
    pub fn action(&self) -> Option<SignalAction> {
        match self.signal.as_str() {
            "BUY" => Some(SignalAction::Buy),
            "SELL" => Some(SignalAction::Sell),
            "HOLD" => Some(SignalAction::Hold),
            _ => None,
        }
    }
}

/// One poll result, tagged with the `(symbol, interval)` pair it was
/// requested for.
///
/// The tag is what lets the consumer discard late responses for a superseded
/// selection instead of applying them to the current one.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBatch {
    pub symbol: Symbol,
    pub interval: String,
    pub candles: Vec<SignalCandle>,
}

impl SignalBatch {
    /// Whether this batch was fetched for the given selection.
    pub fn matches(&self, symbol: &Symbol, interval: &str) -> bool {
        self.symbol == *symbol && self.interval == interval
    }
}

/// One refresh of the full ranked signal list, tagged with the interval it
/// was computed over. The record order is the service's rank and is
/// significant; each refresh replaces the previous list wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedBatch {
    pub interval: String,
    pub records: Vec<SignalRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candle_tolerates_missing_analytics_columns() {
        // A basic-tier response carries no RSI/MACD columns.
        let json = r#"{
            "open_time": 1767225600000,
            "close": "45234.50",
            "ema9": "45100.12",
            "ema21": "44987.33",
            "signal": "BUY"
        }"#;
        let candle: SignalCandle = serde_json::from_str(json).unwrap();
        assert_eq!(candle.action(), Some(SignalAction::Buy));
        assert!(candle.rsi.is_none());
        assert!(candle.macd.is_none());
    }

    #[test]
    fn batch_tag_matching() {
        let batch = SignalBatch {
            symbol: Symbol("BTCUSDT".to_string()),
            interval: "5m".to_string(),
            candles: vec![],
        };
        assert!(batch.matches(&Symbol("BTCUSDT".to_string()), "5m"));
        assert!(!batch.matches(&Symbol("ETHUSDT".to_string()), "5m"));
        assert!(!batch.matches(&Symbol("BTCUSDT".to_string()), "1h"));
    }
}
