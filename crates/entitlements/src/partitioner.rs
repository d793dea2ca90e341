// In crates/entitlements/src/partitioner.rs

use core_types::{SignalRecord, SymbolAllowance};
use serde::Serialize;

/// The result of applying an entitlement to an ordered signal list: the
/// visible prefix the subscriber may see and the locked suffix shown behind
/// the upgrade prompt. `visible` followed by `locked` reconstructs the input
/// list exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition {
    pub visible: Vec<SignalRecord>,
    pub locked: Vec<SignalRecord>,
}

/// Splits an ordered signal list into visible and locked subsets.
///
/// The input order is caller-determined and significant; this function never
/// reorders or mutates it. An allowance of zero locks everything, an
/// unlimited allowance locks nothing, and an empty list yields two empty
/// subsets.
pub fn partition(signals: &[SignalRecord], allowance: SymbolAllowance) -> Partition {
    let visible_count = allowance.visible_count(signals.len());
    Partition {
        visible: signals[..visible_count].to_vec(),
        locked: signals[visible_count..].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{SignalAction, Symbol};
    use rust_decimal_macros::dec;

    // The eight-symbol watchlist from the signal service, in rank order.
    fn eight_signals() -> Vec<SignalRecord> {
        let rows = [
            ("BTCUSDT", SignalAction::Buy, 82, dec!(45234.50), dec!(2.5)),
            ("ETHUSDT", SignalAction::Sell, 74, dec!(2456.80), dec!(-1.8)),
            ("BNBUSDT", SignalAction::Buy, 69, dec!(312.45), dec!(3.2)),
            ("SOLUSDT", SignalAction::Hold, 58, dec!(98.75), dec!(0.5)),
            ("XRPUSDT", SignalAction::Buy, 77, dec!(0.5234), dec!(4.1)),
            ("ADAUSDT", SignalAction::Sell, 71, dec!(0.4512), dec!(-2.3)),
            ("DOGEUSDT", SignalAction::Hold, 62, dec!(0.0845), dec!(1.2)),
            ("AVAXUSDT", SignalAction::Buy, 84, dec!(36.78), dec!(5.6)),
        ];
        rows.into_iter()
            .map(|(symbol, action, confidence, price, change)| SignalRecord {
                symbol: Symbol(symbol.to_string()),
                action,
                confidence,
                price,
                change,
            })
            .collect()
    }

    #[test]
    fn basic_tier_sees_first_three_of_eight() {
        let signals = eight_signals();
        let split = partition(&signals, SymbolAllowance::Limited(3));

        assert_eq!(split.visible.len(), 3);
        assert_eq!(split.locked.len(), 5);
        assert_eq!(split.visible[0].symbol.0, "BTCUSDT");
        assert_eq!(split.visible[2].symbol.0, "BNBUSDT");
        assert_eq!(split.locked[0].symbol.0, "SOLUSDT");
        assert_eq!(split.locked[4].symbol.0, "AVAXUSDT");
    }

    #[test]
    fn unlimited_allowance_locks_nothing() {
        let signals = eight_signals();
        let split = partition(&signals, SymbolAllowance::Unlimited);

        assert_eq!(split.visible, signals);
        assert!(split.locked.is_empty());
    }

    #[test]
    fn zero_allowance_locks_everything() {
        let signals = eight_signals();
        let split = partition(&signals, SymbolAllowance::Limited(0));

        assert!(split.visible.is_empty());
        assert_eq!(split.locked, signals);
    }

    #[test]
    fn empty_list_partitions_to_empty_for_any_allowance() {
        for allowance in [
            SymbolAllowance::Limited(0),
            SymbolAllowance::Limited(3),
            SymbolAllowance::Unlimited,
        ] {
            let split = partition(&[], allowance);
            assert!(split.visible.is_empty());
            assert!(split.locked.is_empty());
        }
    }

    #[test]
    fn concatenation_reconstructs_the_input_in_order() {
        let signals = eight_signals();
        for allowance in [
            SymbolAllowance::Limited(0),
            SymbolAllowance::Limited(3),
            SymbolAllowance::Limited(6),
            SymbolAllowance::Limited(64),
            SymbolAllowance::Unlimited,
        ] {
            let split = partition(&signals, allowance);
            let mut rebuilt = split.visible.clone();
            rebuilt.extend(split.locked.clone());
            assert_eq!(rebuilt, signals);
        }
    }

    #[test]
    fn partitioning_is_idempotent_and_leaves_the_input_untouched() {
        let signals = eight_signals();
        let before = signals.clone();

        let first = partition(&signals, SymbolAllowance::Limited(6));
        let second = partition(&signals, SymbolAllowance::Limited(6));

        assert_eq!(first, second);
        assert_eq!(signals, before);
    }
}
