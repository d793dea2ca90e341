// In crates/entitlements/src/lib.rs

use core_types::{AnalyticsLevel, Entitlement, SubscriptionTier, SymbolAllowance};

pub mod error;
pub mod partitioner;

// Re-export public types
pub use error::{Error, Result};
pub use partitioner::{partition, Partition};

/// Returns the capability set for a subscription tier.
///
/// This mapping is total over the recognized tier set and monotone in tier
/// rank: both the symbol allowance and the analytics level only grow as the
/// tier rank grows.
pub fn entitlement_for(tier: SubscriptionTier) -> Entitlement {
    match tier {
        SubscriptionTier::Basic => Entitlement {
            symbol_allowance: SymbolAllowance::Limited(3),
            analytics_level: AnalyticsLevel::Basic,
        },
        SubscriptionTier::Advanced => Entitlement {
            symbol_allowance: SymbolAllowance::Limited(6),
            analytics_level: AnalyticsLevel::Advanced,
        },
        SubscriptionTier::Premium => Entitlement {
            symbol_allowance: SymbolAllowance::Unlimited,
            analytics_level: AnalyticsLevel::Premium,
        },
    }
}

/// Resolves a plan identifier string to its capability set.
///
/// An unrecognized identifier is an `Error::UnknownTier`, never a silent
/// zero-allowance entitlement.
pub fn resolve(plan: &str) -> Result<Entitlement> {
    let tier: SubscriptionTier = plan.parse()?;
    Ok(entitlement_for(tier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_is_total_over_recognized_tiers() {
        for tier in [
            SubscriptionTier::Basic,
            SubscriptionTier::Advanced,
            SubscriptionTier::Premium,
        ] {
            let entitlement = resolve(tier.plan_name()).unwrap();
            assert_eq!(entitlement, entitlement_for(tier));
        }
    }

    #[test]
    fn resolver_mapping_matches_plan_rules() {
        assert_eq!(
            resolve("1 Month").unwrap(),
            Entitlement {
                symbol_allowance: SymbolAllowance::Limited(3),
                analytics_level: AnalyticsLevel::Basic,
            }
        );
        assert_eq!(
            resolve("6 Months").unwrap(),
            Entitlement {
                symbol_allowance: SymbolAllowance::Limited(6),
                analytics_level: AnalyticsLevel::Advanced,
            }
        );
        assert_eq!(
            resolve("Annual").unwrap(),
            Entitlement {
                symbol_allowance: SymbolAllowance::Unlimited,
                analytics_level: AnalyticsLevel::Premium,
            }
        );
    }

    #[test]
    fn unrecognized_plan_is_an_error_not_a_zero_allowance() {
        let err = resolve("Platinum").unwrap_err();
        assert_eq!(
            err,
            Error::UnknownTier(core_types::Error::UnknownTier("Platinum".to_string()))
        );

        // The legacy annual spelling is rejected as well.
        assert!(resolve("12 Months").is_err());
    }

    #[test]
    fn allowance_is_monotone_in_tier_rank() {
        let count_at = |tier: SubscriptionTier, total: usize| {
            entitlement_for(tier).symbol_allowance.visible_count(total)
        };
        for total in [0usize, 3, 6, 8, 100] {
            assert!(count_at(SubscriptionTier::Basic, total) <= count_at(SubscriptionTier::Advanced, total));
            assert!(count_at(SubscriptionTier::Advanced, total) <= count_at(SubscriptionTier::Premium, total));
        }
    }
}
