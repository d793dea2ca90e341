// In crates/billing/src/lib.rs

use chrono::{DateTime, Utc};
use core_types::SubscriptionTier;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::time::Duration;

/// How long the mock gateway pretends to talk to a processor.
const SIMULATED_PROCESSING_DELAY: Duration = Duration::from_millis(1500);

/// One entry on the pricing page.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub tier: SubscriptionTier,
    pub price_usd: Decimal,
    pub billing_cycle: &'static str,
    pub trial: &'static str,
    pub features: &'static [&'static str],
    pub recommended: bool,
}

impl Plan {
    pub fn name(&self) -> &'static str {
        self.tier.plan_name()
    }
}

/// The full pricing catalog, in ascending tier order.
pub fn catalog() -> Vec<Plan> {
    vec![
        Plan {
            tier: SubscriptionTier::Basic,
            price_usd: dec!(10),
            billing_cycle: "monthly",
            trial: "1 week free",
            features: &[
                "Up to 3 trading pairs",
                "Real-time trading signals",
                "Buy/Sell/Hold indicators",
                "Email notifications",
                "Basic market analysis",
                "Mobile access",
            ],
            recommended: false,
        },
        Plan {
            tier: SubscriptionTier::Advanced,
            price_usd: dec!(50),
            billing_cycle: "6-month",
            trial: "1 week free",
            features: &[
                "Up to 6 trading pairs",
                "Advanced signal alerts",
                "Priority support",
                "Historical data access",
                "Custom watchlists",
                "SMS notifications",
                "Advanced analytics",
            ],
            recommended: true,
        },
        Plan {
            tier: SubscriptionTier::Premium,
            price_usd: dec!(90),
            billing_cycle: "yearly",
            trial: "Extra benefits",
            features: &[
                "Unlimited trading pairs",
                "Premium signal accuracy",
                "1-on-1 strategy sessions",
                "API access",
                "Portfolio analytics",
                "Exclusive market insights",
                "Early signal access",
                "Premium ML predictions",
            ],
            recommended: false,
        },
    ]
}

/// Looks a plan up by its canonical name.
pub fn plan_by_name(name: &str) -> Option<Plan> {
    catalog().into_iter().find(|p| p.name() == name)
}

/// The confirmation handed back by the payment step.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub plan: SubscriptionTier,
    pub amount_usd: Decimal,
    pub paid_at: DateTime<Utc>,
}

/// A stand-in for a real payment gateway.
///
/// Sleeps for a fixed simulated delay and unconditionally reports success.
/// The only contract the rest of the system relies on is that the success
/// callback carries the selected plan; everything else here is placeholder
/// by design and will be replaced by a real processor integration.
#[derive(Debug, Clone, Default)]
pub struct MockPaymentGateway;

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self
    }

    pub async fn charge(&self, plan: &Plan) -> PaymentReceipt {
        tracing::info!(plan = %plan.name(), amount = %plan.price_usd, "Processing payment (mock).");
        tokio::time::sleep(SIMULATED_PROCESSING_DELAY).await;
        tracing::info!(plan = %plan.name(), "Payment confirmed (mock).");
        PaymentReceipt {
            plan: plan.tier,
            amount_usd: plan.price_usd,
            paid_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_tier_in_order() {
        let plans = catalog();
        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0].tier, SubscriptionTier::Basic);
        assert_eq!(plans[1].tier, SubscriptionTier::Advanced);
        assert_eq!(plans[2].tier, SubscriptionTier::Premium);
        // Exactly one recommended plan.
        assert_eq!(plans.iter().filter(|p| p.recommended).count(), 1);
    }

    #[test]
    fn plans_are_found_by_canonical_name() {
        assert_eq!(
            plan_by_name("6 Months").unwrap().tier,
            SubscriptionTier::Advanced
        );
        assert!(plan_by_name("12 Months").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn mock_gateway_always_succeeds_with_the_selected_plan() {
        let plan = plan_by_name("Annual").unwrap();
        let receipt = MockPaymentGateway::new().charge(&plan).await;
        assert_eq!(receipt.plan, SubscriptionTier::Premium);
        assert_eq!(receipt.amount_usd, dec!(90));
    }
}
