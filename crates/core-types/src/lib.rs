// In crates/core-types/src/lib.rs

pub mod error;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use error::{Error, Result};
pub use types::{
    AnalyticsLevel, Entitlement, SignalAction, SignalRecord, SubscriptionProfile,
    SubscriptionTier, Symbol, SymbolAllowance,
};
