// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A subscription plan identifier that is not part of the recognized set.
    /// This is always surfaced to the caller; an unrecognized plan must never
    /// quietly become a zero-symbol entitlement.
    #[error("unknown subscription tier: \"{0}\"")]
    UnknownTier(String),
}

pub type Result<T> = std::result::Result<T, Error>;
