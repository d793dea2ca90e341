// In crates/entitlements/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    UnknownTier(#[from] core_types::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
