// chain-core/src/lib.rs

//! Chain-wide primitives shared across application modules
//!
//! This crate provides:
//! - Arbitrary-precision token amounts
//! - Addresses and consensus public keys
//! - The account ledger capability (balance lookup and transfer)

pub mod account;
pub mod keys;
pub mod types;

pub use account::{Ledger, MemoryLedger};
pub use keys::{Address, PubKey};
pub use types::{Amount, Timestamp};

/// Result type for chain primitive operations
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors that can occur in chain primitive operations
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid public key: {0}")]
    InvalidPubKey(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_basic_imports() {
        // Smoke test to ensure all modules compile
    }
}
