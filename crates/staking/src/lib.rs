// staking/src/lib.rs

//! Delegated-proof-of-stake state-transition module
//!
//! This crate implements the staking core of the chain:
//! - Candidacy lifecycle (declare, update, verify, withdraw)
//! - Delegation accounting with per-candidate share conservation
//! - The two-phase check/deliver transaction pipeline used by the host
//!   BFT engine: admission checks are pure reads, delivery re-validates
//!   and applies effects all-or-nothing
//!
//! The candidate/delegation store and the account ledger are injected as
//! capabilities, so the host can back them with its persistent KV store
//! while tests run against the in-memory implementations.

pub mod candidate;
pub mod check;
pub mod context;
pub mod delegation;
pub mod deliver;
pub mod engine;
pub mod genesis;
pub mod params;
pub mod store;
pub mod tx;

pub use candidate::{Candidate, Description, Verified};
pub use context::Context;
pub use delegation::{DelegateHistory, Delegation, HistoryKind};
pub use engine::{check_tx, deliver_tx};
pub use genesis::init_state;
pub use params::Params;
pub use store::{MemStakeStore, StakeStore};
pub use tx::StakeTx;

use chain_core::ChainError;

/// Result type for staking operations
pub type StakingResult<T> = Result<T, StakingError>;

/// Errors that can occur while checking or delivering staking transactions
#[derive(Debug, thiserror::Error)]
pub enum StakingError {
    #[error("transaction must carry exactly one signer")]
    MissingSignature,

    #[error("address or public key has already declared candidacy")]
    AlreadyDeclared,

    #[error("sender has no declared candidacy")]
    NoCandidateForSender,

    #[error("no candidate at address {0}")]
    NoSuchCandidate(chain_core::Address),

    #[error("no delegation from {delegator} to candidate {candidate}")]
    NoSuchDelegation {
        delegator: chain_core::Address,
        candidate: chain_core::Address,
    },

    #[error("candidacy verification is restricted to the foundation account")]
    VerificationDisallowed,

    #[error("candidate is already verified")]
    AlreadyVerified,

    #[error("bad amount: {0}")]
    BadAmount(String),

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("stake would exceed the candidate's declared maximum")]
    MaxStakeExceeded,

    #[error("validator address cannot be zero")]
    BadValidatorAddress,

    #[error("candidate already exists at {0}")]
    CandidateAlreadyExists(chain_core::Address),

    #[error("unknown genesis state key: {0}")]
    UnknownKey(String),

    #[error("bad genesis value for {key}: {reason}")]
    BadGenesisValue { key: String, reason: String },

    /// A record the serialized execution model guarantees to exist was
    /// missing or inconsistent. Not a user error.
    #[error("staking invariant violated: {0}")]
    InvariantViolation(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] ChainError),
}
