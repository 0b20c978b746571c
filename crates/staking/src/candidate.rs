// staking/src/candidate.rs

use chain_core::{Address, Amount, PubKey, Timestamp};
use serde::{Deserialize, Serialize};

/// Foundation verification status of a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verified {
    Unverified,
    Verified,
}

/// Free-form candidate metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub moniker: String,
    pub website: String,
    pub details: String,
}

/// A validator candidacy backed by delegated stake.
///
/// `shares` is the sum of all live delegations to this candidate,
/// including the owner's self-stake; the invariant `shares <= max_shares`
/// holds at all times, and a candidate whose shares reach zero is removed
/// from the store rather than kept around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Consensus identity key, unique and immutable
    pub pub_key: PubKey,
    /// Account controlling the candidacy, unique but reassignable
    pub owner_address: Address,
    /// Total stake currently backing this candidate
    pub shares: Amount,
    /// Voting weight handed to downstream validator-set computation
    pub power: u64,
    /// Ceiling the candidate has declared it will accept
    pub max_shares: Amount,
    /// Commission rate, passed through opaquely
    pub cut: String,
    pub description: Description,
    pub verified: Verified,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Candidate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pub_key: PubKey,
        owner_address: Address,
        shares: Amount,
        power: u64,
        max_shares: Amount,
        cut: String,
        description: Description,
        now: Timestamp,
    ) -> Self {
        Self {
            pub_key,
            owner_address,
            shares,
            power,
            max_shares,
            cut,
            description,
            verified: Verified::Unverified,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether delegating `amount` more would stay under the declared cap
    pub fn accepts(&self, amount: &Amount) -> bool {
        match self.shares.checked_add(amount) {
            Some(total) => total <= self.max_shares,
            None => false,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.verified, Verified::Verified)
    }
}
