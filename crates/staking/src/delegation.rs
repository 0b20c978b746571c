// staking/src/delegation.rs

use chain_core::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// One delegator's stake in one candidate.
///
/// Live delegations always have `shares > 0`; a delegation drained to
/// zero is removed from the store, not retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator_address: Address,
    pub candidate_address: Address,
    pub shares: Amount,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Delegation {
    pub fn new(
        delegator_address: Address,
        candidate_address: Address,
        shares: Amount,
        now: Timestamp,
    ) -> Self {
        Self {
            delegator_address,
            candidate_address,
            shares,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Kind of event recorded in the delegation history log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryKind {
    Delegate,
    Withdraw,
}

/// Append-only audit record of a delegation or withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateHistory {
    pub delegator_address: Address,
    pub candidate_address: Address,
    pub amount: Amount,
    pub kind: HistoryKind,
    pub timestamp: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_delegation_stamps_both_timestamps() {
        let d = Delegation::new(Address::zero(), Address::zero(), Amount::from_u64(5), 42);
        assert_eq!(d.created_at, 42);
        assert_eq!(d.updated_at, 42);
    }
}
