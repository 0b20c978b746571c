// staking/src/context.rs

use crate::{StakingError, StakingResult};
use chain_core::{Address, Timestamp};

/// Execution context the host engine hands over with each transaction:
/// the authenticated signer set and the time of the block being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub signers: Vec<Address>,
    pub block_time: Timestamp,
}

impl Context {
    pub fn new(signers: Vec<Address>, block_time: Timestamp) -> Self {
        Self {
            signers,
            block_time,
        }
    }

    /// Context for a single-signer transaction
    pub fn with_signer(signer: Address, block_time: Timestamp) -> Self {
        Self::new(vec![signer], block_time)
    }

    /// Wall-clock context for mempool-side admission, where no block time
    /// exists yet. Delivery must always use the engine-provided block time.
    pub fn now(signers: Vec<Address>) -> Self {
        Self::new(signers, chrono::Utc::now().timestamp() as Timestamp)
    }

    /// The transaction sender. Staking transactions carry exactly one
    /// signer; anything else is rejected before dispatch.
    pub fn single_signer(&self) -> StakingResult<Address> {
        match self.signers.as_slice() {
            [signer] => Ok(*signer),
            _ => Err(StakingError::MissingSignature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_signer() {
        let ctx = Context::with_signer(Address::zero(), 7);
        assert_eq!(ctx.single_signer().unwrap(), Address::zero());
    }

    #[test]
    fn test_no_signers_rejected() {
        let ctx = Context::new(vec![], 7);
        assert!(matches!(
            ctx.single_signer(),
            Err(StakingError::MissingSignature)
        ));
    }

    #[test]
    fn test_multiple_signers_rejected() {
        let ctx = Context::new(vec![Address::zero(), Address::zero()], 7);
        assert!(matches!(
            ctx.single_signer(),
            Err(StakingError::MissingSignature)
        ));
    }
}
