// staking/src/params.rs

use chain_core::{Address, Amount};
use num_bigint::BigUint;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Chain-wide staking configuration.
///
/// Initialized at genesis through `init_state` and read by every
/// check/deliver call; nothing else mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Minimum self-stake fraction a candidate must hold against its
    /// declared maximum stake, in (0, 1]
    pub reserve_requirement_ratio: Decimal,
    /// Cap on the number of validators derived from the candidate set
    pub max_validators: u16,
    /// Escrow account custodying all delegated-but-not-withdrawn stake
    pub hold_account: Address,
    /// Account allowed to verify candidacies
    pub foundation_account: Address,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            reserve_requirement_ratio: Decimal::new(1, 1), // 0.1
            max_validators: 4,
            hold_account: Address::new(*b"staking/hold/account"),
            foundation_account: Address::new(*b"staking/foundation/0"),
        }
    }
}

impl Params {
    /// The self-stake a candidate implicitly bonds when declaring (or
    /// re-bonds when updating) a maximum stake of `max_amount`
    pub fn self_stake_for(&self, max_amount: &Amount) -> Amount {
        scale_by_ratio(max_amount, self.reserve_requirement_ratio)
    }
}

/// Multiply a base-unit amount by a decimal ratio, truncating toward zero.
/// Integer arithmetic throughout, so every replica computes the same value.
pub fn scale_by_ratio(amount: &Amount, ratio: Decimal) -> Amount {
    let mantissa = BigUint::from(ratio.mantissa().unsigned_abs());
    let divisor = BigUint::from(10u64).pow(ratio.scale());
    Amount::new(amount.inner() * mantissa / divisor)
}
