// staking/src/tx.rs

use crate::{candidate::Description, StakingError, StakingResult};
use chain_core::{Address, Amount, PubKey};
use serde::{Deserialize, Serialize};

/// Staking transaction payloads.
///
/// A closed sum over the six kinds the module accepts; both the admission
/// checker and the deliverer match it exhaustively, so adding a kind
/// without handling it everywhere fails to compile. Amounts travel as
/// decimal strings of base units and are parsed during admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeTx {
    DeclareCandidacy(DeclareCandidacy),
    UpdateCandidacy(UpdateCandidacy),
    WithdrawCandidacy(WithdrawCandidacy),
    VerifyCandidacy(VerifyCandidacy),
    Delegate(Delegate),
    Withdraw(Withdraw),
}

/// Register the sender as a validator candidate. Implicitly self-delegates
/// `max_amount × reserve_requirement_ratio`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclareCandidacy {
    pub pub_key: PubKey,
    pub max_amount: String,
    pub cut: String,
    pub description: Description,
}

/// Amend the sender's candidacy. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCandidacy {
    pub new_address: Option<Address>,
    pub max_amount: Option<String>,
    pub cut: Option<String>,
    pub description: Option<Description>,
}

/// Exit candidacy entirely, refunding every delegator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawCandidacy;

/// Foundation-only: mark a candidacy verified or unverified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyCandidacy {
    pub candidate_address: Address,
    pub verified: bool,
}

/// Stake `amount` behind the candidate at `validator_address`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegate {
    pub validator_address: Address,
    pub amount: String,
}

/// Withdraw the sender's entire delegation from a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdraw {
    pub validator_address: Address,
}

/// Parse a wire amount. Rejects anything that is not a positive decimal
/// integer; a zero stake movement has no meaning in this module.
pub(crate) fn parse_amount(raw: &str) -> StakingResult<Amount> {
    let amount = Amount::parse(raw).map_err(|_| StakingError::BadAmount(raw.to_string()))?;
    if amount.is_zero() {
        return Err(StakingError::BadAmount(raw.to_string()));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_accepts_base_units() {
        let amount = parse_amount("50000000000000000000").unwrap();
        assert_eq!(amount, Amount::from_tokens(50));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(matches!(
            parse_amount("12.5"),
            Err(StakingError::BadAmount(_))
        ));
        assert!(matches!(
            parse_amount("-3"),
            Err(StakingError::BadAmount(_))
        ));
        assert!(matches!(parse_amount(""), Err(StakingError::BadAmount(_))));
    }

    #[test]
    fn test_parse_amount_rejects_zero() {
        assert!(matches!(parse_amount("0"), Err(StakingError::BadAmount(_))));
    }

    #[test]
    fn test_tx_round_trips_through_json() {
        let tx = StakeTx::Delegate(Delegate {
            validator_address: Address::zero(),
            amount: "1000".into(),
        });
        let json = serde_json::to_string(&tx).unwrap();
        let back: StakeTx = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, back);
    }
}
