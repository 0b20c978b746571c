// staking/src/genesis.rs

use crate::{
    candidate::{Candidate, Description},
    delegation::Delegation,
    store::StakeStore,
    StakingError, StakingResult,
};
use chain_core::{Address, Amount, PubKey};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// A validator seeded into the candidate set at genesis. `power` and
/// `max_amount` are whole-token counts, scaled to base units on ingestion.
#[derive(Debug, Clone, Deserialize)]
struct GenesisValidator {
    address: Address,
    pub_key: PubKey,
    power: u64,
    max_amount: u64,
    #[serde(default)]
    cut: String,
}

/// Apply one genesis configuration entry.
///
/// Recognized keys: `reserve_requirement_ratio`, `max_vals` and
/// `validator` (a JSON document seeding one initial candidate). Anything
/// else fails with `UnknownKey`.
pub fn init_state<S: StakeStore>(store: &mut S, key: &str, value: &str) -> StakingResult<()> {
    let mut params = store.load_params();

    match key {
        "reserve_requirement_ratio" => {
            let ratio = Decimal::from_str(value.trim()).map_err(|e| bad_value(key, e))?;
            if ratio <= Decimal::ZERO || ratio > Decimal::ONE {
                return Err(StakingError::BadGenesisValue {
                    key: key.to_string(),
                    reason: "ratio must lie in (0, 1]".to_string(),
                });
            }
            params.reserve_requirement_ratio = ratio;
        }
        "max_vals" => {
            let max_vals: u16 = value.trim().parse().map_err(|e| bad_value(key, e))?;
            if max_vals == 0 {
                return Err(StakingError::BadGenesisValue {
                    key: key.to_string(),
                    reason: "validator cap must be positive".to_string(),
                });
            }
            params.max_validators = max_vals;
        }
        "validator" => seed_validator(store, value)?,
        _ => return Err(StakingError::UnknownKey(key.to_string())),
    }

    store.save_params(params);
    tracing::info!(key, "genesis staking state applied");
    Ok(())
}

fn bad_value<E: std::fmt::Display>(key: &str, err: E) -> StakingError {
    StakingError::BadGenesisValue {
        key: key.to_string(),
        reason: err.to_string(),
    }
}

/// Seed one genesis validator: a candidate plus the matching
/// self-delegation, so share conservation holds from the first block.
fn seed_validator<S: StakeStore>(store: &mut S, value: &str) -> StakingResult<()> {
    let val: GenesisValidator =
        serde_json::from_str(value).map_err(|e| bad_value("validator", e))?;

    if val.address.is_zero() {
        return Err(StakingError::BadValidatorAddress);
    }
    if store.candidate_by_address(&val.address).is_some()
        || store.candidate_by_pub_key(&val.pub_key).is_some()
    {
        return Err(StakingError::CandidateAlreadyExists(val.address));
    }

    let shares = Amount::from_tokens(val.power);
    let max_shares = Amount::from_tokens(val.max_amount);
    if shares > max_shares {
        return Err(StakingError::BadGenesisValue {
            key: "validator".to_string(),
            reason: "power exceeds max_amount".to_string(),
        });
    }

    store.save_candidate(Candidate::new(
        val.pub_key,
        val.address,
        shares.clone(),
        val.power,
        max_shares,
        val.cut,
        Description::default(),
        0,
    ));
    if !shares.is_zero() {
        store.save_delegation(Delegation::new(val.address, val.address, shares, 0));
    }

    tracing::info!(address = %val.address, power = val.power, "genesis validator seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStakeStore;

    fn validator_json(address: &Address, pub_key: &PubKey, power: u64, max_amount: u64) -> String {
        format!(
            r#"{{"address": "{address}", "pub_key": "{pub_key}", "power": {power}, "max_amount": {max_amount}}}"#,
        )
    }

    #[test]
    fn test_set_reserve_requirement_ratio() {
        let mut store = MemStakeStore::new();
        init_state(&mut store, "reserve_requirement_ratio", "0.2").unwrap();
        assert_eq!(
            store.load_params().reserve_requirement_ratio,
            Decimal::from_str("0.2").unwrap()
        );
    }

    #[test]
    fn test_ratio_out_of_range() {
        let mut store = MemStakeStore::new();
        for bad in ["0", "-0.1", "1.5"] {
            assert!(matches!(
                init_state(&mut store, "reserve_requirement_ratio", bad),
                Err(StakingError::BadGenesisValue { .. })
            ));
        }
    }

    #[test]
    fn test_set_max_vals() {
        let mut store = MemStakeStore::new();
        init_state(&mut store, "max_vals", "21").unwrap();
        assert_eq!(store.load_params().max_validators, 21);

        assert!(matches!(
            init_state(&mut store, "max_vals", "lots"),
            Err(StakingError::BadGenesisValue { .. })
        ));
    }

    #[test]
    fn test_unknown_key() {
        let mut store = MemStakeStore::new();
        assert!(matches!(
            init_state(&mut store, "min_fee", "10"),
            Err(StakingError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_seed_validator_with_self_delegation() {
        let mut store = MemStakeStore::new();
        let pub_key = PubKey::generate();
        let address = pub_key.to_address();

        init_state(
            &mut store,
            "validator",
            &validator_json(&address, &pub_key, 10, 1000),
        )
        .unwrap();

        let candidate = store.candidate_by_address(&address).unwrap();
        assert_eq!(candidate.shares, Amount::from_tokens(10));
        assert_eq!(candidate.max_shares, Amount::from_tokens(1000));
        assert_eq!(candidate.power, 10);

        // conservation holds from genesis on
        let delegation = store.delegation(&address, &address).unwrap();
        assert_eq!(delegation.shares, candidate.shares);
    }

    #[test]
    fn test_seed_validator_rejects_zero_address() {
        let mut store = MemStakeStore::new();
        let json = validator_json(&Address::zero(), &PubKey::generate(), 10, 1000);
        assert!(matches!(
            init_state(&mut store, "validator", &json),
            Err(StakingError::BadValidatorAddress)
        ));
    }

    #[test]
    fn test_seed_validator_rejects_duplicate() {
        let mut store = MemStakeStore::new();
        let pub_key = PubKey::generate();
        let address = pub_key.to_address();
        let json = validator_json(&address, &pub_key, 10, 1000);

        init_state(&mut store, "validator", &json).unwrap();
        assert!(matches!(
            init_state(&mut store, "validator", &json),
            Err(StakingError::CandidateAlreadyExists(_))
        ));
    }

    #[test]
    fn test_seed_validator_power_over_cap() {
        let mut store = MemStakeStore::new();
        let pub_key = PubKey::generate();
        let json = validator_json(&pub_key.to_address(), &pub_key, 2000, 1000);
        assert!(matches!(
            init_state(&mut store, "validator", &json),
            Err(StakingError::BadGenesisValue { .. })
        ));
    }
}
