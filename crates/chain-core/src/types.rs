// chain-core/src/types.rs

use crate::{ChainError, ChainResult};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp in Unix epoch seconds
pub type Timestamp = u64;

/// Number of base units per whole token (18-decimal fixed point)
const BASE_UNITS_PER_TOKEN: u64 = 18;

/// Token amount in base units (arbitrary precision, never negative)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(BigUint);

impl Amount {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(BigUint::from(value))
    }

    /// Scale a whole-token count into base units (1 token = 10^18 units)
    pub fn from_tokens(tokens: u64) -> Self {
        Self(BigUint::from(tokens) * BigUint::from(10u64).pow(BASE_UNITS_PER_TOKEN as u32))
    }

    /// Parse a decimal string of base units. Signs, fractions and any
    /// non-digit input are rejected.
    pub fn parse(s: &str) -> ChainResult<Self> {
        let value =
            BigUint::from_str(s.trim()).map_err(|_| ChainError::InvalidAmount(s.to_string()))?;
        Ok(Self(value))
    }

    pub fn inner(&self) -> &BigUint {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        Some(Amount(&self.0 + &other.0))
    }

    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        if self.0 < other.0 {
            None
        } else {
            Some(Amount(&self.0 - &other.0))
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_arithmetic() {
        let a = Amount::from_u64(100);
        let b = Amount::from_u64(50);

        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum, Amount::from_u64(150));

        let diff = sum.checked_sub(&b).unwrap();
        assert_eq!(diff, Amount::from_u64(100));
    }

    #[test]
    fn test_amount_underflow() {
        let a = Amount::from_u64(50);
        let b = Amount::from_u64(100);

        assert!(a.checked_sub(&b).is_none());
    }

    #[test]
    fn test_parse_decimal_string() {
        let parsed = Amount::parse("1000000000000000000000").unwrap();
        assert_eq!(parsed, Amount::from_tokens(1000));

        assert!(Amount::parse("").is_err());
        assert!(Amount::parse("-5").is_err());
        assert!(Amount::parse("12.5").is_err());
        assert!(Amount::parse("abc").is_err());
    }

    #[test]
    fn test_from_tokens_scaling() {
        let one = Amount::from_tokens(1);
        assert_eq!(one, Amount::parse("1000000000000000000").unwrap());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_display_parse_round_trip(n in any::<u128>()) {
                let amount = Amount::new(BigUint::from(n));
                prop_assert_eq!(Amount::parse(&amount.to_string()).unwrap(), amount);
            }

            #[test]
            fn test_sub_undoes_add(a in any::<u64>(), b in any::<u64>()) {
                let x = Amount::from_u64(a);
                let y = Amount::from_u64(b);
                let sum = x.checked_add(&y).unwrap();
                prop_assert_eq!(sum.checked_sub(&y).unwrap(), x);
            }
        }
    }
}
