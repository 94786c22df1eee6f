use crate::binary::Sign;
use num_bigint::{BigInt, BigUint};
use num_traits::identities::Zero;
use serde::{Deserialize, Serialize};

// decimal - Decimal-encoded real numbers of arbitrary precision
// Reference http://speleotrove.com/decimal/decarith.html
//
// The coefficient is kept as sign and magnitude so that negative zero survives: `-0d0` and `0d0`
// are different values. Equality is structural, so `1.0` (10 × 10^-1) is not equal to `1.`
// either, which matches Ion's data model where precision is significant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decimal {
    sign: Sign,
    magnitude: BigUint,
    exponent: i64,
}

impl Decimal {
    pub fn new(coefficient: BigInt, exponent: i64) -> Self {
        let sign = match coefficient.sign() {
            num_bigint::Sign::Minus => Sign::Minus,
            _ => Sign::Plus,
        };
        Decimal {
            sign,
            magnitude: coefficient.magnitude().clone(),
            exponent,
        }
    }

    pub fn from_parts(sign: Sign, magnitude: BigUint, exponent: i64) -> Self {
        Decimal {
            sign,
            magnitude,
            exponent,
        }
    }

    pub fn negative_zero(exponent: i64) -> Self {
        Decimal::from_parts(Sign::Minus, BigUint::zero(), exponent)
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn magnitude(&self) -> &BigUint {
        &self.magnitude
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// The signed coefficient. Negative zero collapses to zero here.
    pub fn coefficient(&self) -> BigInt {
        let sign = match self.sign {
            Sign::Minus => num_bigint::Sign::Minus,
            Sign::Plus => num_bigint::Sign::Plus,
        };
        BigInt::from_biguint(sign, self.magnitude.clone())
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    pub fn is_negative_zero(&self) -> bool {
        self.sign == Sign::Minus && self.magnitude.is_zero()
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(BigInt::from(value), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn negative_zero_is_distinct() {
        let negative = Decimal::negative_zero(0);
        let positive = Decimal::new(BigInt::zero(), 0);
        assert!(negative.is_negative_zero());
        assert!(!positive.is_negative_zero());
        assert_ne!(negative, positive);
        assert_eq!(negative.coefficient(), positive.coefficient());
    }

    #[test]
    fn coefficient_keeps_sign() {
        let decimal = Decimal::new(BigInt::from(-1234), -2);
        assert_eq!(decimal.sign(), Sign::Minus);
        assert_eq!(decimal.magnitude(), &BigUint::from(1234u32));
        assert_eq!(decimal.coefficient(), BigInt::from(-1234));
    }
}
