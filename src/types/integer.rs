use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

// int - Signed integers of arbitrary size
//
// Values that fit in an i64 are kept as one; everything else is a BigInt. Equality is numeric, so
// the representation a value happens to use never matters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Integer {
    I64(i64),
    BigInt(BigInt),
}

impl Integer {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Integer::I64(value) => Some(*value),
            Integer::BigInt(value) => value.to_i64(),
        }
    }

    pub fn to_bigint(&self) -> BigInt {
        match self {
            Integer::I64(value) => BigInt::from(*value),
            Integer::BigInt(value) => value.clone(),
        }
    }
}

impl PartialEq for Integer {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Integer::I64(a), Integer::I64(b)) => a == b,
            _ => self.to_bigint() == other.to_bigint(),
        }
    }
}

impl Eq for Integer {}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer::I64(value)
    }
}

impl From<BigInt> for Integer {
    fn from(value: BigInt) -> Self {
        Integer::BigInt(value)
    }
}
