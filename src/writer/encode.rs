use crate::binary::subfield::{
    append_uint, append_var_int, append_var_int_negative_zero, append_var_uint,
    append_var_uint_usize, serialize_int, serialize_uint,
};
use crate::binary::subfield::MAX_VAR_INT_MAGNITUDE;
use crate::binary::{type_descriptor, LengthCode, Sign, TypeCode, MAX_INLINE_LENGTH};
use crate::error::{Result, TimeComponent, UsageError};
use crate::types::{days_in_month, Decimal, Integer, Precision, Timestamp};
use num_bigint::{BigInt, BigUint};
use num_traits::{pow, Zero};

/// Appends a type descriptor for a representation of `length` octets. As usual, if we need 14 or
/// more bytes then L is set to 14 and the optional length VarUInt is included.
pub(crate) fn append_header(bytestream: &mut Vec<u8>, type_code: TypeCode, length: usize) {
    if length <= MAX_INLINE_LENGTH {
        bytestream.push(type_code.to_byte() + length as u8);
    } else {
        bytestream.push(type_descriptor(type_code, LengthCode::L14));
        append_var_uint_usize(bytestream, length);
    }
}

// ### 2/3: int
//
// Zero is always stored as positive; negative zero is illegal. The magnitude is written in as
// few octets as it needs, so 0 has no magnitude at all. i64::MIN has a magnitude of 2^63, which
// only fits unsigned.
pub(crate) fn encode_i64(value: i64, body: &mut Vec<u8>) -> TypeCode {
    append_uint(body, value.unsigned_abs());
    if value < 0 {
        TypeCode::NegInt
    } else {
        TypeCode::PosInt
    }
}

pub(crate) fn encode_integer(value: &Integer, body: &mut Vec<u8>) -> TypeCode {
    match value {
        Integer::I64(value) => encode_i64(*value, body),
        Integer::BigInt(value) => {
            body.extend(serialize_uint(value.magnitude()));
            match value.sign() {
                num_bigint::Sign::Minus => TypeCode::NegInt,
                _ => TypeCode::PosInt,
            }
        }
    }
}

// ### 4: float
//
// If L is 0, then the the value is 0e0 and representation is empty. This is not to be confused
// with -0e0 which is a distinct value and must be encoded as a normal IEEE float bit pattern.
// Values that survive a trip through f32 are written in 4 octets.
#[allow(clippy::float_cmp)]
pub(crate) fn encode_f64(value: f64, body: &mut Vec<u8>) {
    match value {
        value if value == 0f64 && value.is_sign_positive() => {}
        value if (value as f32) as f64 == value => body.extend(&(value as f32).to_be_bytes()),
        value => body.extend(&value.to_be_bytes()),
    }
}

// ### 5: decimal
//
// The exponent VarInt followed by the coefficient Int. The coefficient subfield is left out when
// it is positive zero, and 0d0 has no representation at all.
pub(crate) fn encode_decimal(value: &Decimal, body: &mut Vec<u8>) -> Result<()> {
    check_exponent(value.exponent())?;
    if value.sign() == Sign::Plus && value.magnitude().is_zero() && value.exponent() == 0 {
        return Ok(());
    }
    append_var_int(body, value.exponent());
    body.extend(serialize_int(value.sign(), value.magnitude()));
    Ok(())
}

fn check_exponent(exponent: i64) -> Result<()> {
    if exponent.unsigned_abs() > MAX_VAR_INT_MAGNITUDE {
        return Err(UsageError::ExponentOutOfRange(exponent).into());
    }
    Ok(())
}

// ### 6: timestamp
//
// Offset and year always, then each component down to the timestamp's precision. An unknown
// offset is negative zero. Components are held to the same ranges the reader accepts.
pub(crate) fn encode_timestamp(value: &Timestamp, body: &mut Vec<u8>) -> Result<()> {
    check_timestamp(value)?;
    match value.offset() {
        Some(minutes) => append_var_int(body, i64::from(minutes)),
        None => append_var_int_negative_zero(body),
    }
    append_var_uint(body, u64::from(value.year_component()));
    let precision = value.precision();
    if precision >= Precision::Month {
        append_var_uint(body, u64::from(value.month_component()));
    }
    if precision >= Precision::Day {
        append_var_uint(body, u64::from(value.day_component()));
    }
    if precision >= Precision::Minute {
        append_var_uint(body, u64::from(value.hour_component()));
        append_var_uint(body, u64::from(value.minute_component()));
    }
    if precision >= Precision::Second {
        append_var_uint(body, u64::from(value.second_component()));
        if let Some(fraction) = value.fraction() {
            append_var_int(body, fraction.exponent());
            body.extend(serialize_int(fraction.sign(), fraction.magnitude()));
        }
    }
    Ok(())
}

fn check_timestamp(value: &Timestamp) -> Result<()> {
    if let Some(minutes) = value.offset() {
        check_component(TimeComponent::Offset, i64::from(minutes), -1439, 1439)?;
    }
    let year = value.year_component();
    let month = value.month_component();
    check_component(TimeComponent::Year, i64::from(year), 1, 9999)?;
    check_component(TimeComponent::Month, i64::from(month), 1, 12)?;
    let days = days_in_month(year, month) as i64;
    check_component(TimeComponent::Day, i64::from(value.day_component()), 1, days)?;
    check_component(TimeComponent::Hour, i64::from(value.hour_component()), 0, 23)?;
    check_component(TimeComponent::Minute, i64::from(value.minute_component()), 0, 59)?;
    check_component(TimeComponent::Second, i64::from(value.second_component()), 0, 59)?;
    if let Some(fraction) = value.fraction() {
        check_exponent(fraction.exponent())?;
        // 0 <= fraction < 1
        let scale = fraction.exponent().unsigned_abs();
        let in_range = fraction.magnitude().is_zero()
            || (fraction.sign() == Sign::Plus
                && fraction.exponent() < 0
                && (scale > u64::from(u16::max_value())
                    || *fraction.magnitude() < pow(BigUint::from(10u8), scale as usize)));
        if !in_range {
            return Err(
                UsageError::TimestampRange(TimeComponent::FractionalSecond, fraction.coefficient())
                    .into(),
            );
        }
    }
    Ok(())
}

fn check_component(kind: TimeComponent, value: i64, min: i64, max: i64) -> Result<()> {
    if value < min || value > max {
        return Err(UsageError::TimestampRange(kind, BigInt::from(value)).into());
    }
    Ok(())
}

// ### 7: symbol
//
// If L is zero then the symbol ID is zero and the length and symbol ID fields are omitted.
pub(crate) fn encode_symbol_id(sid: usize, body: &mut Vec<u8>) {
    append_uint(body, sid as u64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use num_bigint::BigInt;
    use pretty_assertions::assert_eq;

    fn int(value: i64) -> (TypeCode, Vec<u8>) {
        let mut body = vec![];
        let type_code = encode_i64(value, &mut body);
        (type_code, body)
    }

    #[test]
    fn ints_use_the_fewest_octets() {
        assert_eq!(int(0), (TypeCode::PosInt, vec![]));
        assert_eq!(int(255), (TypeCode::PosInt, vec![0xFF]));
        assert_eq!(int(256), (TypeCode::PosInt, vec![0x01, 0x00]));
        assert_eq!(int(-1), (TypeCode::NegInt, vec![0x01]));
        assert_eq!(
            int(i64::MIN),
            (TypeCode::NegInt, hex::decode("8000000000000000").unwrap())
        );
    }

    #[test]
    fn big_integers() {
        let mut body = vec![];
        let value = Integer::BigInt(-(BigInt::from(1u8) << 70usize));
        assert_eq!(encode_integer(&value, &mut body), TypeCode::NegInt);
        assert_eq!(body, hex::decode("400000000000000000").unwrap());
    }

    #[test]
    fn floats_prefer_single_precision() {
        let mut body = vec![];
        encode_f64(0.0, &mut body);
        assert!(body.is_empty());
        encode_f64(-0.0, &mut body);
        assert_eq!(body, vec![0x80, 0, 0, 0]);
        body.clear();
        encode_f64(1.5, &mut body);
        assert_eq!(body, hex::decode("3fc00000").unwrap());
        body.clear();
        encode_f64(0.1, &mut body);
        assert_eq!(body, hex::decode("3fb999999999999a").unwrap());
    }

    #[test]
    fn decimals() {
        let mut body = vec![];
        encode_decimal(&Decimal::from(0), &mut body).unwrap();
        assert!(body.is_empty());
        encode_decimal(&Decimal::negative_zero(0), &mut body).unwrap();
        assert_eq!(body, vec![0x80, 0x80]);
        body.clear();
        encode_decimal(&Decimal::new(BigInt::from(-15), -1), &mut body).unwrap();
        assert_eq!(body, vec![0xC1, 0x8F]);
    }

    #[test]
    fn exponents_must_fit_a_var_int() {
        let mut body = vec![];
        let largest = (1i64 << 62) - 1;
        encode_decimal(&Decimal::new(BigInt::from(1), largest), &mut body).unwrap();
        assert_eq!(body.len(), 10);
        body.clear();
        encode_decimal(&Decimal::new(BigInt::from(1), -largest), &mut body).unwrap();
        assert_eq!(body.len(), 10);

        for exponent in &[1i64 << 62, -(1i64 << 62), i64::MIN, i64::MAX] {
            assert!(matches!(
                encode_decimal(&Decimal::new(BigInt::from(1), *exponent), &mut vec![]),
                Err(Error::Usage(UsageError::ExponentOutOfRange(e))) if e == *exponent
            ));
        }
        let fractional = Timestamp::second(None, 2000, 1, 1, 0, 0, 0)
            .with_fraction(Decimal::new(BigInt::from(1), -(1i64 << 62)));
        assert!(matches!(
            encode_timestamp(&fractional, &mut vec![]),
            Err(Error::Usage(UsageError::ExponentOutOfRange(_)))
        ));
    }

    #[test]
    fn timestamp_components_are_range_checked() {
        let invalid = vec![
            (Timestamp::month(2000, 13), TimeComponent::Month),
            (Timestamp::month(2000, 0), TimeComponent::Month),
            (Timestamp::year(0), TimeComponent::Year),
            (Timestamp::day(2001, 2, 29), TimeComponent::Day),
            (Timestamp::minute(Some(0), 2000, 1, 1, 24, 0), TimeComponent::Hour),
            (Timestamp::minute(Some(1440), 2000, 1, 1, 0, 0), TimeComponent::Offset),
            (Timestamp::second(None, 2000, 1, 1, 0, 0, 60), TimeComponent::Second),
            (
                Timestamp::second(None, 2000, 1, 1, 0, 0, 0)
                    .with_fraction(Decimal::new(BigInt::from(10), -1)),
                TimeComponent::FractionalSecond,
            ),
        ];
        for (timestamp, component) in invalid {
            match encode_timestamp(&timestamp, &mut vec![]) {
                Err(Error::Usage(UsageError::TimestampRange(found, _))) => {
                    assert_eq!(found, component)
                }
                other => panic!("{:?} encoded as {:?}", timestamp, other),
            }
        }
        encode_timestamp(&Timestamp::day(2000, 2, 29), &mut vec![]).unwrap();
    }

    #[test]
    fn timestamps_stop_at_their_precision() {
        let mut body = vec![];
        encode_timestamp(&Timestamp::day(2000, 1, 1), &mut body).unwrap();
        assert_eq!(body, hex::decode("c00fd08181").unwrap());

        body.clear();
        let fractional = Timestamp::second(Some(0), 2000, 1, 1, 0, 0, 0)
            .with_fraction(Decimal::new(BigInt::from(5), -1));
        encode_timestamp(&fractional, &mut body).unwrap();
        assert_eq!(body, hex::decode("800fd08181808080c105").unwrap());
    }
}
