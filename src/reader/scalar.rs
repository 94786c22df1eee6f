use crate::binary::subfield::{parse_int, parse_uint, parse_uint_u64, take_var_int, take_var_uint};
use crate::binary::{Sign, TypeCode};
use crate::error::{Error, FormatError, Result, TimeComponent};
use crate::types::{days_in_month, Decimal, Integer, Timestamp};
use num_bigint::{BigInt, BigUint};
use num_traits::identities::Zero;
use num_traits::pow;

/// A decoded scalar, cached by the cursor until it moves.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Scalar {
    Bool(bool),
    Integer(Integer),
    Float(f64),
    Decimal(Decimal),
    Timestamp(Timestamp),
    Symbol(usize),
    String(String),
    Lob(Vec<u8>),
}

/// Decodes the representation of a non-null scalar whose body has been read into `body`.
/// Bools and lobs never come through here.
pub(crate) fn decode(type_code: TypeCode, body: &[u8]) -> Result<Scalar> {
    let scalar = match type_code {
        TypeCode::PosInt => Scalar::Integer(parse_positive_int(body)),
        TypeCode::NegInt => Scalar::Integer(parse_negative_int(body)?),
        TypeCode::Float => Scalar::Float(parse_float(body)?),
        TypeCode::Decimal => Scalar::Decimal(parse_decimal(body)?),
        TypeCode::Timestamp => Scalar::Timestamp(parse_timestamp(body)?),
        TypeCode::Symbol => Scalar::Symbol(parse_symbol_id(body)?),
        TypeCode::String => Scalar::String(parse_string(body)?),
        TypeCode::Clob | TypeCode::Blob => Scalar::Lob(body.to_vec()),
        _ => unreachable!("{:?} has no scalar representation", type_code),
    };
    Ok(scalar)
}

/// ### 2: positive int
///
/// Values of type int are stored using two type codes: 2 for positive values and 3 for negative values.
/// Both codes use a UInt subfield to store the magnitude.
///
/// ```text
///            7       4 3       0
///           +---------+---------+
/// Int value |  2 or 3 |    L    |
///           +---------+---------+======+
///           :     length [VarUInt]     :
///           +==========================+
///           :     magnitude [UInt]     :
///           +==========================+
/// ```
///
/// Zero is always stored as positive; negative zero is illegal.
///
/// Magnitudes of up to eight octets are decoded without allocating, and stay an i64 as long as
/// they fit one.
fn parse_positive_int(body: &[u8]) -> Integer {
    match parse_uint_u64(body) {
        Some(magnitude) if magnitude <= i64::max_value() as u64 => Integer::I64(magnitude as i64),
        Some(magnitude) => Integer::BigInt(BigInt::from(magnitude)),
        None => Integer::BigInt(BigInt::from(parse_uint(body))),
    }
}

/// ### 3: negative int
///
/// When T is 3, both L and the magnitude subfield must be non-zero.
fn parse_negative_int(body: &[u8]) -> Result<Integer> {
    let integer = match parse_uint_u64(body) {
        Some(0) => return Err(FormatError::NegativeZero.into()),
        Some(magnitude) if magnitude <= i64::max_value() as u64 => {
            Integer::I64(-(magnitude as i64))
        }
        Some(magnitude) if magnitude == 1 << 63 => Integer::I64(i64::min_value()),
        Some(magnitude) => Integer::BigInt(-BigInt::from(magnitude)),
        None => {
            let magnitude = parse_uint(body);
            if magnitude.is_zero() {
                return Err(FormatError::NegativeZero.into());
            }
            Integer::BigInt(-BigInt::from(magnitude))
        }
    };
    Ok(integer)
}

/// ### 4: float
///
/// ```text
///               7       4 3       0
///             +---------+---------+
/// Float value |    4    |    L    |
///             +---------+---------+-----------+
///             |   representation [IEEE-754]   |
///             +-------------------------------+
/// ```
///
/// Floats are encoded as big endian octets of their IEEE 754 bit patterns.
///
/// If L is 4, then the representation is 32 bits (4 octets).
/// If L is 8, then the representation is 64 bits (8 octets).
/// If L is 0, then the the value is 0e0 and representation is empty.
///
/// Every NaN comes out as the same canonical NaN.
fn parse_float(body: &[u8]) -> Result<f64> {
    let value = match body.len() {
        0 => 0e0,
        4 => {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(body);
            f64::from(f32::from_be_bytes(bytes))
        }
        8 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(body);
            f64::from_be_bytes(bytes)
        }
        length => return Err(FormatError::FloatLength(length).into()),
    };
    if value.is_nan() {
        return Ok(f64::NAN);
    }
    Ok(value)
}

/// ### 5: decimal
///
/// ```text
///                7       4 3       0
///               +---------+---------+
/// Decimal value |    5    |    L    |
///               +---------+---------+======+
///               :     length [VarUInt]     :
///               +--------------------------+
///               |    exponent [VarInt]     |
///               +--------------------------+
///               |    coefficient [Int]     |
///               +--------------------------+
/// ```
///
/// Decimal representations have two components: exponent (a VarInt) and coefficient (an Int).
/// The decimal’s value is coefficient * 10 ^ exponent.
///
/// The subfield should not be present (that is, it has zero length) when the coefficient’s
/// value is (positive) zero. A coefficient of `0x80` is negative zero.
///
/// If the value is 0. (aka 0d0) then L is zero, there are no length or representation fields, and the
/// entire value is encoded as the single byte 0x50.
fn parse_decimal(body: &[u8]) -> Result<Decimal> {
    if body.is_empty() {
        return Ok(Decimal::from_parts(Sign::Plus, BigUint::zero(), 0));
    }
    let (coefficient, exponent) = take_var_int(body)?;
    let (sign, magnitude) = parse_int(coefficient);
    Ok(Decimal::from_parts(sign, magnitude, exponent.value()))
}

/// ### 6: timestamp
///
/// ```text
///                  7       4 3       0
///                 +---------+---------+
/// Timestamp value |    6    |    L    |
///                 +---------+---------+========+
///                 :      length [VarUInt]      :
///                 +----------------------------+
///                 |      offset [VarInt]       |
///                 +----------------------------+
///                 |       year [VarUInt]       |
///                 +----------------------------+
///                 :       month [VarUInt]      :
///                 +============================+
///                 :         day [VarUInt]      :
///                 +============================+
///                 :        hour [VarUInt]      :
///                 +====                    ====+
///                 :      minute [VarUInt]      :
///                 +============================+
///                 :      second [VarUInt]      :
///                 +============================+
///                 : fraction_exponent [VarInt] :
///                 +============================+
///                 : fraction_coefficient [Int] :
///                 +============================+
/// ```
///
/// The 2 non-optional components are offset and year. An offset of negative zero means the
/// local offset is unknown.
///
/// The hour and minute is considered as a single component, that is, it is illegal to have hour but
/// not minute (and vice versa).
///
/// The fractional seconds must be greater than or equal to zero and less than 1. A missing
/// coefficient defaults to zero. Fractions whose coefficient is zero and exponent is greater than -1
/// are ignored.
///
/// Note: The component values in the binary encoding are always in UTC.
fn parse_timestamp(body: &[u8]) -> Result<Timestamp> {
    let (rest, offset) = take_var_int(body)?;
    let offset = if offset.is_negative_zero() {
        None
    } else {
        let minutes = offset.value();
        if minutes.abs() >= 24 * 60 {
            return Err(range_error(TimeComponent::Offset, minutes));
        }
        Some(minutes as i32)
    };

    let (rest, year) = take_var_uint(rest)?;
    let year = component(TimeComponent::Year, year, 1, 9999)? as u16;
    if rest.is_empty() {
        return Ok(Timestamp::year(year).with_offset(offset));
    }

    let (rest, month) = take_var_uint(rest)?;
    let month = component(TimeComponent::Month, month, 1, 12)? as u8;
    if rest.is_empty() {
        return Ok(Timestamp::month(year, month).with_offset(offset));
    }

    let (rest, day) = take_var_uint(rest)?;
    let day = component(TimeComponent::Day, day, 1, days_in_month(year, month))? as u8;
    if rest.is_empty() {
        return Ok(Timestamp::day(year, month, day).with_offset(offset));
    }

    let (rest, hour) = take_var_uint(rest)?;
    let hour = component(TimeComponent::Hour, hour, 0, 23)? as u8;
    if rest.is_empty() {
        return Err(FormatError::TimestampMissingMinute.into());
    }
    let (rest, minute) = take_var_uint(rest)?;
    let minute = component(TimeComponent::Minute, minute, 0, 59)? as u8;
    if rest.is_empty() {
        return Ok(Timestamp::minute(offset, year, month, day, hour, minute));
    }

    let (rest, second) = take_var_uint(rest)?;
    let second = component(TimeComponent::Second, second, 0, 59)? as u8;
    let timestamp = Timestamp::second(offset, year, month, day, hour, minute, second);
    if rest.is_empty() {
        return Ok(timestamp);
    }

    let (coefficient, exponent) = take_var_int(rest)?;
    let (sign, magnitude) = parse_int(coefficient);
    let exponent = exponent.value();
    if !magnitude.is_zero() {
        // 0 <= coefficient * 10^exponent < 1
        let in_range = sign == Sign::Plus
            && exponent < 0
            && (-exponent > i64::from(u16::max_value())
                || magnitude < pow(BigUint::from(10u32), (-exponent) as usize));
        if !in_range {
            let coefficient = BigInt::from_biguint(
                match sign {
                    Sign::Minus => num_bigint::Sign::Minus,
                    Sign::Plus => num_bigint::Sign::Plus,
                },
                magnitude,
            );
            return Err(FormatError::TimeComponentRange(
                TimeComponent::FractionalSecond,
                coefficient,
            )
            .into());
        }
    }
    Ok(timestamp.with_fraction(Decimal::from_parts(Sign::Plus, magnitude, exponent)))
}

fn component(kind: TimeComponent, value: usize, min: usize, max: usize) -> Result<usize> {
    if value < min || value > max {
        return Err(range_error(kind, value as i64));
    }
    Ok(value)
}

fn range_error(kind: TimeComponent, value: i64) -> Error {
    FormatError::TimeComponentRange(kind, BigInt::from(value)).into()
}

/// ### 7: symbol
///
/// In the binary encoding, all Ion symbols are stored as integer symbol IDs whose text values are
/// provided by a symbol table. If L is zero then the symbol ID is zero and the length and symbol
/// ID fields are omitted.
fn parse_symbol_id(body: &[u8]) -> Result<usize> {
    match parse_uint_u64(body) {
        Some(sid) if sid <= i32::max_value() as u64 => Ok(sid as usize),
        _ => Err(FormatError::SymbolIdOverflow(body.len()).into()),
    }
}

/// ### 8: string
///
/// These are always sequences of Unicode characters, encoded as a sequence of UTF-8 octets.
fn parse_string(body: &[u8]) -> Result<String> {
    std::str::from_utf8(body)
        .map(str::to_owned)
        .map_err(|_| FormatError::StringEncoding.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode_hex(type_code: TypeCode, body: &str) -> Result<Scalar> {
        decode(type_code, &hex::decode(body).unwrap())
    }

    #[test]
    fn ints_stay_i64_until_they_cannot() {
        assert_eq!(
            decode_hex(TypeCode::PosInt, "").unwrap(),
            Scalar::Integer(Integer::I64(0))
        );
        assert_eq!(
            decode_hex(TypeCode::PosInt, "7fffffffffffffff").unwrap(),
            Scalar::Integer(Integer::I64(i64::max_value()))
        );
        assert_eq!(
            decode_hex(TypeCode::PosInt, "8000000000000000").unwrap(),
            Scalar::Integer(Integer::BigInt(BigInt::from(1u64 << 63)))
        );
        assert_eq!(
            decode_hex(TypeCode::NegInt, "8000000000000000").unwrap(),
            Scalar::Integer(Integer::I64(i64::min_value()))
        );
        assert_eq!(
            decode_hex(TypeCode::NegInt, "010000000000000000").unwrap(),
            Scalar::Integer(Integer::BigInt(-BigInt::from(u64::max_value()) - 1))
        );
    }

    #[test]
    fn negative_int_zero_is_malformed() {
        assert!(matches!(
            decode_hex(TypeCode::NegInt, "00"),
            Err(Error::Format(FormatError::NegativeZero))
        ));
        assert!(matches!(
            decode_hex(TypeCode::NegInt, "000000000000000000"),
            Err(Error::Format(FormatError::NegativeZero))
        ));
    }

    #[test]
    fn floats_by_length() {
        assert_eq!(decode_hex(TypeCode::Float, "").unwrap(), Scalar::Float(0e0));
        assert_eq!(decode_hex(TypeCode::Float, "3fc00000").unwrap(), Scalar::Float(1.5));
        assert_eq!(
            decode_hex(TypeCode::Float, "400921fb54442d18").unwrap(),
            Scalar::Float(std::f64::consts::PI)
        );
        assert!(matches!(
            decode_hex(TypeCode::Float, "000000000000000000"),
            Err(Error::Format(FormatError::FloatLength(9)))
        ));
    }

    #[test]
    fn nan_is_canonical() {
        match decode_hex(TypeCode::Float, "7ff8000000000001").unwrap() {
            Scalar::Float(value) => assert_eq!(value.to_bits(), f64::NAN.to_bits()),
            other => panic!("expected a float, got {:?}", other),
        }
    }

    #[test]
    fn decimals() {
        // 1.23
        assert_eq!(
            decode_hex(TypeCode::Decimal, "c27b").unwrap(),
            Scalar::Decimal(Decimal::new(BigInt::from(123), -2))
        );
        // -0d0
        assert_eq!(
            decode_hex(TypeCode::Decimal, "8080").unwrap(),
            Scalar::Decimal(Decimal::negative_zero(0))
        );
        // 0d3, coefficient omitted
        assert_eq!(
            decode_hex(TypeCode::Decimal, "83").unwrap(),
            Scalar::Decimal(Decimal::new(BigInt::zero(), 3))
        );
    }

    /// Examples from the binary encoding documentation of fractional seconds.
    #[test]
    fn timestamp_fraction_equivalences() {
        let whole = decode_hex(TypeCode::Timestamp, "800fd0818180808080").unwrap();
        for equivalent in &["800fd081818080808000", "800fd0818180808080c0", "800fd081818080808081"]
        {
            assert_eq!(decode_hex(TypeCode::Timestamp, equivalent).unwrap(), whole);
        }
        let tenths = decode_hex(TypeCode::Timestamp, "800fd0818180808080c1").unwrap();
        assert_ne!(tenths, whole);
    }

    #[test]
    fn timestamp_precisions_and_offsets() {
        assert_eq!(
            decode_hex(TypeCode::Timestamp, "c00fd0").unwrap(),
            Scalar::Timestamp(Timestamp::year(2000))
        );
        assert_eq!(
            decode_hex(TypeCode::Timestamp, "c00fd08c9f").unwrap(),
            Scalar::Timestamp(Timestamp::day(2000, 12, 31))
        );
        assert_eq!(
            decode_hex(TypeCode::Timestamp, "fc0fd0818197bb").unwrap(),
            Scalar::Timestamp(Timestamp::minute(Some(-60), 2000, 1, 1, 23, 59))
        );
    }

    #[test]
    fn timestamp_component_ranges() {
        // month 13
        assert!(matches!(
            decode_hex(TypeCode::Timestamp, "c00fd08d"),
            Err(Error::Format(FormatError::TimeComponentRange(TimeComponent::Month, _)))
        ));
        // February 30th
        assert!(matches!(
            decode_hex(TypeCode::Timestamp, "c00fd0829e"),
            Err(Error::Format(FormatError::TimeComponentRange(TimeComponent::Day, _)))
        ));
        // hour without minute
        assert!(matches!(
            decode_hex(TypeCode::Timestamp, "800fd0818181"),
            Err(Error::Format(FormatError::TimestampMissingMinute))
        ));
        // fraction of 1.0
        assert!(matches!(
            decode_hex(TypeCode::Timestamp, "800fd0818180808080c10a"),
            Err(Error::Format(FormatError::TimeComponentRange(
                TimeComponent::FractionalSecond,
                _
            )))
        ));
    }

    #[test]
    fn strings_must_be_utf8() {
        assert_eq!(
            decode(TypeCode::String, "héllo".as_bytes()).unwrap(),
            Scalar::String("héllo".to_owned())
        );
        assert!(matches!(
            decode(TypeCode::String, &hex::decode("c328").unwrap()),
            Err(Error::Format(FormatError::StringEncoding))
        ));
    }

    #[test]
    fn symbol_ids_are_plain_uints() {
        assert_eq!(decode_hex(TypeCode::Symbol, "").unwrap(), Scalar::Symbol(0));
        assert_eq!(decode_hex(TypeCode::Symbol, "0a").unwrap(), Scalar::Symbol(10));
        assert_eq!(decode_hex(TypeCode::Symbol, "0100").unwrap(), Scalar::Symbol(256));
    }
}
