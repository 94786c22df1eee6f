use crate::binary::Sign;
use crate::error::{Error, FormatError, IonError, IonResult};
use nom::bytes::complete::{take, take_while};
use num_bigint::BigUint;
use num_traits::identities::Zero;

/// Documentation draws extensively on http://amzn.github.io/ion-docs/docs/binary.html.

/// ## Basic Field Formats
///
/// Binary-encoded Ion values are comprised of one or more fields, and the fields use a small number
/// of basic formats (separate from the Ion types visible to users).

/// Lengths, field names and annotations are VarUInts in the 32-bit signed range, which never
/// needs more than five octets.
pub(crate) const MAX_VAR_UINT_BYTES: usize = 5;
const MAX_VAR_UINT_VALUE: u64 = i32::max_value() as u64;

/// Six payload bits in the first octet and seven in each of the other eight keep the magnitude
/// within 62 bits, so every accepted VarInt fits an i64.
pub(crate) const MAX_VAR_INT_BYTES: usize = 9;
pub(crate) const MAX_VAR_INT_MAGNITUDE: u64 = (1 << 62) - 1;

/// ### UInt and Int Fields
///
/// ```text
///             7                       0
///            +-------------------------+
/// UInt field |          bits           |
///            +-------------------------+
///            :          bits           :
///            +=========================+
///             n+7                     n
///
///              7  6                   0
///            +---+---------------------+
/// Int field  |   |      bits           |
///            +---+---------------------+
///              ^
///              +--sign
///            +=========================+
///            :          bits           :
///            +=========================+
///             n+7                     n
/// ```
///
/// UInts are sequences of octets, interpreted as big-endian. Ints are sign-and-magnitude big
/// endian integers with the sign on the highest-order bit of the first octet. A zero magnitude
/// keeps its sign, which is how `-0` decimal coefficients are represented.
pub(crate) fn parse_int(bytes: &[u8]) -> (Sign, BigUint) {
    match bytes.split_first() {
        None => (Sign::Plus, BigUint::zero()),
        Some((first, rest)) => {
            let sign = if first & 0b1000_0000 != 0 {
                Sign::Minus
            } else {
                Sign::Plus
            };
            let mut magnitude = Vec::with_capacity(bytes.len());
            magnitude.push(first & 0b0111_1111); // clear the sign bit to get the magnitude
            magnitude.extend_from_slice(rest);
            (sign, BigUint::from_bytes_be(&magnitude))
        }
    }
}

pub(crate) fn parse_uint(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Reads a UInt of at most eight octets without allocating.
pub(crate) fn parse_uint_u64(bytes: &[u8]) -> Option<u64> {
    if bytes.len() > 8 {
        return None;
    }
    Some(
        bytes
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)),
    )
}

/// ## VarUInt and VarInt Fields
///
/// ```text
///                 7  6                   0       n+7 n+6                 n
///               +===+=====================+     +---+---------------------+
/// VarUInt field : 0 :         bits        :  …  | 1 |         bits        |
///               +===+=====================+     +---+---------------------+
///
///                7   6  5               0       n+7 n+6                 n
///              +===+                           +---+
/// VarInt field : 0 :       payload          …  | 1 |       payload
///              +===+                           +---+
///                  +---+-----------------+         +=====================+
///                  |   |   magnitude     |  …      :       magnitude     :
///                  +---+-----------------+         +=====================+
///                ^   ^                           ^
///                |   +--sign                     +--end flag
///                +--end flag
/// ```
///
/// The high-order bit of the last octet (and only the last octet) terminates the field.
/// In a VarInt, bit 0x40 of the first octet is the sign.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct VarInt {
    negative: bool,
    magnitude: u64,
}

impl VarInt {
    /// A set sign bit over a zero magnitude. Timestamps use it for "offset unknown".
    pub(crate) fn is_negative_zero(&self) -> bool {
        self.negative && self.magnitude == 0
    }

    pub(crate) fn value(&self) -> i64 {
        // The byte budget keeps the magnitude within 62 bits.
        let magnitude = self.magnitude as i64;
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }
}

/// Decodes a VarUInt one octet at a time from a byte source, failing once the field runs past
/// its byte budget.
pub(crate) fn decode_var_uint<F>(mut next_byte: F) -> Result<usize, Error>
where
    F: FnMut() -> Result<u8, Error>,
{
    let mut value: u64 = 0;
    for _ in 0..MAX_VAR_UINT_BYTES {
        let byte = next_byte()?;
        value = (value << 7) | u64::from(byte & 0b0111_1111);
        if byte & 0b1000_0000 != 0 {
            if value > MAX_VAR_UINT_VALUE {
                return Err(FormatError::VarUIntOverflow(MAX_VAR_UINT_BYTES).into());
            }
            return Ok(value as usize);
        }
    }
    Err(FormatError::VarUIntOverflow(MAX_VAR_UINT_BYTES).into())
}

/// Takes the octets of one VarUInt/VarInt field: everything up to and including the first
/// octet with the high bit set.
fn take_var_field(i: &[u8], budget: usize) -> IonResult<&[u8], &[u8]> {
    let (rest, sequence) = take_while::<_, _, IonError<&[u8]>>(high_bit_unset)(i)?;
    let (rest, _terminator) = take::<_, _, IonError<&[u8]>>(1usize)(rest)?;
    let field = &i[..sequence.len() + 1];
    if field.len() > budget {
        return Err(nom::Err::Failure(IonError::from_format_error(
            i,
            if budget == MAX_VAR_INT_BYTES {
                FormatError::VarIntOverflow(budget)
            } else {
                FormatError::VarUIntOverflow(budget)
            },
        )));
    }
    Ok((rest, field))
}

pub(crate) fn take_var_uint(i: &[u8]) -> IonResult<&[u8], usize> {
    let (rest, field) = take_var_field(i, MAX_VAR_UINT_BYTES)?;
    let value = field
        .iter()
        .fold(0u64, |acc, byte| (acc << 7) | u64::from(byte & 0b0111_1111));
    if value > MAX_VAR_UINT_VALUE {
        return Err(nom::Err::Failure(IonError::from_format_error(
            i,
            FormatError::VarUIntOverflow(MAX_VAR_UINT_BYTES),
        )));
    }
    Ok((rest, value as usize))
}

pub(crate) fn take_var_int(i: &[u8]) -> IonResult<&[u8], VarInt> {
    let (rest, field) = take_var_field(i, MAX_VAR_INT_BYTES)?;
    let negative = field[0] & 0b0100_0000 != 0;
    let magnitude = field[1..].iter().fold(
        u64::from(field[0] & 0b0011_1111),
        |acc, byte| (acc << 7) | u64::from(byte & 0b0111_1111),
    );
    Ok((
        rest,
        VarInt {
            negative,
            magnitude,
        },
    ))
}

fn high_bit_unset(byte: u8) -> bool {
    byte < 0b1000_0000
}

pub(crate) fn var_uint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    std::cmp::max(1, (bits + 6) / 7)
}

pub(crate) fn append_var_uint(bytestream: &mut Vec<u8>, value: u64) {
    let length = var_uint_len(value);
    for index in (0..length).rev() {
        let mut byte = ((value >> (7 * index)) & 0b0111_1111) as u8;
        if index == 0 {
            byte |= 0b1000_0000;
        }
        bytestream.push(byte);
    }
}

pub(crate) fn append_var_uint_usize(bytestream: &mut Vec<u8>, value: usize) {
    append_var_uint(bytestream, value as u64)
}

pub(crate) fn append_var_int(bytestream: &mut Vec<u8>, value: i64) {
    let magnitude = value.unsigned_abs();
    let bits = 64 - magnitude.leading_zeros() as usize;
    // The first octet only has room for six magnitude bits.
    let length = if bits <= 6 { 1 } else { 1 + (bits - 6 + 6) / 7 };
    for index in (0..length).rev() {
        let mut byte = ((magnitude >> (7 * index)) & 0b0111_1111) as u8;
        if index == length - 1 {
            byte &= 0b0011_1111;
            if value < 0 {
                byte |= 0b0100_0000;
            }
        }
        if index == 0 {
            byte |= 0b1000_0000;
        }
        bytestream.push(byte);
    }
}

pub(crate) fn append_var_int_negative_zero(bytestream: &mut Vec<u8>) {
    bytestream.push(0b1100_0000);
}

pub(crate) fn uint_len(value: u64) -> usize {
    (64 - value.leading_zeros() as usize + 7) / 8
}

/// Appends the minimal big-endian representation of `value`; zero takes no octets.
pub(crate) fn append_uint(bytestream: &mut Vec<u8>, value: u64) {
    let length = uint_len(value);
    bytestream.extend_from_slice(&value.to_be_bytes()[8 - length..]);
}

pub(crate) fn serialize_uint(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

pub(crate) fn serialize_int(sign: Sign, magnitude: &BigUint) -> Vec<u8> {
    if magnitude.is_zero() {
        return match sign {
            Sign::Minus => vec![0b1000_0000],
            Sign::Plus => Vec::new(),
        };
    }
    let mut bytes = magnitude.to_bytes_be();
    // The sign bit needs an octet of its own when the magnitude already uses the high bit.
    if bytes[0] & 0b1000_0000 != 0 {
        bytes.insert(0, 0);
    }
    if sign == Sign::Minus {
        bytes[0] |= 0b1000_0000;
    }
    bytes
}
