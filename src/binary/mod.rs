//! Special values and types related to the binary Ion format.

pub(crate) mod subfield;

use crate::ion_types::IonType;
use serde::{Deserialize, Serialize};

/// ## Binary Version Markers
///
/// In the binary format, an Ion value stream starts with a four-octet binary version marker (BVM)
/// that specifies the Ion version used to encode the data that follows, followed by zero or more
/// values which contain the actual data. These values are generally referred to as
/// “top-level values”.
///
/// ```text
///                        7    0 7     0 7     0 7    0
///                       +------+-------+-------+------+
/// binary version marker | 0xE0 | major | minor | 0xEA |
///                       +------+-------+-------+------+
/// ```
///
/// A value stream can contain other BVMs interspersed with the top-level values.
/// Each BVM resets the reader to the system symbol table.
pub const BVM_1_0: [u8; 4] = [
    BVM_START,
    BVM_1_0_MAJOR_VERSION,
    BVM_1_0_MINOR_VERSION,
    BVM_END,
];
pub(crate) const BVM_START: u8 = 0xE0;
const BVM_END: u8 = 0xEA;
const BVM_1_0_MAJOR_VERSION: u8 = 0x01;
const BVM_1_0_MINOR_VERSION: u8 = 0x00;

/// ## Typed Value Formats
///
/// A value consists of a one-octet type descriptor, possibly followed by a length in octets,
/// possibly followed by a representation.
///
/// ```text
///        7       4 3       0
///       +---------+---------+
/// value |    T    |    L    |
///       +---------+---------+======+
///       :     length [VarUInt]     :
///       +==========================+
///       :      representation      :
///       +==========================+
/// ```
///
/// If the value is null (for that type), then L is set to 15.
/// If the representation is less than 14 bytes long, then L is set to the length,
/// and the length field is omitted.
/// If the representation is at least 14 bytes long, then L is set to 14,
/// and the length field is set to the representation length, encoded as a VarUInt field.
///
/// ## Illegal Type Descriptors
///
/// ```text
/// T    L                 Reason
/// 1    [3-14]             For bool values, L is used to encode the value,
///                             and may be 0 (false), 1 (true), or 15 (null.bool).
/// 3    [0]                The int 0 is always stored with type code 2.
/// 4    [1-3],[5-7],[9-14] Only 32-bit and 64-bit IEEE-754 values are supported.
/// 6    [0-1]              A timestamp has at least an offset and a year.
/// 14   [0]*,[1-2],[15]    Annotation wrappers must have one annot_length field, at least one
///                             annot field, and exactly one value field.
///                             *0xE0 starts the BVM.
/// 15   [0-15]             The type code 15 is illegal in Ion 1.0 data.
/// ```
///
/// # Panics
///
/// While TypeCode itself obviously does not have any mechanism to originate a panic, other code
/// depends via the FromPrimitive derivation on the fact that there are 16 variants of this enum.
#[derive(Clone, Debug, PartialEq, FromPrimitive, Copy)]
pub(crate) enum TypeCode {
    Null = 0,
    Bool = 1,
    PosInt = 2,
    NegInt = 3,
    Float = 4,
    Decimal = 5,
    Timestamp = 6,
    Symbol = 7,
    String = 8,
    Clob = 9,
    Blob = 10,
    List = 11,
    Sexp = 12,
    Struct = 13,
    Annotation = 14,
    Reserved = 15,
}

impl TypeCode {
    pub(crate) const fn to_byte(self) -> u8 {
        (self as u8) << 4
    }

    /// The user-visible type for this type code. Annotation wrappers, NOP pads and the
    /// reserved code have none.
    pub(crate) fn ion_type(self) -> Option<IonType> {
        let ion_type = match self {
            TypeCode::Null => IonType::Null,
            TypeCode::Bool => IonType::Bool,
            TypeCode::PosInt | TypeCode::NegInt => IonType::Int,
            TypeCode::Float => IonType::Float,
            TypeCode::Decimal => IonType::Decimal,
            TypeCode::Timestamp => IonType::Timestamp,
            TypeCode::Symbol => IonType::Symbol,
            TypeCode::String => IonType::String,
            TypeCode::Clob => IonType::Clob,
            TypeCode::Blob => IonType::Blob,
            TypeCode::List => IonType::List,
            TypeCode::Sexp => IonType::Sexp,
            TypeCode::Struct => IonType::Struct,
            TypeCode::Annotation | TypeCode::Reserved => return None,
        };
        Some(ion_type)
    }

    /// The type code a writer uses for non-integer values of the given type.
    pub(crate) fn for_ion_type(ion_type: IonType) -> TypeCode {
        match ion_type {
            IonType::Null => TypeCode::Null,
            IonType::Bool => TypeCode::Bool,
            IonType::Int => TypeCode::PosInt,
            IonType::Float => TypeCode::Float,
            IonType::Decimal => TypeCode::Decimal,
            IonType::Timestamp => TypeCode::Timestamp,
            IonType::Symbol => TypeCode::Symbol,
            IonType::String => TypeCode::String,
            IonType::Clob => TypeCode::Clob,
            IonType::Blob => TypeCode::Blob,
            IonType::List => TypeCode::List,
            IonType::Sexp => TypeCode::Sexp,
            IonType::Struct => TypeCode::Struct,
        }
    }
}

/// The possible values of the length field of a Typed Value
///
/// # Panics
///
/// While LengthCode itself obviously does not have any mechanism to originate a panic, other code
/// depends via the FromPrimitive derivation on the fact that there are 16 variants of this enum.
#[derive(Clone, Debug, PartialEq, FromPrimitive, Copy)]
pub(crate) enum LengthCode {
    L0 = 0,
    L1 = 1,
    L2 = 2,
    L3 = 3,
    L4 = 4,
    L5 = 5,
    L6 = 6,
    L7 = 7,
    L8 = 8,
    L9 = 9,
    L10 = 10,
    L11 = 11,
    L12 = 12,
    L13 = 13,
    L14 = 14,
    L15 = 15,
}

/// The largest representation length that fits directly in L.
pub(crate) const MAX_INLINE_LENGTH: usize = 13;

pub(crate) const fn type_descriptor(t: TypeCode, l: LengthCode) -> u8 {
    t.to_byte() + l as u8
}

/// Sign of a sign-and-magnitude field.
///
/// Ion keeps the sign of a zero magnitude (negative zero decimals, unknown timestamp offsets),
/// so this has no `NoSign` variant.
#[derive(PartialEq, PartialOrd, Eq, Ord, Copy, Clone, Debug, Hash, Serialize, Deserialize)]
pub enum Sign {
    Minus,
    Plus,
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use num_traits::cast::FromPrimitive;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn type_code_has_16_variants() {
        let fifteen: u8 = 0b0000_1111;
        let type_code: TypeCode = TypeCode::from_u8(fifteen).unwrap();
        assert_eq!(type_code, TypeCode::Reserved);
    }

    #[test]
    fn type_code_has_no_17th_variant() {
        let sixteen: u8 = 0b0001_0000;
        let type_code: Option<TypeCode> = TypeCode::from_u8(sixteen);
        assert_eq!(type_code, None);
    }

    #[test]
    fn length_code_has_16_variants() {
        let fifteen: u8 = 0b0000_1111;
        let length_code: LengthCode = LengthCode::from_u8(fifteen).unwrap();
        assert_eq!(length_code, LengthCode::L15);
    }

    #[test]
    fn type_descriptor_packs_both_nibbles() {
        assert_eq!(type_descriptor(TypeCode::Struct, LengthCode::L14), 0xDE);
        assert_eq!(type_descriptor(TypeCode::Null, LengthCode::L15), 0x0F);
    }

    #[test]
    fn both_int_codes_map_to_int() {
        assert_eq!(TypeCode::PosInt.ion_type(), Some(IonType::Int));
        assert_eq!(TypeCode::NegInt.ion_type(), Some(IonType::Int));
        assert_eq!(TypeCode::Annotation.ion_type(), None);
        assert_eq!(TypeCode::for_ion_type(IonType::Clob), TypeCode::Clob);
    }
}
