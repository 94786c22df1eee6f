use serde::{Deserialize, Serialize};
use std::fmt;

/// The Ion data types, as seen by users of readers and writers.
///
/// No promises of round-trip for optional representation details: the binary type codes for
/// positive and negative integers both surface as `Int`, and annotation wrappers and padding
/// never surface at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IonType {
    // null - A generic null value
    Null,
    // bool - Boolean values
    Bool,
    // int - Signed integers of arbitrary size
    Int,
    // float - Binary-encoded floating point numbers (IEEE 64-bit)
    Float,
    // decimal - Decimal-encoded real numbers of arbitrary precision
    Decimal,
    // timestamp - Date/time/timezone moments of arbitrary precision
    Timestamp,
    // symbol - Interned, Unicode symbolic atoms (aka identifiers)
    Symbol,
    // string - Unicode text literals
    String,
    // clob - Text data of user-defined encoding
    Clob,
    // blob - Binary data of user-defined encoding
    Blob,
    // list - Ordered collections of values
    List,
    // sexp - Ordered collections of values with application-defined semantics
    Sexp,
    // struct - Unordered collections of tagged values
    Struct,
}

impl IonType {
    pub fn is_container(self) -> bool {
        matches!(self, IonType::List | IonType::Sexp | IonType::Struct)
    }

    pub fn is_lob(self) -> bool {
        matches!(self, IonType::Clob | IonType::Blob)
    }
}

impl fmt::Display for IonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IonType::Null => "null",
            IonType::Bool => "bool",
            IonType::Int => "int",
            IonType::Float => "float",
            IonType::Decimal => "decimal",
            IonType::Timestamp => "timestamp",
            IonType::Symbol => "symbol",
            IonType::String => "string",
            IonType::Clob => "clob",
            IonType::Blob => "blob",
            IonType::List => "list",
            IonType::Sexp => "sexp",
            IonType::Struct => "struct",
        };
        f.write_str(name)
    }
}
