use crate::ion_types::IonType;
use crate::symbols::SymbolToken;
use crate::types::{Blob, Clob, Decimal, Integer, List, Sexp, Struct, Timestamp};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub value: Data,
    // A null symbol cannot appear as an annotation, so this is a Vec<SymbolToken> rather than a
    // Vec<Option<SymbolToken>>.
    pub annotations: Vec<SymbolToken>,
}

impl Value {
    pub fn ion_type(&self) -> IonType {
        self.value.ion_type()
    }

    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations
            .iter()
            .any(|token| token.text() == Some(annotation))
    }

    pub fn with_annotations<I, T>(mut self, annotations: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SymbolToken>,
    {
        self.annotations
            .extend(annotations.into_iter().map(Into::into));
        self
    }
}

impl From<Data> for Value {
    fn from(value: Data) -> Self {
        Self {
            value,
            annotations: vec![],
        }
    }
}

/// Represents an element of the Ion data model.
///
/// Rather than represent each Ion data model types as an enum with a Null variant,
/// nullable types (all types other than Null itself) are represented using an Option
/// in the Data enum, with the null value of each type represented using Option::None.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Data {
    Null,
    Bool(Option<bool>),
    Int(Option<Integer>),
    Float(Option<f64>),
    Decimal(Option<Decimal>),
    Timestamp(Option<Timestamp>),
    String(Option<String>),
    Symbol(Option<SymbolToken>),
    Blob(Option<Blob>),
    Clob(Option<Clob>),
    Struct(Option<Struct>),
    List(Option<List>),
    Sexp(Option<Sexp>),
}

impl Data {
    /// The typed null of `ion_type`.
    pub fn null_of(ion_type: IonType) -> Data {
        match ion_type {
            IonType::Null => Data::Null,
            IonType::Bool => Data::Bool(None),
            IonType::Int => Data::Int(None),
            IonType::Float => Data::Float(None),
            IonType::Decimal => Data::Decimal(None),
            IonType::Timestamp => Data::Timestamp(None),
            IonType::Symbol => Data::Symbol(None),
            IonType::String => Data::String(None),
            IonType::Clob => Data::Clob(None),
            IonType::Blob => Data::Blob(None),
            IonType::List => Data::List(None),
            IonType::Sexp => Data::Sexp(None),
            IonType::Struct => Data::Struct(None),
        }
    }

    pub fn ion_type(&self) -> IonType {
        match self {
            Data::Null => IonType::Null,
            Data::Bool(_) => IonType::Bool,
            Data::Int(_) => IonType::Int,
            Data::Float(_) => IonType::Float,
            Data::Decimal(_) => IonType::Decimal,
            Data::Timestamp(_) => IonType::Timestamp,
            Data::String(_) => IonType::String,
            Data::Symbol(_) => IonType::Symbol,
            Data::Blob(_) => IonType::Blob,
            Data::Clob(_) => IonType::Clob,
            Data::Struct(_) => IonType::Struct,
            Data::List(_) => IonType::List,
            Data::Sexp(_) => IonType::Sexp,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Data::Null
                | Data::Bool(None)
                | Data::Int(None)
                | Data::Float(None)
                | Data::Decimal(None)
                | Data::Timestamp(None)
                | Data::String(None)
                | Data::Symbol(None)
                | Data::Blob(None)
                | Data::Clob(None)
                | Data::Struct(None)
                | Data::List(None)
                | Data::Sexp(None)
        )
    }
}

macro_rules! ion_type_promotions {
    ($ion_type:ty, $data_variant:expr) => {
        impl From<$ion_type> for Data {
            fn from(ion_value: $ion_type) -> Self {
                $data_variant(Some(ion_value))
            }
        }

        impl From<$ion_type> for Value {
            fn from(ion_value: $ion_type) -> Self {
                $data_variant(Some(ion_value)).into()
            }
        }
    };
}

ion_type_promotions!(bool, Data::Bool);
ion_type_promotions!(Integer, Data::Int);
ion_type_promotions!(f64, Data::Float);
ion_type_promotions!(Decimal, Data::Decimal);
ion_type_promotions!(Timestamp, Data::Timestamp);
ion_type_promotions!(String, Data::String);
ion_type_promotions!(SymbolToken, Data::Symbol);
ion_type_promotions!(Blob, Data::Blob);
ion_type_promotions!(Clob, Data::Clob);
ion_type_promotions!(Struct, Data::Struct);
ion_type_promotions!(List, Data::List);
ion_type_promotions!(Sexp, Data::Sexp);

impl From<i64> for Data {
    fn from(value: i64) -> Self {
        Data::Int(Some(Integer::I64(value)))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Data::from(value).into()
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Data::Int(Some(Integer::BigInt(value))).into()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Data::String(Some(value.to_owned())).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn typed_nulls_keep_their_type() {
        for ion_type in &[IonType::Null, IonType::Decimal, IonType::Struct, IonType::Clob] {
            let null = Data::null_of(*ion_type);
            assert!(null.is_null());
            assert_eq!(null.ion_type(), *ion_type);
        }
        assert!(!Data::from(0i64).is_null());
    }

    #[test]
    fn annotations_match_on_text() {
        let value = Value::from(true).with_annotations(vec!["a", "b"]);
        assert!(value.has_annotation("b"));
        assert!(!value.has_annotation("c"));
    }
}
