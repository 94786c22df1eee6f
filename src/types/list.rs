use crate::types::Value;
use serde::{Deserialize, Serialize};

// list - Ordered collections of values
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub values: Vec<Value>,
}

impl IntoIterator for List {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

// sexp - Ordered collections of values with application-defined semantics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sexp {
    pub values: Vec<Value>,
}

impl IntoIterator for Sexp {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
