use crate::symbols::SymbolToken;
use crate::types::Value;
use serde::{Deserialize, Serialize};

// struct - Unordered collections of tagged values
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    // When two fields in the same struct have the same name we say they are "repeated fields".
    // Repeated fields are preserved, so 'fields' is a Vec instead of some sort of map.
    pub fields: Vec<(SymbolToken, Value)>,
}

impl Struct {
    /// The first field whose name has the given text.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(token, _)| token.text() == Some(name))
            .map(|(_, value)| value)
    }
}
