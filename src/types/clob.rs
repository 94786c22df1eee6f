use serde::{Deserialize, Serialize};

// clob - Text data of user-defined encoding
// The binary format stores the octets verbatim. No character encoding is assumed or checked,
// so a clob holding bytes that are not valid UTF-8 round-trips unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clob {
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

impl From<Vec<u8>> for Clob {
    fn from(data: Vec<u8>) -> Self {
        Clob { data }
    }
}

impl From<&str> for Clob {
    fn from(text: &str) -> Self {
        Clob {
            data: text.as_bytes().to_vec(),
        }
    }
}
