//! A reader and writer for the Ion 1.0 binary format.
//!
//! [`BinaryReader`] walks a stream of binary Ion, applying the local symbol tables embedded in it,
//! and [`BinaryWriter`] produces one, interning symbol text into a local symbol table as it goes.
//! [`from_bytes`] and [`to_bytes`] cover the whole-document case.
//!
//! ```
//! use ion_binary::{from_bytes, to_bytes, Value};
//!
//! let values = vec![Value::from(42), Value::from("hello")];
//! let bytes = to_bytes(&values).unwrap();
//! assert_eq!(&bytes[..4], &[0xE0, 0x01, 0x00, 0xEA]);
//! assert_eq!(from_bytes(&bytes).unwrap(), values);
//! ```

#[macro_use]
extern crate num_derive;
#[macro_use]
extern crate lazy_static;

pub mod binary;
pub mod error;
pub mod ion_types;
pub mod reader;
pub mod symbols;
pub mod types;
pub mod writer;


pub use crate::error::{Error, Result};
pub use crate::ion_types::IonType;
pub use crate::reader::{read_all, read_value, BinaryReader, IonReader, RawBinaryReader};
pub use crate::symbols::catalog::{Catalog, SimpleCatalog};
pub use crate::symbols::stream::SymbolTableReader;
pub use crate::symbols::{SymbolTable, SymbolToken};
pub use crate::types::{Data, Value};
pub use crate::writer::{
    copy_value, write_value, BinaryWriter, IonWriter, RawBinaryWriter, WriterBuilder,
};

use std::io::Cursor;

/// Decodes every top-level user value in `bytes`.
pub fn from_bytes(bytes: &[u8]) -> Result<Vec<Value>> {
    let mut reader = BinaryReader::new(Cursor::new(bytes));
    read_all(&mut reader)
}

/// Encodes `values` as a complete binary stream, symbol table included.
pub fn to_bytes(values: &[Value]) -> Result<Vec<u8>> {
    let mut writer = BinaryWriter::new(Vec::new());
    for value in values {
        write_value(&mut writer, value)?;
    }
    writer.finish()?;
    Ok(writer.into_inner())
}
