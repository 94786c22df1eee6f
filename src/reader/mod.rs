//! Forward-only cursors over Ion data.
//!
//! [`RawBinaryReader`] walks the binary encoding and surfaces everything in it, including version
//! markers and local symbol tables. [`BinaryReader`] wraps it and consumes those directives so
//! only user values come out. Both, along with [`SymbolTableReader`], implement [`IonReader`].
//!
//! [`SymbolTableReader`]: crate::symbols::stream::SymbolTableReader

mod pool;
mod raw;
mod scalar;
mod system;

pub use self::raw::RawBinaryReader;
pub use self::system::BinaryReader;

use crate::error::{Result, UsageError};
use crate::ion_types::IonType;
use crate::symbols::{SymbolTable, SymbolToken};
use crate::types::{Blob, Clob, Data, Decimal, Integer, List, Sexp, Struct, Timestamp, Value};

pub trait IonReader {
    /// Moves to the next value at the current depth and returns its type. `None` marks the end
    /// of the current container, or of the stream at the top level.
    fn next(&mut self) -> Result<Option<IonType>>;

    /// The type of the current value, `None` when the cursor is not on a value.
    fn ion_type(&self) -> Option<IonType>;

    fn is_null(&self) -> bool;

    /// Number of containers the cursor is inside of.
    fn depth(&self) -> usize;

    fn step_in(&mut self) -> Result<()>;

    /// Leaves the current container, skipping whatever of it was not read.
    fn step_out(&mut self) -> Result<()>;

    /// The field name of the current value when inside a struct.
    fn field_name(&self) -> Result<Option<SymbolToken>>;

    fn annotations(&self) -> Result<Vec<SymbolToken>>;

    /// The table symbol ids are currently resolved against.
    fn symbol_table(&self) -> &SymbolTable;

    fn read_bool(&mut self) -> Result<bool>;

    fn read_integer(&mut self) -> Result<Integer>;

    fn read_i64(&mut self) -> Result<i64> {
        self.read_integer()?
            .as_i64()
            .ok_or_else(|| UsageError::IntegerOverflow.into())
    }

    fn read_f64(&mut self) -> Result<f64>;

    fn read_decimal(&mut self) -> Result<Decimal>;

    fn read_timestamp(&mut self) -> Result<Timestamp>;

    fn read_symbol(&mut self) -> Result<SymbolToken>;

    fn read_string(&mut self) -> Result<String>;

    /// The octets of a blob or clob.
    fn read_lob(&mut self) -> Result<Vec<u8>>;
}

/// Materializes the value the reader is positioned on, stepping through containers.
pub fn read_value<R: IonReader + ?Sized>(reader: &mut R) -> Result<Value> {
    let ion_type = reader.ion_type().ok_or(UsageError::NoCurrentValue)?;
    let annotations = reader.annotations()?;
    if reader.is_null() {
        return Ok(Value {
            value: Data::null_of(ion_type),
            annotations,
        });
    }
    let value = match ion_type {
        IonType::Null => Data::Null,
        IonType::Bool => Data::Bool(Some(reader.read_bool()?)),
        IonType::Int => Data::Int(Some(reader.read_integer()?)),
        IonType::Float => Data::Float(Some(reader.read_f64()?)),
        IonType::Decimal => Data::Decimal(Some(reader.read_decimal()?)),
        IonType::Timestamp => Data::Timestamp(Some(reader.read_timestamp()?)),
        IonType::Symbol => Data::Symbol(Some(reader.read_symbol()?)),
        IonType::String => Data::String(Some(reader.read_string()?)),
        IonType::Clob => Data::Clob(Some(Clob {
            data: reader.read_lob()?,
        })),
        IonType::Blob => Data::Blob(Some(Blob {
            data: reader.read_lob()?,
        })),
        IonType::List => Data::List(Some(List {
            values: read_children(reader)?,
        })),
        IonType::Sexp => Data::Sexp(Some(Sexp {
            values: read_children(reader)?,
        })),
        IonType::Struct => {
            reader.step_in()?;
            let mut fields = vec![];
            while reader.next()?.is_some() {
                let name = reader.field_name()?.ok_or(UsageError::MissingFieldName)?;
                fields.push((name, read_value(reader)?));
            }
            reader.step_out()?;
            Data::Struct(Some(Struct { fields }))
        }
    };
    Ok(Value { value, annotations })
}

fn read_children<R: IonReader + ?Sized>(reader: &mut R) -> Result<Vec<Value>> {
    reader.step_in()?;
    let mut values = vec![];
    while reader.next()?.is_some() {
        values.push(read_value(reader)?);
    }
    reader.step_out()?;
    Ok(values)
}

/// Reads every remaining value at the reader's current depth.
pub fn read_all<R: IonReader + ?Sized>(reader: &mut R) -> Result<Vec<Value>> {
    let mut values = vec![];
    while reader.next()?.is_some() {
        values.push(read_value(reader)?);
    }
    Ok(values)
}
