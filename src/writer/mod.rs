//! Binary Ion writers.
//!
//! [`RawBinaryWriter`] encodes values exactly as told, with every symbol given as an id.
//! [`BinaryWriter`] accepts symbol text, interns it into a local symbol table and writes that
//! table ahead of the values that use it.

mod encode;
mod managed;
mod raw;

pub use self::managed::{BinaryWriter, WriterBuilder};
pub use self::raw::RawBinaryWriter;

use crate::error::{Result, UsageError};
use crate::ion_types::IonType;
use crate::reader::IonReader;
use crate::symbols::SymbolToken;
use crate::types::{Data, Decimal, Integer, Timestamp, Value};

pub trait IonWriter {
    /// Sets the field name of the next value. Only valid inside a struct.
    fn set_field_name(&mut self, name: SymbolToken) -> Result<()>;

    /// Adds an annotation to the next value.
    fn add_annotation(&mut self, annotation: SymbolToken) -> Result<()>;

    fn write_null(&mut self, ion_type: IonType) -> Result<()>;

    fn write_bool(&mut self, value: bool) -> Result<()>;

    fn write_i64(&mut self, value: i64) -> Result<()>;

    fn write_integer(&mut self, value: &Integer) -> Result<()>;

    fn write_f64(&mut self, value: f64) -> Result<()>;

    fn write_decimal(&mut self, value: &Decimal) -> Result<()>;

    fn write_timestamp(&mut self, value: &Timestamp) -> Result<()>;

    fn write_symbol(&mut self, value: SymbolToken) -> Result<()>;

    fn write_string(&mut self, value: &str) -> Result<()>;

    fn write_clob(&mut self, value: &[u8]) -> Result<()>;

    fn write_blob(&mut self, value: &[u8]) -> Result<()>;

    /// Opens a list, sexp or struct. Values written until the matching `step_out` go inside it.
    fn step_in(&mut self, container: IonType) -> Result<()>;

    fn step_out(&mut self) -> Result<()>;

    /// Number of open containers.
    fn depth(&self) -> usize;

    /// Writes everything buffered so far to the sink. Only valid at the top level.
    fn flush(&mut self) -> Result<()>;

    /// Flushes and resets the writer so the sink can start a fresh stream.
    fn finish(&mut self) -> Result<()>;
}

/// Writes `value` and its annotations. Field names of struct members are taken from the struct.
pub fn write_value<W: IonWriter + ?Sized>(writer: &mut W, value: &Value) -> Result<()> {
    for annotation in &value.annotations {
        writer.add_annotation(annotation.clone())?;
    }
    match &value.value {
        Data::Null => writer.write_null(IonType::Null),
        data if data.is_null() => writer.write_null(data.ion_type()),
        Data::Bool(Some(value)) => writer.write_bool(*value),
        Data::Int(Some(value)) => writer.write_integer(value),
        Data::Float(Some(value)) => writer.write_f64(*value),
        Data::Decimal(Some(value)) => writer.write_decimal(value),
        Data::Timestamp(Some(value)) => writer.write_timestamp(value),
        Data::String(Some(value)) => writer.write_string(value),
        Data::Symbol(Some(value)) => writer.write_symbol(value.clone()),
        Data::Clob(Some(value)) => writer.write_clob(&value.data),
        Data::Blob(Some(value)) => writer.write_blob(&value.data),
        Data::List(Some(list)) => write_sequence(writer, IonType::List, &list.values),
        Data::Sexp(Some(sexp)) => write_sequence(writer, IonType::Sexp, &sexp.values),
        Data::Struct(Some(r#struct)) => {
            writer.step_in(IonType::Struct)?;
            for (name, field) in &r#struct.fields {
                writer.set_field_name(name.clone())?;
                write_value(writer, field)?;
            }
            writer.step_out()
        }
        // Every payload-less variant is caught by the null arm above.
        _ => writer.write_null(value.ion_type()),
    }
}

fn write_sequence<W: IonWriter + ?Sized>(
    writer: &mut W,
    container: IonType,
    values: &[Value],
) -> Result<()> {
    writer.step_in(container)?;
    for value in values {
        write_value(writer, value)?;
    }
    writer.step_out()
}

/// Copies the reader's current value, with its field name and annotations, into the writer.
pub fn copy_value<R, W>(reader: &mut R, writer: &mut W) -> Result<()>
where
    R: IonReader + ?Sized,
    W: IonWriter + ?Sized,
{
    let ion_type = reader.ion_type().ok_or(UsageError::NoCurrentValue)?;
    if let Some(name) = reader.field_name()? {
        writer.set_field_name(name)?;
    }
    for annotation in reader.annotations()? {
        writer.add_annotation(annotation)?;
    }
    if reader.is_null() {
        return writer.write_null(ion_type);
    }
    match ion_type {
        IonType::Null => writer.write_null(IonType::Null),
        IonType::Bool => writer.write_bool(reader.read_bool()?),
        IonType::Int => writer.write_integer(&reader.read_integer()?),
        IonType::Float => writer.write_f64(reader.read_f64()?),
        IonType::Decimal => writer.write_decimal(&reader.read_decimal()?),
        IonType::Timestamp => writer.write_timestamp(&reader.read_timestamp()?),
        IonType::Symbol => writer.write_symbol(reader.read_symbol()?),
        IonType::String => writer.write_string(&reader.read_string()?),
        IonType::Clob => writer.write_clob(&reader.read_lob()?),
        IonType::Blob => writer.write_blob(&reader.read_lob()?),
        IonType::List | IonType::Sexp | IonType::Struct => {
            reader.step_in()?;
            writer.step_in(ion_type)?;
            while reader.next()?.is_some() {
                copy_value(reader, writer)?;
            }
            reader.step_out()?;
            writer.step_out()
        }
    }
}
