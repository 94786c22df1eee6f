use crate::binary::subfield::decode_var_uint;
use crate::binary::{TypeCode, BVM_1_0, BVM_START};
use crate::error::{Error, FormatError, Result, UsageError};
use crate::ion_types::IonType;
use crate::reader::pool::with_scratch;
use crate::reader::scalar::{self, Scalar};
use crate::reader::IonReader;
use crate::symbols::{SymbolTable, SymbolToken, ION_1_0_SYMBOL_ID, SYSTEM_SYMBOL_TABLE_V1};
use crate::types::{Decimal, Integer, Timestamp};
use log::trace;
use num_traits::FromPrimitive;
use std::io::{self, Read};
use std::sync::Arc;

/// Largest number of bytes skipped with a single copy.
const MAX_SKIP: usize = 64 * 1024;

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    /// Inside a struct, before the field id of the next value.
    BeforeField,
    BeforeTypeDescriptor,
    /// The header of the current value has been read but its body has not.
    BeforeValue,
    AfterValue,
    /// The current container (or the stream) has no more values.
    Eof,
}

#[derive(Clone, Copy, Debug)]
struct Header {
    type_code: TypeCode,
    length_code: u8,
    length: usize,
    is_null: bool,
}

#[derive(Clone, Debug)]
struct Current {
    ion_type: IonType,
    header: Header,
    field_id: Option<usize>,
    annotations: Vec<usize>,
    version_marker: bool,
}

#[derive(Debug)]
struct Frame {
    remaining: Option<usize>,
    container: Option<IonType>,
}

/// A cursor over binary Ion that surfaces the stream exactly as encoded.
///
/// Version markers come out as symbol values with id 2 and local symbol tables as annotated
/// structs; nothing is interpreted. Symbol ids are resolved against whatever table was last
/// installed with [`set_symbol_table`](RawBinaryReader::set_symbol_table), the system table by
/// default.
///
/// The source is read a byte at a time while scanning headers, so an unbuffered source such as a
/// `File` should be wrapped in a `BufReader`.
pub struct RawBinaryReader<R> {
    source: R,
    state: State,
    // Bytes left in the current container; `None` at the top level.
    remaining: Option<usize>,
    container: Option<IonType>,
    frames: Vec<Frame>,
    current: Option<Current>,
    // Body bytes of the current value not yet consumed.
    unread: usize,
    scalar: Option<Scalar>,
    table: Arc<SymbolTable>,
    position: usize,
}

impl<R: Read> RawBinaryReader<R> {
    pub fn new(source: R) -> Self {
        RawBinaryReader {
            source,
            state: State::BeforeTypeDescriptor,
            remaining: None,
            container: None,
            frames: vec![],
            current: None,
            unread: 0,
            scalar: None,
            table: Arc::clone(&SYSTEM_SYMBOL_TABLE_V1),
            position: 0,
        }
    }

    /// Number of bytes consumed from the source so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn field_id(&self) -> Option<usize> {
        self.current.as_ref().and_then(|current| current.field_id)
    }

    pub fn annotation_ids(&self) -> &[usize] {
        match &self.current {
            Some(current) => &current.annotations,
            None => &[],
        }
    }

    /// Whether the current value is a version marker rather than a symbol in the data.
    pub fn is_version_marker(&self) -> bool {
        self.current
            .as_ref()
            .map_or(false, |current| current.version_marker)
    }

    pub fn set_symbol_table(&mut self, table: Arc<SymbolTable>) {
        self.table = table;
    }

    pub(crate) fn shared_symbol_table(&self) -> &Arc<SymbolTable> {
        &self.table
    }

    pub fn read_symbol_id(&mut self) -> Result<usize> {
        match self.load_scalar(IonType::Symbol)? {
            Scalar::Symbol(sid) => Ok(*sid),
            _ => Err(unexpected_scalar(IonType::Symbol)),
        }
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    fn in_struct(&self) -> bool {
        self.container == Some(IonType::Struct)
    }

    fn source_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.source.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.position += 1;
                    return Ok(Some(byte[0]));
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn consume_budget(&mut self, count: usize) -> Result<()> {
        if let Some(remaining) = self.remaining.as_mut() {
            if count > *remaining {
                return Err(Error::UnexpectedEof);
            }
            *remaining -= count;
        }
        Ok(())
    }

    fn check_budget(&self, length: usize) -> Result<()> {
        match self.remaining {
            Some(remaining) if length > remaining => Err(Error::UnexpectedEof),
            _ => Ok(()),
        }
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.consume_budget(1)?;
        self.source_byte()?.ok_or(Error::UnexpectedEof)
    }

    /// Reads the first byte of a value or field. Running out of container is a clean end here,
    /// and so is running out of input at the top level.
    fn boundary_byte(&mut self) -> Result<Option<u8>> {
        match self.remaining {
            Some(0) => Ok(None),
            Some(_) => self.read_u8().map(Some),
            None => self.source_byte(),
        }
    }

    fn read_exact_body(&mut self, buffer: &mut [u8]) -> Result<()> {
        self.consume_budget(buffer.len())?;
        self.source.read_exact(buffer).map_err(eof_error)?;
        self.position += buffer.len();
        Ok(())
    }

    fn skip(&mut self, count: usize) -> Result<()> {
        self.consume_budget(count)?;
        let mut left = count;
        while left > 0 {
            let chunk = left.min(MAX_SKIP);
            let skipped =
                io::copy(&mut (&mut self.source).take(chunk as u64), &mut io::sink())? as usize;
            self.position += skipped;
            if skipped < chunk {
                return Err(Error::UnexpectedEof);
            }
            left -= chunk;
        }
        Ok(())
    }

    fn read_var_uint(&mut self) -> Result<usize> {
        decode_var_uint(|| self.read_u8())
    }

    fn read_length(&mut self, length_code: u8) -> Result<usize> {
        match length_code {
            14 => self.read_var_uint(),
            15 => Ok(0),
            length => Ok(usize::from(length)),
        }
    }

    fn next_value(&mut self) -> Result<Option<IonType>> {
        self.scalar = None;
        match self.state {
            State::Eof => return Ok(None),
            State::BeforeValue => {
                let unread = self.unread;
                self.skip(unread)?;
            }
            State::BeforeField | State::BeforeTypeDescriptor | State::AfterValue => {}
        }
        self.unread = 0;
        self.current = None;

        loop {
            let field_id = if self.in_struct() {
                self.state = State::BeforeField;
                let mut first = match self.boundary_byte()? {
                    Some(byte) => Some(byte),
                    None => {
                        self.state = State::Eof;
                        return Ok(None);
                    }
                };
                let field_id = decode_var_uint(|| match first.take() {
                    Some(byte) => Ok(byte),
                    None => self.read_u8(),
                })?;
                Some(field_id)
            } else {
                None
            };

            self.state = State::BeforeTypeDescriptor;
            let descriptor = match field_id {
                // A field id must be followed by a value.
                Some(_) => self.read_u8()?,
                None => match self.boundary_byte()? {
                    Some(descriptor) => descriptor,
                    None => {
                        self.state = State::Eof;
                        return Ok(None);
                    }
                },
            };
            trace!(
                "type descriptor {:#04x} at offset {} depth {}",
                descriptor,
                self.position - 1,
                self.frames.len()
            );

            // A NOP pad yields no value; inside a struct its field id is dropped with it.
            if let Some(current) = self.read_value_header(descriptor, field_id)? {
                let ion_type = current.ion_type;
                self.unread = current.header.length;
                self.current = Some(current);
                self.state = State::BeforeValue;
                return Ok(Some(ion_type));
            }
        }
    }

    fn read_value_header(
        &mut self,
        descriptor: u8,
        field_id: Option<usize>,
    ) -> Result<Option<Current>> {
        if descriptor == BVM_START && self.frames.is_empty() {
            let mut rest = [0u8; 3];
            self.read_exact_body(&mut rest)?;
            let marker = [descriptor, rest[0], rest[1], rest[2]];
            if marker != BVM_1_0 {
                return Err(FormatError::VersionMarker(marker).into());
            }
            return Ok(Some(Current {
                ion_type: IonType::Symbol,
                header: Header {
                    type_code: TypeCode::Symbol,
                    length_code: 0,
                    length: 0,
                    is_null: false,
                },
                field_id: None,
                annotations: vec![],
                version_marker: true,
            }));
        }

        if descriptor >> 4 == TypeCode::Annotation as u8 {
            return self.read_annotated(descriptor, field_id).map(Some);
        }

        match self.read_header(descriptor)? {
            Some(header) => Ok(Some(Current {
                ion_type: header
                    .type_code
                    .ion_type()
                    .ok_or(FormatError::ReservedTypeCode)?,
                header,
                field_id,
                annotations: vec![],
                version_marker: false,
            })),
            None => Ok(None),
        }
    }

    /// ### 14: Annotations
    ///
    /// ```text
    ///                   7       4 3       0
    ///                  +---------+---------+
    /// Annotation value |   14    |    L    |
    ///                  +---------+---------+======+
    ///                  :     length [VarUInt]     :
    ///                  +--------------------------+
    ///                  |  annot_length [VarUInt]  |
    ///                  +--------------------------+
    ///                  |      annot [VarUInt]     |  …
    ///                  +--------------------------+
    ///                  |          value           |
    ///                  +--------------------------+
    /// ```
    ///
    /// The length of the wrapper covers the annotations and the wrapped value, which must end
    /// exactly where the wrapper does. The wrapped value cannot be another wrapper or NOP
    /// padding.
    fn read_annotated(&mut self, descriptor: u8, field_id: Option<usize>) -> Result<Current> {
        let length_code = descriptor & 0x0F;
        if matches!(length_code, 0 | 1 | 2 | 15) {
            return Err(FormatError::AnnotationLength(usize::from(length_code)).into());
        }
        let wrapper_length = self.read_length(length_code)?;
        self.check_budget(wrapper_length)?;
        let start = self.position;

        let annotations_length = self.read_var_uint()?;
        if annotations_length == 0 {
            return Err(FormatError::EmptyAnnotations.into());
        }
        let annotations_start = self.position;
        let mut annotations = vec![];
        while self.position - annotations_start < annotations_length {
            annotations.push(self.read_var_uint()?);
        }
        if self.position - annotations_start != annotations_length {
            return Err(FormatError::AnnotationLengthMismatch.into());
        }

        let wrapped = self.read_u8()?;
        match TypeCode::from_u8(wrapped >> 4) {
            Some(TypeCode::Null) if wrapped & 0x0F != 0x0F => {
                return Err(FormatError::AnnotatedPadding.into())
            }
            Some(TypeCode::Annotation) => return Err(FormatError::AnnotatedAnnotation.into()),
            _ => {}
        }
        let header = self
            .read_header(wrapped)?
            .ok_or(FormatError::AnnotatedPadding)?;
        if self.position - start + header.length != wrapper_length {
            return Err(FormatError::AnnotationLengthMismatch.into());
        }
        trace!("{} annotations on a {:?}", annotations.len(), header.type_code);

        Ok(Current {
            ion_type: header
                .type_code
                .ion_type()
                .ok_or(FormatError::ReservedTypeCode)?,
            header,
            field_id,
            annotations,
            version_marker: false,
        })
    }

    /// Reads the rest of a value's header after its type descriptor, validating the descriptor.
    /// Returns `None` after skipping a NOP pad.
    fn read_header(&mut self, descriptor: u8) -> Result<Option<Header>> {
        let type_code = TypeCode::from_u8(descriptor >> 4).ok_or(FormatError::ReservedTypeCode)?;
        let length_code = descriptor & 0x0F;
        let is_null = length_code == 15;
        let length = match type_code {
            TypeCode::Null if !is_null => {
                let length = self.read_length(length_code)?;
                trace!("skipping {} byte nop pad", length);
                self.skip(length)?;
                return Ok(None);
            }
            TypeCode::Bool => match length_code {
                0 | 1 | 15 => 0,
                _ => return Err(FormatError::BoolValue(length_code).into()),
            },
            TypeCode::NegInt if length_code == 0 => return Err(FormatError::NegativeZero.into()),
            TypeCode::Float => match length_code {
                0 | 4 | 8 | 15 => self.read_length(length_code)?,
                14 => match self.read_var_uint()? {
                    length @ 0 | length @ 4 | length @ 8 => length,
                    length => return Err(FormatError::FloatLength(length).into()),
                },
                _ => return Err(FormatError::FloatLength(usize::from(length_code)).into()),
            },
            TypeCode::Timestamp if length_code < 2 => {
                return Err(FormatError::TimestampLength(usize::from(length_code)).into())
            }
            TypeCode::Timestamp => match self.read_length(length_code)? {
                length if length < 2 && !is_null => {
                    return Err(FormatError::TimestampLength(length).into())
                }
                length => length,
            },
            // An ordered struct always has a length field and at least one field.
            TypeCode::Struct if length_code == 1 => match self.read_var_uint()? {
                0 => return Err(FormatError::StructEmpty.into()),
                length => length,
            },
            TypeCode::Annotation => return Err(FormatError::AnnotatedAnnotation.into()),
            TypeCode::Reserved => return Err(FormatError::ReservedTypeCode.into()),
            _ => self.read_length(length_code)?,
        };
        self.check_budget(length)?;
        Ok(Some(Header {
            type_code,
            length_code,
            length,
            is_null,
        }))
    }

    /// Decodes the current value's body into the scalar slot, once.
    fn load_scalar(&mut self, expected: IonType) -> Result<&Scalar> {
        let (header, version_marker) = match &self.current {
            Some(current) if current.ion_type == expected && !current.header.is_null => {
                (current.header, current.version_marker)
            }
            other => {
                return Err(UsageError::TypeMismatch {
                    expected,
                    found: other.as_ref().map(|current| current.ion_type),
                }
                .into())
            }
        };
        if self.scalar.is_none() {
            let scalar = if version_marker {
                Scalar::Symbol(ION_1_0_SYMBOL_ID)
            } else {
                match header.type_code {
                    TypeCode::Bool => Scalar::Bool(header.length_code == 1),
                    TypeCode::Clob | TypeCode::Blob => {
                        let mut data = vec![0u8; self.unread];
                        self.read_exact_body(&mut data)?;
                        Scalar::Lob(data)
                    }
                    type_code => with_scratch(
                        self.unread,
                        |buffer| self.read_exact_body(buffer),
                        |body| scalar::decode(type_code, body),
                    )?,
                }
            };
            self.unread = 0;
            self.state = State::AfterValue;
            self.scalar = Some(scalar);
        }
        self.scalar
            .as_ref()
            .ok_or_else(|| UsageError::NoCurrentValue.into())
    }
}

fn unexpected_scalar(expected: IonType) -> Error {
    UsageError::TypeMismatch {
        expected,
        found: Some(expected),
    }
    .into()
}

fn eof_error(error: io::Error) -> Error {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        Error::UnexpectedEof
    } else {
        Error::Io(error)
    }
}

impl<R: Read> IonReader for RawBinaryReader<R> {
    fn next(&mut self) -> Result<Option<IonType>> {
        self.next_value()
    }

    fn ion_type(&self) -> Option<IonType> {
        self.current.as_ref().map(|current| current.ion_type)
    }

    fn is_null(&self) -> bool {
        self.current
            .as_ref()
            .map_or(false, |current| current.header.is_null)
    }

    fn depth(&self) -> usize {
        self.frames.len()
    }

    fn step_in(&mut self) -> Result<()> {
        let ion_type = match &self.current {
            Some(current) if !current.ion_type.is_container() => {
                return Err(UsageError::NotAContainer(current.ion_type).into())
            }
            Some(current) if !current.header.is_null && self.state == State::BeforeValue => {
                current.ion_type
            }
            _ => return Err(UsageError::NoContainerToStepInto.into()),
        };
        let length = self.unread;
        self.frames.push(Frame {
            // Where the parent will be once the whole container is consumed.
            remaining: self.remaining.map(|remaining| remaining - length),
            container: self.container,
        });
        self.remaining = Some(length);
        self.container = Some(ion_type);
        self.unread = 0;
        self.current = None;
        self.scalar = None;
        self.state = if ion_type == IonType::Struct {
            State::BeforeField
        } else {
            State::BeforeTypeDescriptor
        };
        trace!(
            "stepped into {} of {} bytes, depth {}",
            ion_type,
            length,
            self.frames.len()
        );
        Ok(())
    }

    fn step_out(&mut self) -> Result<()> {
        let frame = self.frames.pop().ok_or(UsageError::StepOutAtTopLevel)?;
        let left = self.remaining.unwrap_or(0);
        self.skip(left)?;
        self.remaining = frame.remaining;
        self.container = frame.container;
        self.current = None;
        self.scalar = None;
        self.unread = 0;
        self.state = State::AfterValue;
        trace!("stepped out, skipped {} bytes, depth {}", left, self.frames.len());
        Ok(())
    }

    fn field_name(&self) -> Result<Option<SymbolToken>> {
        match self.field_id() {
            Some(sid) => Ok(Some(self.table.resolve(sid)?)),
            None => Ok(None),
        }
    }

    fn annotations(&self) -> Result<Vec<SymbolToken>> {
        self.annotation_ids()
            .iter()
            .map(|sid| self.table.resolve(*sid).map_err(Error::from))
            .collect()
    }

    fn symbol_table(&self) -> &SymbolTable {
        &self.table
    }

    fn read_bool(&mut self) -> Result<bool> {
        match self.load_scalar(IonType::Bool)? {
            Scalar::Bool(value) => Ok(*value),
            _ => Err(unexpected_scalar(IonType::Bool)),
        }
    }

    fn read_integer(&mut self) -> Result<Integer> {
        match self.load_scalar(IonType::Int)? {
            Scalar::Integer(value) => Ok(value.clone()),
            _ => Err(unexpected_scalar(IonType::Int)),
        }
    }

    fn read_f64(&mut self) -> Result<f64> {
        match self.load_scalar(IonType::Float)? {
            Scalar::Float(value) => Ok(*value),
            _ => Err(unexpected_scalar(IonType::Float)),
        }
    }

    fn read_decimal(&mut self) -> Result<Decimal> {
        match self.load_scalar(IonType::Decimal)? {
            Scalar::Decimal(value) => Ok(value.clone()),
            _ => Err(unexpected_scalar(IonType::Decimal)),
        }
    }

    fn read_timestamp(&mut self) -> Result<Timestamp> {
        match self.load_scalar(IonType::Timestamp)? {
            Scalar::Timestamp(value) => Ok(value.clone()),
            _ => Err(unexpected_scalar(IonType::Timestamp)),
        }
    }

    fn read_symbol(&mut self) -> Result<SymbolToken> {
        let sid = self.read_symbol_id()?;
        Ok(self.table.resolve(sid)?)
    }

    fn read_string(&mut self) -> Result<String> {
        match self.load_scalar(IonType::String)? {
            Scalar::String(value) => Ok(value.clone()),
            _ => Err(unexpected_scalar(IonType::String)),
        }
    }

    fn read_lob(&mut self) -> Result<Vec<u8>> {
        let expected = match self.ion_type() {
            Some(IonType::Clob) => IonType::Clob,
            _ => IonType::Blob,
        };
        match self.load_scalar(expected)? {
            Scalar::Lob(value) => Ok(value.clone()),
            _ => Err(unexpected_scalar(expected)),
        }
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SymbolError;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn reader(hex: &str) -> RawBinaryReader<Cursor<Vec<u8>>> {
        RawBinaryReader::new(Cursor::new(hex::decode(hex).unwrap()))
    }

    fn format_error(result: Result<Option<IonType>>) -> FormatError {
        match result {
            Err(Error::Format(error)) => error,
            other => panic!("expected a format error, got {:?}", other),
        }
    }

    #[test]
    fn zero_length_positive_int_is_zero() {
        let mut reader = reader("20");
        assert_eq!(reader.next().unwrap(), Some(IonType::Int));
        assert_eq!(reader.read_i64().unwrap(), 0);
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn float_with_length_nine_is_malformed() {
        let mut reader = reader("4e89000000000000000000");
        assert_eq!(format_error(reader.next()), FormatError::FloatLength(9));
    }

    #[test]
    fn illegal_type_descriptors() {
        assert_eq!(format_error(reader("12").next()), FormatError::BoolValue(2));
        assert_eq!(format_error(reader("30").next()), FormatError::NegativeZero);
        assert_eq!(format_error(reader("43").next()), FormatError::FloatLength(3));
        assert_eq!(format_error(reader("61").next()), FormatError::TimestampLength(1));
        assert_eq!(format_error(reader("e1").next()), FormatError::AnnotationLength(1));
        assert_eq!(format_error(reader("ef").next()), FormatError::AnnotationLength(15));
        assert_eq!(format_error(reader("f0").next()), FormatError::ReservedTypeCode);
        assert_eq!(format_error(reader("d180").next()), FormatError::StructEmpty);
    }

    #[test]
    fn bools_live_in_the_length_nibble() {
        let mut reader = reader("10111f");
        reader.next().unwrap();
        assert_eq!(reader.read_bool().unwrap(), false);
        reader.next().unwrap();
        assert_eq!(reader.read_bool().unwrap(), true);
        assert_eq!(reader.next().unwrap(), Some(IonType::Bool));
        assert!(reader.is_null());
    }

    #[test]
    fn nop_pads_are_skipped() {
        // one byte pad, two byte pad, sixteen byte pad, then 5
        let mut reader = reader("0001fe0e8e00000000000000000000000000002105");
        assert_eq!(reader.next().unwrap(), Some(IonType::Int));
        assert_eq!(reader.read_i64().unwrap(), 5);
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn nop_pad_in_struct_drops_its_field_id() {
        // { name: <pad>, version: 0 }
        let mut reader = reader("d58401fe8520");
        assert_eq!(reader.next().unwrap(), Some(IonType::Struct));
        reader.step_in().unwrap();
        assert_eq!(reader.next().unwrap(), Some(IonType::Int));
        assert_eq!(reader.field_id(), Some(5));
        assert_eq!(
            reader.field_name().unwrap().unwrap().text(),
            Some("version")
        );
        assert_eq!(reader.next().unwrap(), None);
        reader.step_out().unwrap();
    }

    #[test]
    fn version_marker_is_a_symbol() {
        let mut reader = reader("e00100ea21ff");
        assert_eq!(reader.next().unwrap(), Some(IonType::Symbol));
        assert!(reader.is_version_marker());
        assert_eq!(reader.read_symbol_id().unwrap(), ION_1_0_SYMBOL_ID);
        assert_eq!(reader.read_symbol().unwrap().text(), Some("$ion_1_0"));
        reader.next().unwrap();
        assert!(!reader.is_version_marker());
        assert_eq!(reader.read_i64().unwrap(), 255);
    }

    #[test]
    fn bad_version_marker() {
        assert_eq!(
            format_error(reader("e00200ea").next()),
            FormatError::VersionMarker([0xE0, 0x02, 0x00, 0xEA])
        );
    }

    #[test]
    fn annotation_wrappers() {
        // name::7
        let mut reader = reader("e481842107");
        assert_eq!(reader.next().unwrap(), Some(IonType::Int));
        assert_eq!(reader.annotation_ids(), &[4]);
        assert_eq!(reader.annotations().unwrap()[0].text(), Some("name"));
        assert_eq!(reader.read_i64().unwrap(), 7);
    }

    #[test]
    fn malformed_annotation_wrappers() {
        assert_eq!(
            format_error(reader("e7818ee3818420").next()),
            FormatError::AnnotatedAnnotation
        );
        assert_eq!(
            format_error(reader("e4818401fe").next()),
            FormatError::AnnotatedPadding
        );
        assert_eq!(
            format_error(reader("e581842107").next()),
            FormatError::AnnotationLengthMismatch
        );
        assert_eq!(
            format_error(reader("e3802000").next()),
            FormatError::EmptyAnnotations
        );
    }

    #[test]
    fn version_marker_only_at_top_level() {
        let mut reader = reader("b4e00100ea");
        reader.next().unwrap();
        reader.step_in().unwrap();
        assert_eq!(format_error(reader.next()), FormatError::AnnotationLength(0));
    }

    #[test]
    fn depth_is_symmetric_and_step_out_skips() {
        // [1, [2], 3] 4
        let mut reader = reader("b72101b2210221032104");
        assert_eq!(reader.next().unwrap(), Some(IonType::List));
        assert_eq!(reader.depth(), 0);
        reader.step_in().unwrap();
        assert_eq!(reader.depth(), 1);
        reader.next().unwrap();
        assert_eq!(reader.next().unwrap(), Some(IonType::List));
        reader.step_in().unwrap();
        assert_eq!(reader.depth(), 2);
        reader.step_out().unwrap();
        assert_eq!(reader.depth(), 1);
        reader.step_out().unwrap();
        assert_eq!(reader.depth(), 0);
        assert_eq!(reader.next().unwrap(), Some(IonType::Int));
        assert_eq!(reader.read_i64().unwrap(), 4);
    }

    #[test]
    fn unread_containers_are_skipped() {
        let mut reader = reader("b4210121022103");
        assert_eq!(reader.next().unwrap(), Some(IonType::List));
        assert_eq!(reader.next().unwrap(), Some(IonType::Int));
        assert_eq!(reader.read_i64().unwrap(), 3);
    }

    #[test]
    fn step_out_at_top_level_fails() {
        assert!(matches!(
            reader("20").step_out(),
            Err(Error::Usage(UsageError::StepOutAtTopLevel))
        ));
    }

    #[test]
    fn step_in_requires_a_container() {
        let mut reader = reader("21010f");
        reader.next().unwrap();
        assert!(matches!(
            reader.step_in(),
            Err(Error::Usage(UsageError::NotAContainer(IonType::Int)))
        ));
        reader.next().unwrap();
        assert!(matches!(
            reader.step_in(),
            Err(Error::Usage(UsageError::NotAContainer(IonType::Null)))
        ));
    }

    #[test]
    fn truncated_container_is_unexpected_eof() {
        let mut reader = reader("b42101");
        reader.next().unwrap();
        reader.step_in().unwrap();
        reader.next().unwrap();
        assert_eq!(reader.read_i64().unwrap(), 1);
        assert!(matches!(reader.next(), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn end_of_input_mid_struct_is_unexpected_eof() {
        let mut reader = reader("d484");
        reader.next().unwrap();
        reader.step_in().unwrap();
        assert!(matches!(reader.next(), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn child_longer_than_its_container() {
        let mut reader = reader("b1220102");
        reader.next().unwrap();
        reader.step_in().unwrap();
        assert!(matches!(reader.next(), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn truncated_top_level_body_is_unexpected_eof() {
        let mut reader = reader("8568");
        reader.next().unwrap();
        assert!(matches!(reader.read_string(), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn ordered_struct_carries_a_length() {
        let mut reader = reader("d183842101");
        assert_eq!(reader.next().unwrap(), Some(IonType::Struct));
        reader.step_in().unwrap();
        reader.next().unwrap();
        assert_eq!(reader.read_i64().unwrap(), 1);
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn clobs_are_raw_octets() {
        let mut reader = reader(concat!(
            "926869",
            "93ff0080",
            "9f",
            "9e8e6162636465666768696a6b6c6d6e"
        ));
        reader.next().unwrap();
        assert_eq!(reader.read_lob().unwrap(), b"hi".to_vec());
        reader.next().unwrap();
        assert_eq!(reader.read_lob().unwrap(), vec![0xFF, 0x00, 0x80]);
        assert_eq!(reader.next().unwrap(), Some(IonType::Clob));
        assert!(reader.is_null());
        reader.next().unwrap();
        assert_eq!(reader.read_lob().unwrap(), b"abcdefghijklmn".to_vec());
        assert_eq!(reader.next().unwrap(), None);
    }

    #[test]
    fn typed_reads_check_the_type() {
        let mut reader = reader("9268692f");
        reader.next().unwrap();
        assert!(matches!(
            reader.read_string(),
            Err(Error::Usage(UsageError::TypeMismatch {
                expected: IonType::String,
                found: Some(IonType::Clob)
            }))
        ));
        reader.next().unwrap();
        assert!(reader.read_integer().is_err());
    }

    #[test]
    fn long_strings_decode_through_the_pool() {
        let text = "a".repeat(100);
        let hex = format!("8ee4{}", hex::encode(&text));
        let mut reader = reader(&hex);
        reader.next().unwrap();
        assert_eq!(reader.read_string().unwrap(), text);
        // cached until the cursor moves
        assert_eq!(reader.read_string().unwrap(), text);
    }

    #[test]
    fn symbol_zero_field_name_is_not_an_error() {
        let mut reader = reader("d28020");
        reader.next().unwrap();
        reader.step_in().unwrap();
        reader.next().unwrap();
        assert!(reader.field_name().unwrap().unwrap().is_zero());
    }

    #[test]
    fn unknown_ids_fail_only_when_resolved() {
        let mut reader = reader("710a");
        assert_eq!(reader.next().unwrap(), Some(IonType::Symbol));
        assert_eq!(reader.read_symbol_id().unwrap(), 10);
        assert!(matches!(
            reader.read_symbol(),
            Err(Error::Symbol(SymbolError::AboveMaxId {
                max_id: 9,
                symbol_id: 10
            }))
        ));
    }
}
