use crate::binary::subfield::append_var_uint_usize;
use crate::binary::{TypeCode, BVM_1_0};
use crate::error::{Error, Result, UsageError};
use crate::ion_types::IonType;
use crate::symbols::SymbolToken;
use crate::types::{Decimal, Integer, Timestamp};
use crate::writer::encode::{
    append_header, encode_decimal, encode_f64, encode_i64, encode_integer, encode_symbol_id,
    encode_timestamp,
};
use crate::writer::IonWriter;
use log::trace;
use std::io::Write;
use std::mem;

#[derive(Clone, Copy, Debug, PartialEq)]
enum FrameKind {
    TopLevel,
    Container(IonType),
    /// An annotation wrapper, closed as soon as the value it wraps is complete.
    Annotations,
}

/// The bytes written at one level of nesting.
///
/// A frame's header can only be written once its length is known, so closed children are kept as
/// separate segments: the child's header goes in a segment of its own, followed by the child's
/// segments, and nothing already written is copied or rescanned.
#[derive(Debug)]
struct ContainerFrame {
    kind: FrameKind,
    segments: Vec<Vec<u8>>,
    // Total length of `segments`.
    spliced: usize,
    current: Vec<u8>,
}

impl ContainerFrame {
    fn new(kind: FrameKind) -> Self {
        ContainerFrame {
            kind,
            segments: vec![],
            spliced: 0,
            current: vec![],
        }
    }

    fn length(&self) -> usize {
        self.spliced + self.current.len()
    }

    fn is_empty(&self) -> bool {
        self.length() == 0
    }

    fn type_code(&self) -> TypeCode {
        match self.kind {
            FrameKind::Container(ion_type) => TypeCode::for_ion_type(ion_type),
            FrameKind::Annotations => TypeCode::Annotation,
            FrameKind::TopLevel => TypeCode::Null,
        }
    }

    fn seal_current(&mut self) {
        if !self.current.is_empty() {
            let segment = mem::take(&mut self.current);
            self.spliced += segment.len();
            self.segments.push(segment);
        }
    }

    fn splice(&mut self, header: Vec<u8>, mut child: ContainerFrame) {
        self.seal_current();
        child.seal_current();
        self.spliced += header.len() + child.spliced;
        self.segments.push(header);
        self.segments.extend(child.segments);
    }

    fn take_segments(&mut self) -> Vec<Vec<u8>> {
        self.seal_current();
        self.spliced = 0;
        mem::take(&mut self.segments)
    }
}

/// Writes binary Ion with every symbol given as a symbol id.
///
/// Nothing reaches the sink until [`flush`](IonWriter::flush). No version marker or symbol table
/// is written unless asked for, so the output is only readable by a reader that already knows the
/// symbol table the ids refer to.
pub struct RawBinaryWriter<W> {
    sink: W,
    root: ContainerFrame,
    frames: Vec<ContainerFrame>,
    field_id: Option<usize>,
    annotations: Vec<usize>,
}

impl<W: Write> RawBinaryWriter<W> {
    pub fn new(sink: W) -> Self {
        RawBinaryWriter {
            sink,
            root: ContainerFrame::new(FrameKind::TopLevel),
            frames: vec![],
            field_id: None,
            annotations: vec![],
        }
    }

    pub fn write_version_marker(&mut self) -> Result<()> {
        if !self.frames.is_empty() {
            return Err(UsageError::VersionMarkerInContainer.into());
        }
        self.root.current.extend_from_slice(&BVM_1_0);
        Ok(())
    }

    /// Whether nothing has been written since the last flush.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.root.is_empty()
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub(crate) fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Hands over everything written at the top level so far.
    pub(crate) fn take_buffered(&mut self) -> Result<Vec<Vec<u8>>> {
        if !self.frames.is_empty() {
            return Err(UsageError::FlushInsideContainer(self.depth()).into());
        }
        if !self.annotations.is_empty() {
            return Err(UsageError::PendingAnnotations.into());
        }
        Ok(self.root.take_segments())
    }

    fn top_mut(&mut self) -> &mut ContainerFrame {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    fn in_struct(&self) -> bool {
        matches!(
            self.frames.last(),
            Some(ContainerFrame {
                kind: FrameKind::Container(IonType::Struct),
                ..
            })
        )
    }

    /// Writes the pending field id and opens the pending annotation wrapper.
    fn begin_value(&mut self) -> Result<()> {
        if self.in_struct() {
            let field_id = self.field_id.take().ok_or(UsageError::MissingFieldName)?;
            append_var_uint_usize(&mut self.top_mut().current, field_id);
        }
        if !self.annotations.is_empty() {
            let mut ids = vec![];
            for sid in self.annotations.drain(..) {
                append_var_uint_usize(&mut ids, sid);
            }
            let mut wrapper = ContainerFrame::new(FrameKind::Annotations);
            append_var_uint_usize(&mut wrapper.current, ids.len());
            wrapper.current.extend(ids);
            self.frames.push(wrapper);
        }
        Ok(())
    }

    fn end_value(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(frame) if frame.kind == FrameKind::Annotations => self.close_frame(),
            _ => Ok(()),
        }
    }

    fn close_frame(&mut self) -> Result<()> {
        let frame = self.frames.pop().ok_or(UsageError::StepOutAtTopLevel)?;
        let type_code = frame.type_code();
        let length = frame.length();
        let mut header = Vec::with_capacity(6);
        append_header(&mut header, type_code, length);
        trace!(
            "closing {:?} frame of {} bytes with a {} byte header",
            type_code,
            length,
            header.len()
        );
        self.top_mut().splice(header, frame);
        Ok(())
    }

    fn write_descriptor(&mut self, descriptor: u8) -> Result<()> {
        self.begin_value()?;
        self.top_mut().current.push(descriptor);
        self.end_value()
    }

    fn write_encoded(&mut self, type_code: TypeCode, body: &[u8]) -> Result<()> {
        self.begin_value()?;
        let buffer = &mut self.top_mut().current;
        append_header(buffer, type_code, body.len());
        buffer.extend_from_slice(body);
        self.end_value()
    }
}

fn require_sid(token: &SymbolToken) -> Result<usize> {
    token.local_sid().ok_or_else(|| {
        Error::from(UsageError::SymbolIdRequired(
            token.text().unwrap_or_default().to_owned(),
        ))
    })
}

impl<W: Write> IonWriter for RawBinaryWriter<W> {
    fn set_field_name(&mut self, name: SymbolToken) -> Result<()> {
        if !self.in_struct() {
            return Err(UsageError::FieldNameOutsideStruct.into());
        }
        self.field_id = Some(require_sid(&name)?);
        Ok(())
    }

    fn add_annotation(&mut self, annotation: SymbolToken) -> Result<()> {
        self.annotations.push(require_sid(&annotation)?);
        Ok(())
    }

    fn write_null(&mut self, ion_type: IonType) -> Result<()> {
        self.write_descriptor(TypeCode::for_ion_type(ion_type).to_byte() | 0x0F)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_descriptor(TypeCode::Bool.to_byte() | value as u8)
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        let mut body = Vec::with_capacity(8);
        let type_code = encode_i64(value, &mut body);
        self.write_encoded(type_code, &body)
    }

    fn write_integer(&mut self, value: &Integer) -> Result<()> {
        let mut body = vec![];
        let type_code = encode_integer(value, &mut body);
        self.write_encoded(type_code, &body)
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        let mut body = Vec::with_capacity(8);
        encode_f64(value, &mut body);
        self.write_encoded(TypeCode::Float, &body)
    }

    fn write_decimal(&mut self, value: &Decimal) -> Result<()> {
        let mut body = vec![];
        encode_decimal(value, &mut body)?;
        self.write_encoded(TypeCode::Decimal, &body)
    }

    fn write_timestamp(&mut self, value: &Timestamp) -> Result<()> {
        let mut body = vec![];
        encode_timestamp(value, &mut body)?;
        self.write_encoded(TypeCode::Timestamp, &body)
    }

    fn write_symbol(&mut self, value: SymbolToken) -> Result<()> {
        let mut body = vec![];
        encode_symbol_id(require_sid(&value)?, &mut body);
        self.write_encoded(TypeCode::Symbol, &body)
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_encoded(TypeCode::String, value.as_bytes())
    }

    fn write_clob(&mut self, value: &[u8]) -> Result<()> {
        self.write_encoded(TypeCode::Clob, value)
    }

    fn write_blob(&mut self, value: &[u8]) -> Result<()> {
        self.write_encoded(TypeCode::Blob, value)
    }

    fn step_in(&mut self, container: IonType) -> Result<()> {
        if !container.is_container() {
            return Err(UsageError::NotAContainer(container).into());
        }
        self.begin_value()?;
        self.top_mut().seal_current();
        self.frames.push(ContainerFrame::new(FrameKind::Container(container)));
        Ok(())
    }

    fn step_out(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(frame) if frame.kind != FrameKind::Annotations => {}
            _ => return Err(UsageError::StepOutAtTopLevel.into()),
        }
        if self.field_id.is_some() {
            return Err(UsageError::PendingFieldName.into());
        }
        if !self.annotations.is_empty() {
            return Err(UsageError::PendingAnnotations.into());
        }
        self.close_frame()?;
        self.end_value()
    }

    fn depth(&self) -> usize {
        self.frames
            .iter()
            .filter(|frame| frame.kind != FrameKind::Annotations)
            .count()
    }

    fn flush(&mut self) -> Result<()> {
        for segment in self.take_buffered()? {
            self.sink.write_all(&segment)?;
        }
        self.sink.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()
    }
}
