use crate::ion_types::IonType;
use nom::error::{ErrorKind, ParseError};
use num_bigint::BigInt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("malformed binary data: {0}")]
    Format(#[from] FormatError),
    #[error(transparent)]
    Symbol(#[from] SymbolError),
    #[error("invalid use of the api: {0}")]
    Usage(#[from] UsageError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("invalid binary version marker {0:02X?}")]
    VersionMarker([u8; 4]),
    #[error("type code 15 is reserved")]
    ReservedTypeCode,
    #[error("invalid bool representation {0}")]
    BoolValue(u8),
    #[error("negative integers cannot have a zero magnitude")]
    NegativeZero,
    #[error("invalid float length {0}, must be 0, 4 or 8")]
    FloatLength(usize),
    #[error("invalid timestamp length {0}")]
    TimestampLength(usize),
    #[error("invalid annotation wrapper length {0}")]
    AnnotationLength(usize),
    #[error("annotation wrappers must declare at least one annotation")]
    EmptyAnnotations,
    #[error("annotation wrapper length does not match the wrapped value")]
    AnnotationLengthMismatch,
    #[error("an annotation wrapper cannot wrap another annotation wrapper")]
    AnnotatedAnnotation,
    #[error("an annotation wrapper cannot wrap padding")]
    AnnotatedPadding,
    #[error("ordered struct must contain at least one field")]
    StructEmpty,
    #[error("VarUInt exceeds its {0} byte budget")]
    VarUIntOverflow(usize),
    #[error("VarInt exceeds its {0} byte budget")]
    VarIntOverflow(usize),
    #[error("{0:?} component out of range: {1}")]
    TimeComponentRange(TimeComponent, BigInt),
    #[error("string is not valid utf-8")]
    StringEncoding,
    #[error("symbol id field of {0} bytes is too large")]
    SymbolIdOverflow(usize),
    #[error("hour present without minute in timestamp")]
    TimestampMissingMinute,
    #[error("malformed {0:?} subfield")]
    Subfield(ErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeComponent {
    Offset,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    FractionalSecond,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymbolError {
    #[error("invalid symbol_id {symbol_id:?} is greater than max_id {max_id:?}")]
    AboveMaxId { max_id: usize, symbol_id: usize },
    #[error("the text for SID `{0}` is unknown")]
    UnknownSymbolText(usize),
    #[error("symbol token has neither text nor a symbol id")]
    EmptyToken,
    #[error("invalid symbol table: {0}")]
    InvalidSymbolTable(&'static str),
    #[error("import `{0}` must declare a max_id when no exact match is in the catalog")]
    UndefinedMaxId(String),
    #[error("shared table `{0}` cannot be imported, only shared tables can")]
    InvalidImport(String),
    #[error("cannot add `{0}` to a read-only symbol table")]
    ReadOnlyTable(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UsageError {
    #[error("cannot step out at the top level")]
    StepOutAtTopLevel,
    #[error("cannot step out with a pending field name")]
    PendingFieldName,
    #[error("cannot step out with pending annotations")]
    PendingAnnotations,
    #[error("field names can only be set inside a struct")]
    FieldNameOutsideStruct,
    #[error("values inside a struct need a field name")]
    MissingFieldName,
    #[error("{0:?} is not a container type")]
    NotAContainer(IonType),
    #[error("cannot step into a value that is not positioned or is null")]
    NoContainerToStepInto,
    #[error("the reader is not positioned on a value")]
    NoCurrentValue,
    #[error("expected a {expected:?} value but the reader is on {found:?}")]
    TypeMismatch {
        expected: IonType,
        found: Option<IonType>,
    },
    #[error("integer value does not fit in an i64")]
    IntegerOverflow,
    #[error("the raw writer needs symbol ids, `{0}` has none")]
    SymbolIdRequired(String),
    #[error("cannot flush while {0} containers are open")]
    FlushInsideContainer(usize),
    #[error("a version marker can only be written at the top level")]
    VersionMarkerInContainer,
    #[error("exponent {0} is too large for the binary encoding")]
    ExponentOutOfRange(i64),
    #[error("{0:?} component out of range: {1}")]
    TimestampRange(TimeComponent, BigInt),
}

/// Error carried through the `nom` parsers that decode value bodies.
///
/// Body parsers work on a slice that has already been read in full, so any failure they report
/// is a malformed body rather than a short read.
#[derive(Debug, PartialEq)]
pub struct IonError<I> {
    pub input: I,
    pub kind: IonErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum IonErrorKind {
    Nom(ErrorKind),
    Format(FormatError),
}

/// Analogous to nom's IResult.
pub type IonResult<I, T> = std::result::Result<(I, T), nom::Err<IonError<I>>>;

impl<I> IonError<I> {
    pub(crate) fn from_format_error(input: I, error: FormatError) -> Self {
        IonError {
            input,
            kind: IonErrorKind::Format(error),
        }
    }
}

impl<I> ParseError<I> for IonError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        IonError {
            input,
            kind: IonErrorKind::Nom(kind),
        }
    }

    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<I> From<nom::Err<IonError<I>>> for Error {
    fn from(err: nom::Err<IonError<I>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => Error::UnexpectedEof,
            nom::Err::Error(e) | nom::Err::Failure(e) => match e.kind {
                IonErrorKind::Format(format) => Error::Format(format),
                // Running off the end of a fully buffered body means a subfield claimed more
                // bytes than the value's declared length.
                IonErrorKind::Nom(ErrorKind::Eof) => Error::UnexpectedEof,
                IonErrorKind::Nom(kind) => Error::Format(FormatError::Subfield(kind)),
            },
        }
    }
}
