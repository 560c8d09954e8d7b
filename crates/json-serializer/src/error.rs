//! Error types for parsing, rendering, and type mapping.

use crate::path::{Path, Segment};
use crate::value::Value;
use thiserror::Error;

/// Malformed JSON text. `offset` is the byte position of the offending input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at byte {offset} (expected {expected})")]
pub struct ParseError {
    pub offset: usize,
    pub kind: ParseErrorKind,
    /// What the reader was looking for when it failed.
    pub expected: &'static str,
}

impl ParseError {
    pub(crate) fn new(offset: usize, kind: ParseErrorKind, expected: &'static str) -> Self {
        Self {
            offset,
            kind,
            expected,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("empty input")]
    EmptyInput,

    #[error("invalid UTF-8")]
    InvalidUtf8,

    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),

    #[error("unexpected {0}")]
    UnexpectedToken(&'static str),

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unterminated string")]
    UnterminatedString,

    #[error("unescaped control character in string")]
    ControlCharacter,

    #[error("invalid escape sequence")]
    InvalidEscape,

    /// Lone or mismatched UTF-16 surrogate in a `\u` escape.
    #[error("invalid unicode escape")]
    InvalidUnicodeEscape,

    #[error("invalid number")]
    InvalidNumber,

    #[error("number out of range")]
    NumberOutOfRange,

    #[error("trailing content after the document")]
    TrailingContent,

    #[error("nesting exceeds the limit of {0}")]
    DepthLimitExceeded(usize),
}

/// Failure to turn a value into text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// NaN and the infinities have no JSON representation.
    #[error("cannot encode non-finite number {value} at {path}")]
    NonFiniteNumber { value: f64, path: Path },

    /// Nesting too deep, including self-referential object graphs.
    #[error("nesting at {path} exceeds the limit of {limit}")]
    DepthExceeded { limit: usize, path: Path },

    /// Raised by hand-written `Mapped` implementations.
    #[error("{message} at {path}")]
    Custom { message: String, path: Path },
}

impl EncodeError {
    pub fn custom(message: impl Into<String>) -> Self {
        EncodeError::Custom {
            message: message.into(),
            path: Path::root(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            EncodeError::NonFiniteNumber { path, .. }
            | EncodeError::DepthExceeded { path, .. }
            | EncodeError::Custom { path, .. } => path,
        }
    }

    /// Attribute the error to a child of the current node.
    pub fn within(mut self, segment: Segment) -> Self {
        match &mut self {
            EncodeError::NonFiniteNumber { path, .. }
            | EncodeError::DepthExceeded { path, .. }
            | EncodeError::Custom { path, .. } => path.prepend(segment),
        }
        self
    }
}

/// A value whose shape does not fit the requested type.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("type mismatch at {path}: {kind}")]
pub struct TypeMismatchError {
    pub path: Path,
    pub kind: MismatchKind,
}

impl TypeMismatchError {
    pub fn new(kind: MismatchKind) -> Self {
        Self {
            path: Path::root(),
            kind,
        }
    }

    /// `expected` names the wanted shape; the found shape is taken from `found`.
    pub fn expected(expected: &'static str, found: &Value) -> Self {
        Self::new(MismatchKind::Expected {
            expected,
            found: found.type_name(),
        })
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(MismatchKind::InvalidValue(message.into()))
    }

    /// Attribute the error to a child of the current node.
    pub fn within(mut self, segment: Segment) -> Self {
        self.path.prepend(segment);
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MismatchKind {
    #[error("expected {expected}, found {found}")]
    Expected {
        expected: &'static str,
        found: &'static str,
    },

    #[error("missing field")]
    MissingField,

    /// Only reported in strict mode.
    #[error("unknown field")]
    UnknownField,

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("unknown variant {variant:?}")]
    UnknownVariant { variant: String },

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("nesting exceeds the limit of {limit}")]
    DepthExceeded { limit: usize },
}

/// Failure of the text-to-object path: either the text or its shape was wrong.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Type(#[from] TypeMismatchError),
}

/// Malformed ISO-8601 text for one of the temporal types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid ISO-8601 {kind}: {input:?}")]
pub struct TemporalParseError {
    pub kind: &'static str,
    pub input: String,
}

impl TemporalParseError {
    pub(crate) fn new(kind: &'static str, input: &str) -> Self {
        Self {
            kind,
            input: input.to_owned(),
        }
    }
}
