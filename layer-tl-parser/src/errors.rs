use std::num::ParseIntError;

use thiserror::Error;

/// Errors produced while parsing a single parameter token.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParamParseError {
    /// An empty string was encountered where a name/type was expected.
    #[error("empty token")]
    Empty,
    /// A generic or flag reference that was never declared before its use.
    #[error("unknown generic or flag definition")]
    MissingDef,
    /// A `{…}` block that isn't a valid `{X:Bound}` generic list.
    #[error("malformed generic definition")]
    InvalidTypeDef,
    /// A flag expression (`name.N?Type`) was malformed.
    #[error("invalid flag expression")]
    InvalidFlag,
    /// The bit index of a flag expression does not fit in a 32-bit word.
    #[error("flag bit {0} out of range (must be below 32)")]
    FlagBitOutOfRange(u32),
    /// A generic `<…>` argument was malformed (missing closing `>`).
    #[error("invalid generic argument (unclosed `<`)")]
    InvalidGeneric,
    /// A bare `name` with no `:type`, as in old-style `? = Int`.
    #[error("parameter without `:type` is not supported")]
    NotImplemented,
}

/// What went wrong with a single TL declaration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// The input was blank.
    #[error("empty definition")]
    Empty,
    /// The line does not end with `;`.
    #[error("missing `;` terminator")]
    MissingSemicolon,
    /// No `= Type` was found.
    #[error("missing `= Type`")]
    MissingType,
    /// The name (before `=`) was missing or had empty namespace components.
    #[error("missing or malformed name")]
    MissingName,
    /// No `#id` was given and no id hasher is configured.
    #[error("missing constructor ID")]
    MissingId,
    /// The `#id` hex literal was unparseable.
    #[error("invalid constructor ID: {0}")]
    InvalidId(#[source] ParseIntError),
    /// A parameter was invalid.
    #[error("invalid parameter: {0}")]
    InvalidParam(#[source] ParamParseError),
    /// The definition uses a syntax we don't support yet.
    #[error("unsupported TL syntax")]
    NotImplemented,
}

impl From<ParamParseError> for ParseErrorKind {
    fn from(e: ParamParseError) -> Self {
        match e {
            ParamParseError::NotImplemented => Self::NotImplemented,
            e => Self::InvalidParam(e),
        }
    }
}

/// A schema line that failed to parse, with its location.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("line {line}: {kind} (`{raw}`)")]
pub struct ParseError {
    /// 1-based line number in the schema text.
    pub line: usize,
    /// The offending line, trimmed.
    pub raw: String,
    /// The underlying cause.
    #[source]
    pub kind: ParseErrorKind,
}
