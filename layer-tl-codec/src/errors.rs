//! The [`CodecError`] type.

use thiserror::Error;

/// Everything that can go wrong while building a [`crate::Codec`] or
/// running it.
///
/// None of these are retried: a decode error means the stream can no longer
/// be trusted past the failing value.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A constructor id with no registered reader.
    #[error("unknown constructor id {id:#010x}")]
    UnknownConstructor {
        /// The id that was read.
        id: u32,
    },

    /// A required field was not supplied to the writer.
    #[error("`{entry}` requires field `{field}`")]
    MissingField {
        /// Entry being written.
        entry: String,
        /// The missing argument.
        field: String,
    },

    /// The buffer ended in the middle of a value.
    #[error("truncated buffer: needed {needed} more bytes, {remaining} left")]
    Truncated {
        /// Bytes the current read wanted.
        needed: usize,
        /// Bytes that were actually left.
        remaining: usize,
    },

    /// A known constructor turned up where a different one was expected.
    #[error("expected {expected}, found constructor {found:#010x}")]
    UnexpectedConstructor {
        /// What the context allowed (a union, `Vector`, `Bool` or an entry).
        expected: String,
        /// The id that was read.
        found: u32,
    },

    /// A supplied value does not fit the declared argument type.
    #[error("`{entry}.{field}`: expected {expected}, got {found}")]
    TypeMismatch {
        /// Entry being written.
        entry: String,
        /// Offending argument.
        field: String,
        /// Declared type, in TL syntax.
        expected: String,
        /// Kind of the supplied value.
        found: &'static str,
    },

    /// No entry with this name or id exists in the schema.
    #[error("no entry `{0}` in schema")]
    UnknownEntry(String),

    /// A `string` argument held bytes that are not UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// The schema cannot be compiled into a codec.
    #[error("cannot build codec for `{entry}`: {reason}")]
    InvalidSchema {
        /// Entry whose plan failed.
        entry: String,
        /// What was wrong.
        reason: String,
    },

    /// Objects, vectors or `gzip_packed` wrappers nest deeper than
    /// [`crate::CodecConfig::max_depth`].
    #[error("value nested deeper than {limit} levels")]
    TooDeep {
        /// The configured limit.
        limit: usize,
    },

    /// A vector of zero-width elements claims more items than
    /// [`crate::CodecConfig::max_zero_width_items`].
    #[error("vector of {count} zero-width items exceeds the limit of {limit}")]
    TooManyItems {
        /// Count read from the stream.
        count: usize,
        /// The configured limit.
        limit: usize,
    },

    /// A `string` or `bytes` value longer than the 3-byte length header
    /// can describe.
    #[error("{len} bytes do not fit a TL length header (max 16777215)")]
    BytesTooLong {
        /// Length of the value.
        len: usize,
    },

    /// A `gzip_packed` payload failed to inflate.
    #[error("gzip_packed: {0}")]
    Gzip(#[from] std::io::Error),
}
