//! Reads Telegram [Type Language] (TL) schema text into [`Definition`]s.
//!
//! ```rust
//! use layer_tl_parser::{parse_tl_schema, ParseOptions};
//!
//! let src = "// LAYER 181\nuser#12345 id:long name:string = User;";
//! let parsed = parse_tl_schema(src, ParseOptions::default()).unwrap();
//! assert_eq!(parsed.layer, Some(181));
//! assert_eq!(parsed.definitions[0].full_name(), "user");
//! ```
//!
//! The `layer-tl-schema` crate builds its indexed model from these.
//!
//! [Type Language]: https://core.telegram.org/mtproto/TL

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Parse errors.
pub mod errors;
pub mod tl;
mod iterator;
mod utils;

use errors::ParseError;
use tl::Definition;

pub use utils::crc32_id;

/// Knobs for [`parse_tl_file`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseOptions {
    /// Derives a constructor ID from the declaration text when it carries no
    /// explicit `#id`. `None` makes a missing id a parse error.
    pub id_hasher: Option<fn(&str) -> u32>,
}

impl ParseOptions {
    /// Options that derive missing ids with [`crc32_id`].
    pub fn derive_ids() -> Self {
        Self { id_hasher: Some(crc32_id) }
    }
}

/// A fully parsed schema file.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedSchema {
    /// Value of the highest `// LAYER N` marker, if any.
    pub layer: Option<i32>,
    /// Definitions in declaration order.
    pub definitions: Vec<Definition>,
}

/// Parses a complete TL schema file, yielding [`Definition`]s one by one.
///
/// Lines starting with `//` are comments; a comment block directly above a
/// definition becomes its [`Definition::comment`]. The special
/// `---functions---` and `---types---` section markers switch the
/// [`tl::Category`] applied to the following definitions.
///
/// Errors are yielded per line; the caller chooses whether to skip them.
pub fn parse_tl_file(
    contents: &str,
    options: ParseOptions,
) -> impl Iterator<Item = Result<Definition, ParseError>> + '_ {
    iterator::TlIterator::new(contents, options)
}

/// Parses a whole schema, failing on the first malformed line.
pub fn parse_tl_schema(contents: &str, options: ParseOptions) -> Result<ParsedSchema, ParseError> {
    let mut iter = iterator::TlIterator::new(contents, options);
    let definitions = iter.by_ref().collect::<Result<Vec<_>, _>>()?;
    log::debug!("[tl-parser] parsed {} definitions", definitions.len());
    Ok(ParsedSchema {
        layer: iter.layer(),
        definitions,
    })
}
