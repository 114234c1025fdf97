//! Schema-driven encoder and decoder for the Telegram TL binary format.
//!
//! A [`Codec`] is compiled once from a [`TlFullSchema`]; after that it maps
//! constructor ids to readers and entry names to writers, and converts
//! between bytes and dynamic [`Value`]s.
//!
//! ```rust
//! use layer_tl_codec::{Codec, Cursor, Object, Value};
//! use layer_tl_parser::ParseOptions;
//! use layer_tl_schema::TlFullSchema;
//!
//! let schema = TlFullSchema::from_tl(
//!     "user#abcdef12 flags:# id:long first_name:flags.0?string = User;",
//!     ParseOptions::default(),
//! )
//! .unwrap();
//! let codec = Codec::new(&schema).unwrap();
//!
//! let user = Object::new("user").with("id", 5i64);
//! let bytes = codec.to_bytes(&user).unwrap();
//! assert_eq!(bytes, [0x12, 0xef, 0xcd, 0xab, 0, 0, 0, 0, 5, 0, 0, 0, 0, 0, 0, 0]);
//!
//! let decoded = codec.decode_any(&mut Cursor::from_slice(&bytes)).unwrap();
//! assert_eq!(decoded, Value::Object(user));
//! ```
//!
//! [`TlFullSchema`]: layer_tl_schema::TlFullSchema

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
pub mod deserialize;
mod errors;
mod plan;
pub mod serialize;
mod value;

pub use codec::{Codec, CodecConfig, EntryKey, Reader, Writer};
pub use deserialize::{Cursor, Deserializable};
pub use errors::CodecError;
pub use plan::EntryCodec;
pub use serialize::Serializable;
pub use value::{Fields, Object, Value};

/// Constructor id of a boxed `Vector`.
pub const VECTOR_ID: u32 = 0x1cb5c415;
/// `boolTrue#997275b5`.
pub const BOOL_TRUE_ID: u32 = 0x997275b5;
/// `boolFalse#bc799737`.
pub const BOOL_FALSE_ID: u32 = 0xbc799737;
/// `gzip_packed#3072cfa1 packed_data:bytes = Object;`
pub const GZIP_PACKED_ID: u32 = 0x3072cfa1;
