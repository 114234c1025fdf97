//! Schema model for Telegram's TL: typed entries, the union index, layered
//! merging, structural diffs and the packed JSON interchange format.
//!
//! ```rust
//! use layer_tl_parser::ParseOptions;
//! use layer_tl_schema::TlFullSchema;
//!
//! let schema = TlFullSchema::from_tl(
//!     "peerUser#59511722 user_id:long = Peer;\npeerChat#36c6019a chat_id:long = Peer;",
//!     ParseOptions::default(),
//! )
//! .unwrap();
//!
//! let members: Vec<_> = schema.union_members("Peer").map(|e| e.name.as_str()).collect();
//! assert_eq!(members, ["peerUser", "peerChat"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod diff;
pub mod errors;
pub mod merge;
pub mod model;
pub mod packed;

mod grouper;
mod schema;

pub use diff::{diff_entries, diff_schemas, TlSchemaDiff};
pub use errors::{MergeError, SchemaError, TypeError};
pub use merge::{
    merge_schemas, Candidate, Conflict, ConflictResolver, LayeredSchema, MergedSchema, Resolution,
    Strict,
};
pub use model::{EntryKind, Predicate, TlArgument, TlEntry, TlGeneric, TlType, TlUnion};
pub use packed::TlPackedSchema;
pub use schema::TlFullSchema;
