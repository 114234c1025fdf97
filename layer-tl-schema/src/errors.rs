//! Error types for schema building and merging.

use layer_tl_parser::errors::ParseError;
use thiserror::Error;

use crate::model::EntryKind;

/// A type expression that has no meaning in the schema model.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid type `{ty}`: {reason}")]
pub struct TypeError {
    /// The offending type, in TL syntax.
    pub ty: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

/// Errors produced while building a [`crate::TlFullSchema`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema text had a malformed line.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// An argument or return type could not be resolved.
    #[error("in `{entry}`: {source}")]
    Type {
        /// The entry the type belongs to.
        entry: String,
        /// What was wrong with it.
        #[source]
        source: TypeError,
    },
    /// Two entries share a constructor ID.
    #[error("duplicate constructor id {id:#010x}: `{first}` and `{second}`")]
    DuplicateId {
        /// The shared id.
        id: u32,
        /// The entry registered first.
        first: String,
        /// The entry that collided with it.
        second: String,
    },
    /// Two entries of the same kind share a name.
    #[error("duplicate {kind} `{name}`")]
    DuplicateName {
        /// Class or method.
        kind: EntryKind,
        /// The shared name.
        name: String,
    },
    /// An optional argument's `flags.N` condition cannot be honoured.
    #[error("`{entry}.{argument}`: predicate `{predicate}` {reason}")]
    InvalidPredicate {
        /// The entry the argument belongs to.
        entry: String,
        /// The conditional argument.
        argument: String,
        /// The condition, in TL syntax.
        predicate: String,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// A packed schema could not be (de)serialized.
    #[error("packed schema: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced by [`crate::merge::merge_schemas`].
#[derive(Debug, Error)]
pub enum MergeError {
    /// Several top-layer sources disagree and the resolver gave no answer.
    #[error("unresolved conflict on {kind} `{name}`: {reason}")]
    Conflict {
        /// Class or method.
        kind: EntryKind,
        /// The conflicting entry name.
        name: String,
        /// First difference found between the candidates.
        reason: String,
    },
    /// The merged entries do not form a valid schema (e.g. a resolver
    /// returned an entry whose id collides with another one).
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
