use std::io;
use std::path::PathBuf;

use layer_tl_codec::CodecError;
use layer_tl_schema::{MergeError, SchemaError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("decoding stopped at byte {offset}: {source}")]
    Decode {
        offset: usize,
        #[source]
        source: CodecError,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    pub fn schema(path: impl Into<PathBuf>) -> impl FnOnce(SchemaError) -> Self {
        let path = path.into();
        move |source| Self::Schema { path, source }
    }
}
