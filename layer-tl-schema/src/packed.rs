//! The JSON interchange form of a schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;
use crate::merge::LayeredSchema;
use crate::model::TlEntry;
use crate::schema::TlFullSchema;

/// `{ layer, entries, unionComments }`: what build steps hand to each other.
///
/// Unions are not stored; they are rebuilt from the entries on
/// [`unpack`](Self::unpack).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlPackedSchema {
    /// Schema layer.
    pub layer: i32,
    /// Entries in declaration order.
    pub entries: Vec<TlEntry>,
    /// Union documentation, keyed by union name.
    #[serde(default)]
    pub union_comments: BTreeMap<String, String>,
}

impl TlPackedSchema {
    /// Packs `schema` as layer `layer`.
    pub fn pack(schema: &TlFullSchema, layer: i32) -> Self {
        Self {
            layer,
            entries: schema.entries().to_vec(),
            union_comments: schema.union_comments(),
        }
    }

    /// Rebuilds the full schema, indexes included.
    pub fn unpack(self) -> Result<LayeredSchema, SchemaError> {
        let schema = TlFullSchema::from_parts(self.entries, &self.union_comments)?;
        Ok(LayeredSchema::new(self.layer, schema))
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads the JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<&LayeredSchema> for TlPackedSchema {
    fn from(s: &LayeredSchema) -> Self {
        Self::pack(&s.schema, s.layer)
    }
}
