//! [`TlFullSchema`]: entries plus the id, name and union indexes.

use std::collections::{BTreeMap, HashMap};

use layer_tl_parser::tl::Definition;
use layer_tl_parser::{parse_tl_schema, ParseOptions};

use crate::errors::SchemaError;
use crate::grouper;
use crate::model::{EntryKind, TlEntry, TlType, TlUnion};

/// A finalized schema: every entry, indexed by id and by name, plus the
/// union index derived from the classes' declared types.
#[derive(Clone, Debug, Default)]
pub struct TlFullSchema {
    entries: Vec<TlEntry>,
    by_id: HashMap<u32, usize>,
    classes: HashMap<String, usize>,
    methods: HashMap<String, usize>,
    unions: Vec<TlUnion>,
    union_index: HashMap<String, usize>,
}

impl PartialEq for TlFullSchema {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries && self.unions == other.unions
    }
}

/// Every `flags.N` must name a `#` argument declared earlier in the same
/// entry, with `N < 32`. Schemas parsed from text always satisfy this;
/// packed or hand-built ones may not.
fn check_predicates(entry: &TlEntry) -> Result<(), SchemaError> {
    for (pos, arg) in entry.arguments.iter().enumerate() {
        let Some(predicate) = &arg.predicate else {
            continue;
        };
        let declared = entry.arguments[..pos]
            .iter()
            .any(|a| a.name == predicate.flags && a.ty == TlType::Flags);
        let reason = if arg.ty == TlType::Flags {
            "cannot gate a `#` argument"
        } else if predicate.bit >= 32 {
            "uses a bit above 31"
        } else if !declared {
            "does not name an earlier `#` argument"
        } else {
            continue;
        };
        return Err(SchemaError::InvalidPredicate {
            entry: entry.name.clone(),
            argument: arg.name.clone(),
            predicate: predicate.to_string(),
            reason,
        });
    }
    Ok(())
}

impl TlFullSchema {
    /// Builds the indexes over `entries`.
    pub fn from_entries(entries: Vec<TlEntry>) -> Result<Self, SchemaError> {
        Self::from_parts(entries, &BTreeMap::new())
    }

    /// Like [`Self::from_entries`], attaching documentation to unions.
    pub fn from_parts(
        entries: Vec<TlEntry>,
        union_comments: &BTreeMap<String, String>,
    ) -> Result<Self, SchemaError> {
        let mut schema = Self::default();

        for (idx, entry) in entries.iter().enumerate() {
            if let Some(&prev) = schema.by_id.get(&entry.id) {
                return Err(SchemaError::DuplicateId {
                    id: entry.id,
                    first: entries[prev].name.clone(),
                    second: entry.name.clone(),
                });
            }
            schema.by_id.insert(entry.id, idx);
            check_predicates(entry)?;

            let index = match entry.kind {
                EntryKind::Class => &mut schema.classes,
                EntryKind::Method => &mut schema.methods,
            };
            if index.insert(entry.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateName { kind: entry.kind, name: entry.name.clone() });
            }

            if let Some(union) = entry.union_name() {
                let slot = match schema.union_index.get(&union) {
                    Some(&slot) => slot,
                    None => {
                        schema.unions.push(TlUnion {
                            comment: union_comments.get(&union).cloned(),
                            name: union.clone(),
                            classes: Vec::new(),
                        });
                        schema.union_index.insert(union, schema.unions.len() - 1);
                        schema.unions.len() - 1
                    }
                };
                schema.unions[slot].classes.push(entry.name.clone());
            }

            for flags in entry.arguments.iter().filter(|a| a.ty == TlType::Flags) {
                let used = entry.arguments.iter().any(|a| {
                    a.predicate.as_ref().is_some_and(|p| p.flags == flags.name)
                });
                if !used {
                    log::warn!("[tl-schema] `{}`: flags field `{}` gates nothing", entry.name, flags.name);
                }
            }
        }

        schema.entries = entries;
        log::debug!(
            "[tl-schema] built schema: {} classes, {} methods, {} unions",
            schema.classes.len(),
            schema.methods.len(),
            schema.unions.len(),
        );
        Ok(schema)
    }

    /// Converts parsed definitions and builds the indexes.
    pub fn from_definitions(defs: &[Definition]) -> Result<Self, SchemaError> {
        let entries = defs.iter().map(TlEntry::from_definition).collect::<Result<Vec<_>, _>>()?;
        Self::from_entries(entries)
    }

    /// Parses schema text and builds the model in one go.
    pub fn from_tl(text: &str, options: ParseOptions) -> Result<Self, SchemaError> {
        let parsed = parse_tl_schema(text, options)?;
        Self::from_definitions(&parsed.definitions)
    }

    /// All entries in declaration order.
    pub fn entries(&self) -> &[TlEntry] {
        &self.entries
    }

    /// Consumes the schema, returning its entries.
    pub fn into_entries(self) -> Vec<TlEntry> {
        self.entries
    }

    /// Finds an entry by constructor id.
    pub fn entry_by_id(&self, id: u32) -> Option<&TlEntry> {
        self.by_id.get(&id).map(|&i| &self.entries[i])
    }

    /// Finds an entry of the given kind by name.
    pub fn entry(&self, kind: EntryKind, name: &str) -> Option<&TlEntry> {
        match kind {
            EntryKind::Class => self.class(name),
            EntryKind::Method => self.method(name),
        }
    }

    /// Finds a class by full name.
    pub fn class(&self, name: &str) -> Option<&TlEntry> {
        self.classes.get(name).map(|&i| &self.entries[i])
    }

    /// Finds a method by full name.
    pub fn method(&self, name: &str) -> Option<&TlEntry> {
        self.methods.get(name).map(|&i| &self.entries[i])
    }

    /// Finds a union by type name.
    pub fn union(&self, name: &str) -> Option<&TlUnion> {
        self.union_index.get(name).map(|&i| &self.unions[i])
    }

    /// All unions, in order of their first member's declaration.
    pub fn unions(&self) -> &[TlUnion] {
        &self.unions
    }

    /// The member classes of a union.
    pub fn union_members(&self, name: &str) -> impl Iterator<Item = &TlEntry> + '_ {
        self.union(name)
            .into_iter()
            .flat_map(|u| u.classes.iter())
            .filter_map(|c| self.class(c))
    }

    /// Entries of `kind` grouped by namespace (root namespace is `""`).
    pub fn namespaces(&self, kind: EntryKind) -> Vec<(String, Vec<&TlEntry>)> {
        grouper::group_by_ns(&self.entries, kind)
    }

    /// Unions grouped by the namespace of their type name.
    pub fn union_namespaces(&self) -> Vec<(String, Vec<&TlUnion>)> {
        grouper::group_unions_by_ns(&self.unions)
    }

    /// Union comments, keyed by union name.
    pub fn union_comments(&self) -> BTreeMap<String, String> {
        self.unions
            .iter()
            .filter_map(|u| u.comment.clone().map(|c| (u.name.clone(), c)))
            .collect()
    }
}
