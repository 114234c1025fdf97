//! Merging several schema sources of possibly different layers.
//!
//! For every entry name the definitions from the highest layer that defines
//! it win. Identical top-layer definitions merge silently; anything else is
//! handed to a [`ConflictResolver`] supplied by the caller, so the merge
//! itself never prompts, reads config files or votes.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use layer_tl_parser::{parse_tl_schema, ParseOptions};

use crate::errors::{MergeError, SchemaError};
use crate::model::{EntryKind, TlEntry};
use crate::schema::TlFullSchema;

/// A schema tagged with the layer it was taken from.
#[derive(Clone, Debug, PartialEq)]
pub struct LayeredSchema {
    /// Layer number; higher is newer.
    pub layer: i32,
    /// The schema itself.
    pub schema: TlFullSchema,
}

impl LayeredSchema {
    /// Tags `schema` with `layer`.
    pub fn new(layer: i32, schema: TlFullSchema) -> Self {
        Self { layer, schema }
    }

    /// Parses schema text, taking the layer from its `// LAYER N` marker
    /// (`0` when absent).
    pub fn from_tl(text: &str, options: ParseOptions) -> Result<Self, SchemaError> {
        let parsed = parse_tl_schema(text, options)?;
        Ok(Self {
            layer: parsed.layer.unwrap_or(0),
            schema: TlFullSchema::from_definitions(&parsed.definitions)?,
        })
    }
}

/// One source's view of a conflicting entry.
#[derive(Clone, Copy, Debug)]
pub struct Candidate<'a> {
    /// Index of the source in the slice given to [`merge_schemas`].
    pub source: usize,
    /// Layer of that source.
    pub layer: i32,
    /// The source's definition, or `None` if it doesn't define the entry.
    pub entry: Option<&'a TlEntry>,
}

/// An entry whose top-layer definitions disagree.
#[derive(Clone, Debug)]
pub struct Conflict<'a> {
    /// Class or method.
    pub kind: EntryKind,
    /// Entry name.
    pub name: &'a str,
    /// First difference found, e.g. `"id mismatch"`.
    pub reason: String,
    /// One candidate per source, absent ones included.
    pub candidates: Vec<Candidate<'a>>,
    /// The highest layer defining the entry.
    pub top_layer: i32,
}

impl<'a> Conflict<'a> {
    /// The definitions at [`Self::top_layer`].
    pub fn top_candidates(&self) -> impl Iterator<Item = &'a TlEntry> + '_ {
        self.candidates
            .iter()
            .filter(|c| c.layer == self.top_layer)
            .filter_map(|c| c.entry)
    }
}

/// What to do with a conflicting entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// Use this definition.
    Keep(TlEntry),
    /// Leave the entry out of the merged schema.
    Drop,
}

/// Decides conflicts on behalf of [`merge_schemas`].
///
/// Returning `None` leaves the conflict unresolved, which aborts the merge
/// with [`MergeError::Conflict`].
pub trait ConflictResolver {
    /// Picks a resolution for `conflict`.
    fn resolve(&mut self, conflict: &Conflict<'_>) -> Option<Resolution>;
}

impl<F> ConflictResolver for F
where
    F: FnMut(&Conflict<'_>) -> Option<Resolution>,
{
    fn resolve(&mut self, conflict: &Conflict<'_>) -> Option<Resolution> {
        self(conflict)
    }
}

/// Resolver that never resolves anything: every conflict is an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct Strict;

impl ConflictResolver for Strict {
    fn resolve(&mut self, _conflict: &Conflict<'_>) -> Option<Resolution> {
        None
    }
}

/// Result of [`merge_schemas`].
#[derive(Clone, Debug, PartialEq)]
pub struct MergedSchema {
    /// The highest layer among the sources.
    pub layer: i32,
    /// The merged schema, with unions recomputed.
    pub schema: TlFullSchema,
    /// Names of the entries that went through the resolver.
    pub conflicts: Vec<String>,
}

/// Merges `sources` into one schema.
pub fn merge_schemas<R>(sources: &[LayeredSchema], resolver: &mut R) -> Result<MergedSchema, MergeError>
where
    R: ConflictResolver + ?Sized,
{
    // Entry names in order of first appearance across all sources
    let mut seen: HashSet<(EntryKind, &str)> = HashSet::new();
    let mut order: Vec<(EntryKind, &str)> = Vec::new();
    for source in sources {
        for entry in source.schema.entries() {
            if seen.insert((entry.kind, entry.name.as_str())) {
                order.push((entry.kind, entry.name.as_str()));
            }
        }
    }

    let mut entries = Vec::with_capacity(order.len());
    let mut conflicts = Vec::new();

    for (kind, name) in order {
        let candidates: Vec<Candidate<'_>> = sources
            .iter()
            .enumerate()
            .map(|(source, s)| Candidate {
                source,
                layer: s.layer,
                entry: s.schema.entry(kind, name),
            })
            .collect();

        let top_layer = candidates
            .iter()
            .filter(|c| c.entry.is_some())
            .map(|c| c.layer)
            .max()
            .unwrap_or_default();
        let top: Vec<&TlEntry> = candidates
            .iter()
            .filter(|c| c.layer == top_layer)
            .filter_map(|c| c.entry)
            .collect();

        let Some((&first, rest)) = top.split_first() else {
            continue;
        };

        match rest.iter().find_map(|other| first.difference(other)) {
            None => {
                let mut merged = first.clone();
                if merged.comment.is_none() {
                    merged.comment = rest.iter().find_map(|e| e.comment.clone());
                }
                entries.push(merged);
            }
            Some(what) => {
                let conflict = Conflict {
                    kind,
                    name,
                    reason: format!("{what} mismatch"),
                    candidates,
                    top_layer,
                };
                match resolver.resolve(&conflict) {
                    Some(Resolution::Keep(entry)) => {
                        log::info!("[tl-schema] conflict on {kind} `{name}` ({}): kept {entry}", conflict.reason);
                        entries.push(entry);
                    }
                    Some(Resolution::Drop) => {
                        log::info!("[tl-schema] conflict on {kind} `{name}` ({}): dropped", conflict.reason);
                    }
                    None => {
                        return Err(MergeError::Conflict {
                            kind,
                            name: name.to_owned(),
                            reason: conflict.reason,
                        });
                    }
                }
                conflicts.push(name.to_owned());
            }
        }
    }

    // Newest layer first; the sort is stable, so equal layers keep source order
    let mut by_layer: Vec<&LayeredSchema> = sources.iter().collect();
    by_layer.sort_by_key(|s| Reverse(s.layer));

    let mut union_comments: BTreeMap<String, String> = BTreeMap::new();
    for source in by_layer {
        for (union, comment) in source.schema.union_comments() {
            union_comments.entry(union).or_insert(comment);
        }
    }

    let layer = sources.iter().map(|s| s.layer).max().unwrap_or_default();
    let schema = TlFullSchema::from_parts(entries, &union_comments)?;
    log::debug!(
        "[tl-schema] merged {} sources into layer {layer}: {} entries, {} conflicts",
        sources.len(),
        schema.entries().len(),
        conflicts.len(),
    );

    Ok(MergedSchema { layer, schema, conflicts })
}
