//! Structural differences between two schema snapshots.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::{EntryKind, Predicate, TlArgument, TlEntry, TlGeneric, TlType, TlUnion};
use crate::schema::TlFullSchema;

/// An `old` → `new` pair for one changed property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PropertyDiff<T> {
    /// Value in the old schema.
    pub old: T,
    /// Value in the new schema.
    pub new: T,
}

impl<T: PartialEq> PropertyDiff<T> {
    fn between(old: T, new: T) -> Option<Self> {
        (old != new).then_some(Self { old, new })
    }
}

/// Added, removed and modified items of one kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BasicDiff<T, M> {
    /// Only in the new schema.
    pub added: Vec<T>,
    /// Only in the old schema.
    pub removed: Vec<T>,
    /// In both, but different.
    pub modified: Vec<M>,
}

impl<T, M> Default for BasicDiff<T, M> {
    fn default() -> Self {
        Self { added: Vec::new(), removed: Vec::new(), modified: Vec::new() }
    }
}

impl<T, M> BasicDiff<T, M> {
    /// `true` when nothing was added, removed or modified.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// An argument present on both sides with a different type or predicate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TlArgumentDiff {
    /// Argument name.
    pub name: String,
    /// Type change.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<PropertyDiff<TlType>>,
    /// Predicate change, including gaining or losing optionality.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<PropertyDiff<Option<Predicate>>>,
}

/// Changes to one class or method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TlEntryDiff {
    /// Entry name.
    pub name: String,
    /// Constructor id change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<PropertyDiff<u32>>,
    /// Parent union or return type change.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<PropertyDiff<TlType>>,
    /// Generic parameter change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generics: Option<PropertyDiff<Vec<TlGeneric>>>,
    /// Argument changes, matched by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<BasicDiff<TlArgument, TlArgumentDiff>>,
    /// Documentation changes. Reported, but never make an entry modified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<PropertyDiff<Option<String>>>,
}

impl TlEntryDiff {
    /// `true` when the wire shape of the entry changed.
    pub fn is_modified(&self) -> bool {
        self.id.is_some() || self.ty.is_some() || self.generics.is_some() || self.arguments.is_some()
    }
}

/// Member changes of a union present in both schemas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TlUnionDiff {
    /// Union name.
    pub name: String,
    /// Classes that joined the union.
    pub added: Vec<String>,
    /// Classes that left it.
    pub removed: Vec<String>,
}

/// Everything that changed between two schemas.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TlSchemaDiff {
    /// Class changes.
    pub classes: BasicDiff<TlEntry, TlEntryDiff>,
    /// Method changes.
    pub methods: BasicDiff<TlEntry, TlEntryDiff>,
    /// Union changes.
    pub unions: BasicDiff<TlUnion, TlUnionDiff>,
}

impl TlSchemaDiff {
    /// `true` when the schemas are structurally identical.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.methods.is_empty() && self.unions.is_empty()
    }
}

/// Compares two definitions of the same entry.
///
/// Arguments are matched by name, so reordering alone is not reported as a
/// change to any single argument.
pub fn diff_entries(old: &TlEntry, new: &TlEntry) -> TlEntryDiff {
    let old_args: HashMap<&str, &TlArgument> =
        old.arguments.iter().map(|a| (a.name.as_str(), a)).collect();
    let new_names: HashSet<&str> = new.arguments.iter().map(|a| a.name.as_str()).collect();

    let mut args = BasicDiff::default();
    for arg in &new.arguments {
        let Some(prev) = old_args.get(arg.name.as_str()) else {
            args.added.push(arg.clone());
            continue;
        };
        let ty = PropertyDiff::between(prev.ty.clone(), arg.ty.clone());
        let predicate = PropertyDiff::between(prev.predicate.clone(), arg.predicate.clone());
        if ty.is_some() || predicate.is_some() {
            args.modified.push(TlArgumentDiff { name: arg.name.clone(), ty, predicate });
        }
    }
    args.removed = old
        .arguments
        .iter()
        .filter(|a| !new_names.contains(a.name.as_str()))
        .cloned()
        .collect();

    TlEntryDiff {
        name: new.name.clone(),
        id: PropertyDiff::between(old.id, new.id),
        ty: PropertyDiff::between(old.ty.clone(), new.ty.clone()),
        generics: PropertyDiff::between(old.generics.clone(), new.generics.clone()),
        arguments: (!args.is_empty()).then_some(args),
        comment: PropertyDiff::between(old.comment.clone(), new.comment.clone()),
    }
}

fn diff_kind(old: &TlFullSchema, new: &TlFullSchema, kind: EntryKind) -> BasicDiff<TlEntry, TlEntryDiff> {
    let mut diff = BasicDiff::default();

    for entry in old.entries().iter().filter(|e| e.kind == kind) {
        match new.entry(kind, &entry.name) {
            None => diff.removed.push(entry.clone()),
            Some(other) => {
                let entry_diff = diff_entries(entry, other);
                if entry_diff.is_modified() {
                    diff.modified.push(entry_diff);
                }
            }
        }
    }
    diff.added = new
        .entries()
        .iter()
        .filter(|e| e.kind == kind && old.entry(kind, &e.name).is_none())
        .cloned()
        .collect();

    diff
}

fn diff_unions(old: &TlFullSchema, new: &TlFullSchema) -> BasicDiff<TlUnion, TlUnionDiff> {
    let mut diff = BasicDiff::default();

    for union in old.unions() {
        let Some(other) = new.union(&union.name) else {
            diff.removed.push(union.clone());
            continue;
        };
        let before: HashSet<&String> = union.classes.iter().collect();
        let after: HashSet<&String> = other.classes.iter().collect();
        let added: Vec<String> = other.classes.iter().filter(|c| !before.contains(c)).cloned().collect();
        let removed: Vec<String> = union.classes.iter().filter(|c| !after.contains(c)).cloned().collect();
        if !added.is_empty() || !removed.is_empty() {
            diff.modified.push(TlUnionDiff { name: union.name.clone(), added, removed });
        }
    }
    diff.added = new
        .unions()
        .iter()
        .filter(|u| old.union(&u.name).is_none())
        .cloned()
        .collect();

    diff
}

/// Computes what changed going from `old` to `new`.
pub fn diff_schemas(old: &TlFullSchema, new: &TlFullSchema) -> TlSchemaDiff {
    let diff = TlSchemaDiff {
        classes: diff_kind(old, new, EntryKind::Class),
        methods: diff_kind(old, new, EntryKind::Method),
        unions: diff_unions(old, new),
    };
    log::debug!(
        "[tl-schema] diff: classes +{}/-{}/~{}, methods +{}/-{}/~{}, unions +{}/-{}/~{}",
        diff.classes.added.len(),
        diff.classes.removed.len(),
        diff.classes.modified.len(),
        diff.methods.added.len(),
        diff.methods.removed.len(),
        diff.methods.modified.len(),
        diff.unions.added.len(),
        diff.unions.removed.len(),
        diff.unions.modified.len(),
    );
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(src: &str) -> TlEntry {
        TlEntry::from_definition(&src.parse().unwrap()).unwrap()
    }

    #[test]
    fn argument_reorder_is_not_a_modification() {
        let old = entry("a#1 x:int y:string = A;");
        let new = entry("a#1 y:string x:int = A;");
        let diff = diff_entries(&old, &new);
        assert!(diff.arguments.is_none());
        assert!(!diff.is_modified());
    }

    #[test]
    fn argument_changes_by_name() {
        let old = entry("a#1 flags:# x:int y:string = A;");
        let new = entry("a#2 flags:# x:flags.0?int z:long = A;");
        let diff = diff_entries(&old, &new);

        assert_eq!(diff.id, Some(PropertyDiff { old: 1, new: 2 }));
        let args = diff.arguments.unwrap();
        assert_eq!(args.added.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(), ["z"]);
        assert_eq!(args.removed.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(), ["y"]);
        assert_eq!(args.modified.len(), 1);
        assert_eq!(args.modified[0].name, "x");
        assert!(args.modified[0].ty.is_none());
        assert_eq!(
            args.modified[0].predicate,
            Some(PropertyDiff { old: None, new: Some("flags.0".parse().unwrap()) })
        );
    }

    #[test]
    fn comment_only_change_is_reported_but_not_modified() {
        let mut old = entry("a#1 = A;");
        let new = old.clone();
        old.comment = Some("old docs".into());
        let diff = diff_entries(&old, &new);
        assert!(diff.comment.is_some());
        assert!(!diff.is_modified());
    }
}
