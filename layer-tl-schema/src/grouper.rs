//! Groups entries and unions by namespace for organised output.

use std::collections::BTreeMap;

use crate::model::{EntryKind, TlEntry, TlUnion};

/// Group entries of `kind` by their namespace. Namespaces come out sorted,
/// entries inside a bucket alphabetically.
pub(crate) fn group_by_ns(entries: &[TlEntry], kind: EntryKind) -> Vec<(String, Vec<&TlEntry>)> {
    let mut map: BTreeMap<&str, Vec<&TlEntry>> = BTreeMap::new();

    for entry in entries.iter().filter(|e| e.kind == kind) {
        map.entry(entry.namespace()).or_default().push(entry);
    }

    map.into_iter()
        .map(|(ns, mut bucket)| {
            bucket.sort_by(|a, b| a.local_name().cmp(b.local_name()));
            (ns.to_owned(), bucket)
        })
        .collect()
}

/// Group unions by the namespace of their type name.
pub(crate) fn group_unions_by_ns(unions: &[TlUnion]) -> Vec<(String, Vec<&TlUnion>)> {
    let mut map: BTreeMap<&str, Vec<&TlUnion>> = BTreeMap::new();

    for union in unions {
        let ns = union.name.rsplit_once('.').map_or("", |(ns, _)| ns);
        map.entry(ns).or_default().push(union);
    }

    map.into_iter()
        .map(|(ns, mut bucket)| {
            bucket.sort_by(|a, b| a.name.cmp(&b.name));
            (ns.to_owned(), bucket)
        })
        .collect()
}
