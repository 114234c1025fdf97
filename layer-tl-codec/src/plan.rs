//! Per-entry encode/decode plans, compiled once from a schema.

use std::collections::HashMap;

use layer_tl_schema::{EntryKind, TlEntry, TlFullSchema, TlType};

use crate::errors::CodecError;

/// How one value is laid out on the wire.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Wire {
    Int,
    Long,
    Int128,
    Int256,
    Double,
    String,
    Bytes,
    Bool,
    /// Constructor id followed by the body. `union` is set when the type
    /// names a union of the schema, and is what `check_unions` checks.
    Boxed { union: Option<String> },
    /// Body of a concrete constructor (index into the codec's entries).
    Bare { entry: usize },
    Vector { elem: Box<Wire>, boxed: bool },
    /// `!X`: any boxed object, or raw bytes on encode.
    Generic,
}

impl Wire {
    /// Fewest bytes a value laid out this way takes on the wire.
    pub(crate) fn min_width(&self, entries: &[EntryCodec]) -> usize {
        match self {
            Self::Int | Self::Bool | Self::String | Self::Bytes => 4,
            Self::Boxed { .. } | Self::Generic => 4,
            Self::Long | Self::Double => 8,
            Self::Int128 => 16,
            Self::Int256 => 32,
            Self::Bare { entry } => entries[*entry].min_body,
            Self::Vector { boxed: true, .. } => 8,
            Self::Vector { boxed: false, .. } => 4,
        }
    }
}

/// Bit `bit` of the `slot`-th flags word of an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cond {
    pub slot: usize,
    pub bit: u32,
}

impl Cond {
    pub fn is_set(self, words: &[u32]) -> bool {
        words[self.slot] & (1 << self.bit) != 0
    }

    pub fn set(self, words: &mut [u32]) {
        words[self.slot] |= 1 << self.bit;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FieldKind {
    /// A `#` word. Computed on encode, consumed on decode.
    Flags { slot: usize },
    /// Presence flag with no payload.
    True { cond: Option<Cond> },
    Value { wire: Wire, cond: Option<Cond> },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FieldPlan {
    pub name: String,
    /// Declared type, kept for error messages.
    pub ty: TlType,
    pub kind: FieldKind,
}

impl FieldPlan {
    fn min_width(&self, entries: &[EntryCodec]) -> usize {
        match &self.kind {
            FieldKind::Flags { .. } => 4,
            FieldKind::True { .. } | FieldKind::Value { cond: Some(_), .. } => 0,
            FieldKind::Value { wire, cond: None } => wire.min_width(entries),
        }
    }
}

/// The compiled reader/writer of one class or method.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryCodec {
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) kind: EntryKind,
    /// Union the class belongs to; `None` for methods.
    pub(crate) union: Option<String>,
    pub(crate) fields: Vec<FieldPlan>,
    pub(crate) flag_words: usize,
    /// Layout of the response, for methods.
    pub(crate) returns: Option<Wire>,
    /// Lower bound on the body size in bytes. Zero for a constructor with
    /// no required fields.
    pub(crate) min_body: usize,
}

impl EntryCodec {
    /// Constructor id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Full name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class or method.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Names of the arguments a caller supplies, in wire order (flags
    /// words excluded).
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| !matches!(f.kind, FieldKind::Flags { .. }))
            .map(|f| f.name.as_str())
    }
}

struct Compiler<'a> {
    schema: &'a TlFullSchema,
    classes: HashMap<&'a str, usize>,
}

/// Compiles every entry of `schema`, in declaration order.
pub(crate) fn compile(schema: &TlFullSchema) -> Result<Vec<EntryCodec>, CodecError> {
    let compiler = Compiler {
        schema,
        classes: schema
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.kind == EntryKind::Class)
            .map(|(i, e)| (e.name.as_str(), i))
            .collect(),
    };
    let mut entries = schema
        .entries()
        .iter()
        .map(|e| compiler.entry(e))
        .collect::<Result<Vec<_>, _>>()?;
    settle_min_widths(&mut entries);
    Ok(entries)
}

/// Bare fields make body widths depend on each other; iterate from zero
/// until nothing grows. Every intermediate value is a lower bound, so the
/// pass cap only loosens bare cycles.
fn settle_min_widths(entries: &mut [EntryCodec]) {
    for _ in 0..=entries.len() {
        let mut changed = false;
        for i in 0..entries.len() {
            let width = entries[i]
                .fields
                .iter()
                .fold(0usize, |acc, f| acc.saturating_add(f.min_width(entries)));
            if width != entries[i].min_body {
                entries[i].min_body = width;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

impl Compiler<'_> {
    fn entry(&self, entry: &TlEntry) -> Result<EntryCodec, CodecError> {
        let invalid = |reason: String| CodecError::InvalidSchema { entry: entry.name.clone(), reason };

        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut fields = Vec::with_capacity(entry.arguments.len());

        for arg in &entry.arguments {
            let cond = match &arg.predicate {
                None => None,
                Some(p) => {
                    let slot = *slots
                        .get(p.flags.as_str())
                        .ok_or_else(|| invalid(format!("`{}` refers to undeclared flags `{}`", arg.name, p.flags)))?;
                    if p.bit >= 32 {
                        return Err(invalid(format!("`{}` uses flag bit {}", arg.name, p.bit)));
                    }
                    Some(Cond { slot, bit: p.bit })
                }
            };

            let kind = match &arg.ty {
                TlType::Flags => {
                    if cond.is_some() {
                        return Err(invalid(format!("flags field `{}` cannot be optional", arg.name)));
                    }
                    slots.insert(&arg.name, slots.len());
                    FieldKind::Flags { slot: slots.len() - 1 }
                }
                TlType::True => FieldKind::True { cond },
                ty => FieldKind::Value { wire: self.wire(ty).map_err(invalid)?, cond },
            };

            fields.push(FieldPlan { name: arg.name.clone(), ty: arg.ty.clone(), kind });
        }

        let returns = match entry.kind {
            EntryKind::Method => Some(self.wire(&entry.ty).map_err(invalid)?),
            EntryKind::Class => None,
        };

        Ok(EntryCodec {
            id: entry.id,
            name: entry.name.clone(),
            kind: entry.kind,
            union: entry.union_name(),
            flag_words: slots.len(),
            fields,
            returns,
            min_body: 0,
        })
    }

    fn wire(&self, ty: &TlType) -> Result<Wire, String> {
        Ok(match ty {
            TlType::Int => Wire::Int,
            TlType::Long => Wire::Long,
            TlType::Int128 => Wire::Int128,
            TlType::Int256 => Wire::Int256,
            TlType::Double => Wire::Double,
            TlType::String => Wire::String,
            TlType::Bytes => Wire::Bytes,
            TlType::Bool => Wire::Bool,
            TlType::True | TlType::Flags => return Err(format!("`{ty}` is only valid as an argument")),
            TlType::Generic(_) => Wire::Generic,
            TlType::Vector { elem, boxed } => Wire::Vector { elem: Box::new(self.wire(elem)?), boxed: *boxed },
            TlType::Named { name, bare: false } => Wire::Boxed {
                union: self.schema.union(name).map(|u| u.name.clone()),
            },
            TlType::Named { name, bare: true } => Wire::Bare { entry: self.bare_target(name)? },
        })
    }

    /// A bare reference names a constructor directly, or a union with
    /// exactly one member.
    fn bare_target(&self, name: &str) -> Result<usize, String> {
        if let Some(&idx) = self.classes.get(name) {
            return Ok(idx);
        }
        match self.schema.union(name) {
            Some(union) if union.classes.len() == 1 => self
                .classes
                .get(union.classes[0].as_str())
                .copied()
                .ok_or_else(|| format!("union `{name}` lists unknown class `{}`", union.classes[0])),
            Some(union) => Err(format!(
                "bare `%{name}` is ambiguous: the union has {} constructors",
                union.classes.len()
            )),
            None => Err(format!("bare reference to unknown type `{name}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use layer_tl_parser::ParseOptions;

    use super::*;

    fn widths(src: &str) -> Vec<(String, usize)> {
        let schema = TlFullSchema::from_tl(src, ParseOptions::default()).unwrap();
        compile(&schema).unwrap().into_iter().map(|e| (e.name, e.min_body)).collect()
    }

    #[test]
    fn body_widths() {
        let got = widths(
            "empty#00000001 = Empty;
             point#00000002 x:int y:long = Point;
             opt#00000003 flags:# a:flags.0?long b:flags.1?true = Opt;
             wrap#00000004 p:%Point list:vector<%Empty> s:string = Wrap;",
        );
        assert_eq!(
            got,
            [
                ("empty".to_owned(), 0),
                ("point".to_owned(), 12),
                ("opt".to_owned(), 4),
                ("wrap".to_owned(), 12 + 4 + 4),
            ]
        );
    }
}
