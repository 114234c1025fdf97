//! The semantic schema model: entries, arguments, types and unions.

use std::fmt;
use std::str::FromStr;

use layer_tl_parser::tl::{Category, Definition, ParameterType, Type};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{SchemaError, TypeError};

/// Whether an entry is a data constructor or an RPC method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A constructor of some union type.
    Class,
    /// An RPC method.
    Method,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Class => "class",
            Self::Method => "method",
        })
    }
}

impl From<Category> for EntryKind {
    fn from(c: Category) -> Self {
        match c {
            Category::Types => Self::Class,
            Category::Functions => Self::Method,
        }
    }
}

/// Semantic type of an argument (or of an entry's return type).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TlType {
    /// `int`, signed 32-bit.
    Int,
    /// `long`, signed 64-bit.
    Long,
    /// `int128`, 16 opaque bytes.
    Int128,
    /// `int256`, 32 opaque bytes.
    Int256,
    /// `double`, IEEE-754.
    Double,
    /// `string`, UTF-8 text.
    String,
    /// `bytes`, raw byte string.
    Bytes,
    /// `Bool`, a boxed `boolTrue`/`boolFalse`.
    Bool,
    /// `true`, a pure presence flag that occupies no bytes.
    True,
    /// `#`, the flags bitfield marker.
    Flags,
    /// Reference to another type or constructor by its full name.
    Named {
        /// Full dotted name, e.g. `storage.FileType`.
        name: String,
        /// Encoded without a constructor id (lowercase name or `%`).
        bare: bool,
    },
    /// `Vector<T>` (boxed) or `vector<T>` (bare).
    Vector {
        /// Element type.
        elem: Box<TlType>,
        /// Whether the `0x1cb5c415` wrapper id is written.
        boxed: bool,
    },
    /// `!X`, a generic placeholder.
    Generic(String),
}

impl TlType {
    /// Resolves a parsed parser type into the semantic model.
    pub fn from_parsed(ty: &Type) -> Result<Self, TypeError> {
        if ty.generic_ref {
            return Ok(Self::Generic(ty.name.clone()));
        }

        let invalid = |reason| TypeError { ty: ty.to_string(), reason };

        if !ty.namespace.is_empty() {
            if ty.generic_arg.is_some() {
                return Err(invalid("only vectors take a type argument"));
            }
            return Ok(Self::Named { name: ty.full_name(), bare: ty.bare });
        }

        let resolved = match ty.name.as_str() {
            "int" => Self::Int,
            "long" => Self::Long,
            "int128" => Self::Int128,
            "int256" => Self::Int256,
            "double" => Self::Double,
            "string" => Self::String,
            "bytes" => Self::Bytes,
            "Bool" => Self::Bool,
            "true" => Self::True,
            "Vector" | "vector" => {
                let arg = ty
                    .generic_arg
                    .as_deref()
                    .ok_or_else(|| invalid("vector without element type"))?;
                return Ok(Self::Vector {
                    elem: Box::new(Self::from_parsed(arg)?),
                    boxed: ty.name == "Vector",
                });
            }
            _ => Self::Named { name: ty.name.clone(), bare: ty.bare },
        };

        if ty.generic_arg.is_some() {
            return Err(invalid("only vectors take a type argument"));
        }
        Ok(resolved)
    }

    /// `true` for the fixed-size and length-prefixed primitives.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Named { .. } | Self::Vector { .. } | Self::Generic(_))
    }
}

impl fmt::Display for TlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::Long => f.write_str("long"),
            Self::Int128 => f.write_str("int128"),
            Self::Int256 => f.write_str("int256"),
            Self::Double => f.write_str("double"),
            Self::String => f.write_str("string"),
            Self::Bytes => f.write_str("bytes"),
            Self::Bool => f.write_str("Bool"),
            Self::True => f.write_str("true"),
            Self::Flags => f.write_str("#"),
            Self::Named { name, bare } => {
                let local = name.rsplit('.').next().unwrap_or(name);
                if *bare && !local.starts_with(|c: char| c.is_ascii_lowercase()) {
                    f.write_str("%")?;
                }
                f.write_str(name)
            }
            Self::Vector { elem, boxed } => {
                let v = if *boxed { "Vector" } else { "vector" };
                write!(f, "{v}<{elem}>")
            }
            Self::Generic(name) => write!(f, "!{name}"),
        }
    }
}

impl FromStr for TlType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "#" {
            return Ok(Self::Flags);
        }
        let ty = Type::from_str(s).map_err(|_| TypeError {
            ty: s.to_owned(),
            reason: "malformed type expression",
        })?;
        Self::from_parsed(&ty)
    }
}

impl Serialize for TlType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TlType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// The `flags.N` condition gating an optional argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Predicate {
    /// Name of the `#` argument holding the bit.
    pub flags: String,
    /// Bit index, below 32.
    pub bit: u32,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.flags, self.bit)
    }
}

impl FromStr for Predicate {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError { ty: s.to_owned(), reason: "predicate must be `flags.N` with N < 32" };
        let (flags, bit) = s.split_once('.').ok_or_else(invalid)?;
        let bit = bit.parse::<u32>().map_err(|_| invalid())?;
        if flags.is_empty() || bit >= 32 {
            return Err(invalid());
        }
        Ok(Self { flags: flags.to_owned(), bit })
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// One argument of an entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TlArgument {
    /// Argument name as written in the schema.
    pub name: String,
    /// Semantic type.
    #[serde(rename = "type")]
    pub ty: TlType,
    /// Present for optional arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<Predicate>,
}

impl TlArgument {
    /// `true` when the argument is gated by a flags bit.
    pub fn is_optional(&self) -> bool {
        self.predicate.is_some()
    }
}

impl fmt::Display for TlArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name)?;
        if let Some(p) = &self.predicate {
            write!(f, "{p}?")?;
        }
        write!(f, "{}", self.ty)
    }
}

/// A `{X:Type}` generic parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TlGeneric {
    /// Placeholder name.
    pub name: String,
    /// Bound (usually `Type`).
    #[serde(rename = "type")]
    pub bound: String,
}

/// A class or method declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlEntry {
    /// Class or method.
    pub kind: EntryKind,
    /// Full dotted name, e.g. `messages.sendMessage`.
    pub name: String,
    /// Constructor id.
    pub id: u32,
    /// Parent union for classes, return type for methods.
    #[serde(rename = "type")]
    pub ty: TlType,
    /// Generic parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<TlGeneric>,
    /// Arguments in wire order.
    pub arguments: Vec<TlArgument>,
    /// Documentation comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TlEntry {
    /// Converts a parsed definition, resolving every type.
    pub fn from_definition(def: &Definition) -> Result<Self, SchemaError> {
        let name = def.full_name();
        let type_err = |source| SchemaError::Type { entry: name.clone(), source };

        let mut arguments = Vec::with_capacity(def.params.len());
        for p in &def.params {
            let (ty, predicate) = match &p.ty {
                ParameterType::Flags => (TlType::Flags, None),
                ParameterType::Normal { ty, flag } => (
                    TlType::from_parsed(ty).map_err(type_err)?,
                    flag.as_ref().map(|f| Predicate { flags: f.name.clone(), bit: f.index }),
                ),
            };
            arguments.push(TlArgument { name: p.name.clone(), ty, predicate });
        }

        let ty = TlType::from_parsed(&def.ty).map_err(type_err)?;

        Ok(Self {
            kind: def.category.into(),
            name: name.clone(),
            id: def.id,
            ty,
            generics: def
                .generics
                .iter()
                .map(|g| TlGeneric { name: g.name.clone(), bound: g.bound.clone() })
                .collect(),
            arguments,
            comment: def.comment.clone(),
        })
    }

    /// Namespace part of the name (`""` for the root namespace).
    pub fn namespace(&self) -> &str {
        self.name.rsplit_once('.').map_or("", |(ns, _)| ns)
    }

    /// Name without namespace.
    pub fn local_name(&self) -> &str {
        self.name.rsplit_once('.').map_or(self.name.as_str(), |(_, n)| n)
    }

    /// The union a class belongs to. `None` for methods.
    pub fn union_name(&self) -> Option<String> {
        match self.kind {
            EntryKind::Class => Some(match &self.ty {
                TlType::Named { name, .. } => name.clone(),
                other => other.to_string(),
            }),
            EntryKind::Method => None,
        }
    }

    /// Looks up an argument by name.
    pub fn argument(&self, name: &str) -> Option<&TlArgument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Structural equality that ignores documentation.
    pub fn same_definition(&self, other: &Self) -> bool {
        self.difference(other).is_none()
    }

    /// Describes the first structural difference with `other`, if any.
    pub fn difference(&self, other: &Self) -> Option<&'static str> {
        if self.kind != other.kind {
            Some("kind")
        } else if self.name != other.name {
            Some("name")
        } else if self.id != other.id {
            Some("id")
        } else if self.ty != other.ty {
            Some("type")
        } else if self.generics != other.generics {
            Some("generics")
        } else if self.arguments != other.arguments {
            Some("arguments")
        } else {
            None
        }
    }
}

impl fmt::Display for TlEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:08x}", self.name, self.id)?;
        if !self.generics.is_empty() {
            let list = self
                .generics
                .iter()
                .map(|g| format!("{}:{}", g.name, g.bound))
                .collect::<Vec<_>>();
            write!(f, " {{{}}}", list.join(","))?;
        }
        for arg in &self.arguments {
            write!(f, " {arg}")?;
        }
        match &self.ty {
            TlType::Generic(name) => write!(f, " = {name};"),
            ty => write!(f, " = {ty};"),
        }
    }
}

/// A named, closed set of classes sharing a type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlUnion {
    /// Type name, e.g. `InputPeer`.
    pub name: String,
    /// Member class names, in declaration order.
    pub classes: Vec<String>,
    /// Documentation comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_roundtrip_through_tl_syntax() {
        for src in ["int", "Vector<long>", "vector<%Message>", "!X", "#", "storage.FileType", "future_salt"] {
            let ty: TlType = src.parse().unwrap();
            assert_eq!(ty.to_string(), src);
        }
    }

    #[test]
    fn vector_element_bareness() {
        let ty: TlType = "Vector<%Message>".parse().unwrap();
        assert_eq!(
            ty,
            TlType::Vector {
                elem: Box::new(TlType::Named { name: "Message".into(), bare: true }),
                boxed: true,
            }
        );
    }

    #[test]
    fn rejects_vector_without_argument() {
        assert!("Vector".parse::<TlType>().is_err());
        assert!("int<long>".parse::<TlType>().is_err());
    }

    #[test]
    fn predicate_parsing() {
        assert_eq!("flags2.31".parse::<Predicate>().unwrap(), Predicate { flags: "flags2".into(), bit: 31 });
        assert!("flags.32".parse::<Predicate>().is_err());
        assert!("flags".parse::<Predicate>().is_err());
    }
}
