//! Dynamic values the codec reads and writes.

use std::collections::BTreeMap;
use std::fmt;

/// Arguments of an object, keyed by argument name.
///
/// Flags words never appear here: they are computed from the optional
/// fields on encode and dropped on decode.
pub type Fields = BTreeMap<String, Value>;

/// One TL value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `int128`
    Int128([u8; 16]),
    /// `int256`
    Int256([u8; 32]),
    /// `double`
    Double(f64),
    /// `string`
    String(String),
    /// `bytes`
    Bytes(Vec<u8>),
    /// `Bool`, and the bit of a `true` flag.
    Bool(bool),
    /// `Vector<T>` or `vector<T>`.
    Vector(Vec<Value>),
    /// A constructor with its fields.
    Object(Object),
    /// Pre-encoded bytes for a generic `!X` argument, written verbatim.
    Raw(Vec<u8>),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Int128(_) => "int128",
            Self::Int256(_) => "int256",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Bool(_) => "Bool",
            Self::Vector(_) => "vector",
            Self::Object(_) => "object",
            Self::Raw(_) => "raw",
        }
    }

    /// The object inside, if this is one.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The elements, if this is a vector.
    pub fn as_vector(&self) -> Option<&[Value]> {
        match self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self { Self::$variant(v) }
        }
    )*};
}

impl_from! {
    i32 => Int,
    i64 => Long,
    [u8; 16] => Int128,
    [u8; 32] => Int256,
    f64 => Double,
    String => String,
    Vec<u8> => Bytes,
    bool => Bool,
    Vec<Value> => Vector,
    Object => Object,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self { Self::String(v.to_owned()) }
}

/// A decoded (or to-be-encoded) constructor.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Object {
    /// Full name of the constructor, e.g. `messages.chats`.
    #[cfg_attr(feature = "serde", serde(rename = "_"))]
    pub name: String,
    /// Its arguments.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub fields: Fields,
}

impl Object {
    /// An object with no fields yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Fields::new() }
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Looks up a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        let mut sep = " { ";
        for (k, v) in &self.fields {
            write!(f, "{sep}{k}: {v}")?;
            sep = ", ";
        }
        if !self.fields.is_empty() {
            f.write_str(" }")?;
        }
        Ok(())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Int128(b) => write_hex(f, b),
            Self::Int256(b) => write_hex(f, b),
            Self::Bytes(b) | Self::Raw(b) => {
                f.write_str("0x")?;
                write_hex(f, b)
            }
            Self::Vector(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(o) => write!(f, "{o}"),
        }
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    bytes.iter().try_for_each(|b| write!(f, "{b:02x}"))
}
