//! The [`Codec`]: dispatch tables plus the encode/decode engine.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::io::Read;

use layer_tl_schema::{EntryKind, TlFullSchema};

use crate::deserialize::{Cursor, Deserializable};
use crate::errors::CodecError;
use crate::plan::{self, EntryCodec, FieldKind, FieldPlan, Wire};
use crate::serialize::{Serializable, MAX_BYTES_LEN};
use crate::value::{Fields, Object, Value};
use crate::{BOOL_FALSE_ID, BOOL_TRUE_ID, GZIP_PACKED_ID, VECTOR_ID};

type Result<T> = std::result::Result<T, CodecError>;

/// Runtime switches for a [`Codec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecConfig {
    /// Reject boxed values that are not members of the union the schema
    /// expects at that position.
    pub check_unions: bool,
    /// Transparently inflate `gzip_packed` payloads while decoding.
    pub inflate_gzip: bool,
    /// How deep objects, vectors and `gzip_packed` wrappers may nest
    /// before decoding fails with [`CodecError::TooDeep`].
    pub max_depth: usize,
    /// Largest count accepted for a vector whose elements can take zero
    /// bytes (bare constructors without required fields). Other vectors are
    /// bounded by the bytes left in the buffer.
    pub max_zero_width_items: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            check_unions: true,
            inflate_gzip: true,
            max_depth: 128,
            max_zero_width_items: 1 << 16,
        }
    }
}

/// Selects an entry by full name or by constructor id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKey<'a> {
    /// e.g. `"messages.sendMessage"`.
    Name(&'a str),
    /// e.g. `0x1cb5c415`.
    Id(u32),
}

impl<'a> From<&'a str> for EntryKey<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for EntryKey<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl From<u32> for EntryKey<'_> {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for EntryKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Id(id) => write!(f, "{id:#010x}"),
        }
    }
}

/// Reads the body of one constructor (its id already consumed).
pub trait Reader: Send + Sync {
    /// Constructor id this reader is registered under.
    fn id(&self) -> u32;
    /// Full entry name.
    fn name(&self) -> &str;
    /// Reads the fields. On error the cursor is left where it was.
    fn read(&self, codec: &Codec, buf: &mut Cursor<'_>) -> Result<Object>;
}

/// Writes one constructor.
pub trait Writer: Send + Sync {
    /// Full entry name this writer is registered under.
    fn name(&self) -> &str;
    /// Appends the constructor id (unless `bare`) and the fields. On error
    /// `buf` is truncated back to its original length.
    fn write(&self, codec: &Codec, buf: &mut Vec<u8>, fields: &Fields, bare: bool) -> Result<()>;
}

impl Reader for EntryCodec {
    fn id(&self) -> u32 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, codec: &Codec, buf: &mut Cursor<'_>) -> Result<Object> {
        rewinding(buf, |buf| self.read_body(codec, buf, 0))
    }
}

impl Writer for EntryCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, codec: &Codec, buf: &mut Vec<u8>, fields: &Fields, bare: bool) -> Result<()> {
        let start = buf.len();
        if !bare {
            self.id.serialize(buf);
        }
        let result = self.write_body(codec, buf, fields);
        if result.is_err() {
            buf.truncate(start);
        }
        result
    }
}

fn rewinding<'a, T>(buf: &mut Cursor<'a>, f: impl FnOnce(&mut Cursor<'a>) -> Result<T>) -> Result<T> {
    let start = buf.pos();
    let result = f(buf);
    if result.is_err() {
        buf.rewind(start);
    }
    result
}

fn check_len(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() > MAX_BYTES_LEN {
        return Err(CodecError::BytesTooLong { len: bytes.len() });
    }
    Ok(bytes)
}

fn gz_inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    if flate2::read::GzDecoder::new(data).read_to_end(&mut out).is_ok() && !out.is_empty() {
        return Ok(out);
    }
    out.clear();
    flate2::read::ZlibDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// Where a value is being written, for error messages.
struct Site<'a> {
    entry: &'a str,
    field: &'a FieldPlan,
}

impl Site<'_> {
    fn mismatch(&self, found: &Value) -> CodecError {
        CodecError::TypeMismatch {
            entry: self.entry.to_owned(),
            field: self.field.name.clone(),
            expected: self.field.ty.to_string(),
            found: found.kind(),
        }
    }
}

/// Encoder and decoder for every entry of one schema.
///
/// Built once, then shared read-only: `Codec` is `Send + Sync`, and every
/// call works on a buffer or cursor owned by the caller.
#[derive(Clone, Debug)]
pub struct Codec {
    entries: Vec<EntryCodec>,
    by_id: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
    config: CodecConfig,
}

impl Codec {
    /// Compiles `schema` with the default [`CodecConfig`].
    pub fn new(schema: &TlFullSchema) -> Result<Self> {
        Self::with_config(schema, CodecConfig::default())
    }

    /// Compiles `schema`.
    ///
    /// Fails with [`CodecError::InvalidSchema`] when an entry cannot be laid
    /// out, e.g. a bare reference to a union with several constructors.
    pub fn with_config(schema: &TlFullSchema, config: CodecConfig) -> Result<Self> {
        let entries = plan::compile(schema)?;

        let mut by_id = HashMap::with_capacity(entries.len());
        let mut by_name = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            by_id.insert(entry.id, i);
            match by_name.entry(entry.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
                Entry::Occupied(_) => {
                    log::warn!(
                        "[tl-codec] `{}` is both a class and a method; writing by name uses the first",
                        entry.name
                    );
                }
            }
        }

        log::debug!(
            "[tl-codec] dispatch tables built: {} readers, {} writers",
            by_id.len(),
            by_name.len(),
        );

        Ok(Self { entries, by_id, by_name, config })
    }

    /// The configuration this codec was built with.
    pub fn config(&self) -> CodecConfig {
        self.config
    }

    /// The compiled plan for an entry.
    pub fn entry_codec<'k>(&self, key: impl Into<EntryKey<'k>>) -> Option<&EntryCodec> {
        let idx = match key.into() {
            EntryKey::Name(name) => self.by_name.get(name),
            EntryKey::Id(id) => self.by_id.get(&id),
        };
        idx.map(|&i| &self.entries[i])
    }

    fn resolve(&self, key: EntryKey<'_>) -> Result<&EntryCodec> {
        self.entry_codec(key).ok_or_else(|| CodecError::UnknownEntry(key.to_string()))
    }

    /// Reader registered for a constructor id.
    pub fn lookup_reader_by_id(&self, id: u32) -> Option<&dyn Reader> {
        self.by_id.get(&id).map(|&i| &self.entries[i] as &dyn Reader)
    }

    /// Writer registered for an entry name.
    pub fn lookup_writer_by_name(&self, name: &str) -> Option<&dyn Writer> {
        self.by_name.get(name).map(|&i| &self.entries[i] as &dyn Writer)
    }

    /// Name of the entry with this constructor id.
    pub fn name_for_id(&self, id: u32) -> Option<&str> {
        self.by_id.get(&id).map(|&i| self.entries[i].name.as_str())
    }

    /// Appends the boxed encoding of entry `key` with `fields` to `buf`.
    ///
    /// The flags words are computed from which optional fields are present.
    /// On error `buf` is left exactly as it was.
    pub fn encode<'k>(&self, buf: &mut Vec<u8>, key: impl Into<EntryKey<'k>>, fields: &Fields) -> Result<()> {
        self.resolve(key.into())?.write(self, buf, fields, false)
    }

    /// Like [`Self::encode`] without the leading constructor id.
    pub fn encode_bare<'k>(&self, buf: &mut Vec<u8>, key: impl Into<EntryKey<'k>>, fields: &Fields) -> Result<()> {
        self.resolve(key.into())?.write(self, buf, fields, true)
    }

    /// Encodes an [`Object`], using its name to pick the entry.
    pub fn encode_object(&self, buf: &mut Vec<u8>, object: &Object) -> Result<()> {
        self.encode(buf, object.name.as_str(), &object.fields)
    }

    /// Convenience: encode `object` into a fresh buffer.
    pub fn to_bytes(&self, object: &Object) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode_object(&mut buf, object)?;
        Ok(buf)
    }

    /// Reads one boxed value of any type: an object, a `Vector`, a `Bool`,
    /// or a `gzip_packed` wrapper around one of those.
    ///
    /// On error the cursor is left where the call started.
    pub fn decode_any(&self, buf: &mut Cursor<'_>) -> Result<Value> {
        rewinding(buf, |buf| self.read_any(buf, 0))
    }

    /// Reads a boxed value that must be the entry `key`.
    pub fn decode_as<'k>(&self, buf: &mut Cursor<'_>, key: impl Into<EntryKey<'k>>) -> Result<Object> {
        let entry = self.resolve(key.into())?;
        rewinding(buf, |buf| {
            let found = u32::deserialize(buf)?;
            if found != entry.id {
                return Err(CodecError::UnexpectedConstructor { expected: entry.name.clone(), found });
            }
            entry.read_body(self, buf, 0)
        })
    }

    /// Reads the fields of entry `key` with no constructor id in front.
    pub fn decode_bare<'k>(&self, buf: &mut Cursor<'_>, key: impl Into<EntryKey<'k>>) -> Result<Object> {
        self.resolve(key.into())?.read(self, buf)
    }

    /// Reads the response to `method`, according to its return type.
    pub fn decode_result(&self, buf: &mut Cursor<'_>, method: &str) -> Result<Value> {
        let entry = self.resolve(EntryKey::Name(method))?;
        let wire = match (&entry.kind, &entry.returns) {
            (EntryKind::Method, Some(wire)) => wire,
            _ => return Err(CodecError::UnknownEntry(format!("method {method}"))),
        };
        rewinding(buf, |buf| self.read_wire(buf, wire, 0))
    }

    /// One nesting level down from `depth`.
    fn descend(&self, depth: usize) -> Result<usize> {
        if depth >= self.config.max_depth {
            return Err(CodecError::TooDeep { limit: self.config.max_depth });
        }
        Ok(depth + 1)
    }

    fn read_any(&self, buf: &mut Cursor<'_>, depth: usize) -> Result<Value> {
        let depth = self.descend(depth)?;
        let start = buf.pos();
        match u32::deserialize(buf)? {
            VECTOR_ID => self.read_items(buf, 4, |buf| self.read_any(buf, depth)),
            BOOL_TRUE_ID => Ok(Value::Bool(true)),
            BOOL_FALSE_ID => Ok(Value::Bool(false)),
            GZIP_PACKED_ID if self.config.inflate_gzip => {
                self.read_gzip(buf, depth, |inner, depth| self.read_any(inner, depth))
            }
            id => match self.by_id.get(&id) {
                Some(&i) => self.entries[i].read_body(self, buf, depth).map(Value::Object),
                None => {
                    buf.rewind(start);
                    Err(CodecError::UnknownConstructor { id })
                }
            },
        }
    }

    fn read_gzip<T>(
        &self,
        buf: &mut Cursor<'_>,
        depth: usize,
        read: impl FnOnce(&mut Cursor<'_>, usize) -> Result<T>,
    ) -> Result<T> {
        let depth = self.descend(depth)?;
        let packed = Vec::<u8>::deserialize(buf)?;
        let data = gz_inflate(&packed)?;
        log::trace!("[tl-codec] gzip_packed: {} -> {} bytes", packed.len(), data.len());
        read(&mut Cursor::from_slice(&data), depth)
    }

    /// Reads a vector count and `count` elements of at least `min_width`
    /// bytes each.
    fn read_items(
        &self,
        buf: &mut Cursor<'_>,
        min_width: usize,
        mut read: impl FnMut(&mut Cursor<'_>) -> Result<Value>,
    ) -> Result<Value> {
        let count = u32::deserialize(buf)? as usize;
        let remaining = buf.remaining();
        if min_width == 0 {
            let limit = self.config.max_zero_width_items;
            if count > limit {
                return Err(CodecError::TooManyItems { count, limit });
            }
        } else if count > remaining / min_width {
            return Err(CodecError::Truncated { needed: count.saturating_mul(min_width), remaining });
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(read(buf)?);
        }
        Ok(Value::Vector(items))
    }

    fn read_boxed(&self, buf: &mut Cursor<'_>, union: Option<&str>, depth: usize) -> Result<Value> {
        let id = u32::deserialize(buf)?;
        if id == GZIP_PACKED_ID && self.config.inflate_gzip {
            return self.read_gzip(buf, depth, |inner, depth| self.read_boxed(inner, union, depth));
        }
        let entry = match self.by_id.get(&id) {
            Some(&i) => &self.entries[i],
            None => return Err(CodecError::UnknownConstructor { id }),
        };
        if self.config.check_unions {
            if let Some(expected) = union {
                if entry.union.as_deref() != Some(expected) {
                    return Err(CodecError::UnexpectedConstructor { expected: expected.to_owned(), found: id });
                }
            }
        }
        entry.read_body(self, buf, depth).map(Value::Object)
    }

    fn read_wire(&self, buf: &mut Cursor<'_>, wire: &Wire, depth: usize) -> Result<Value> {
        let depth = self.descend(depth)?;
        Ok(match wire {
            Wire::Int => Value::Int(i32::deserialize(buf)?),
            Wire::Long => Value::Long(i64::deserialize(buf)?),
            Wire::Int128 => Value::Int128(<[u8; 16]>::deserialize(buf)?),
            Wire::Int256 => Value::Int256(<[u8; 32]>::deserialize(buf)?),
            Wire::Double => Value::Double(f64::deserialize(buf)?),
            Wire::String => Value::String(String::deserialize(buf)?),
            Wire::Bytes => Value::Bytes(Vec::<u8>::deserialize(buf)?),
            Wire::Bool => Value::Bool(bool::deserialize(buf)?),
            Wire::Boxed { union } => self.read_boxed(buf, union.as_deref(), depth)?,
            Wire::Bare { entry } => Value::Object(self.entries[*entry].read_body(self, buf, depth)?),
            Wire::Vector { elem, boxed } => {
                if *boxed {
                    match u32::deserialize(buf)? {
                        VECTOR_ID => {}
                        GZIP_PACKED_ID if self.config.inflate_gzip => {
                            return self.read_gzip(buf, depth, |inner, depth| self.read_wire(inner, wire, depth));
                        }
                        found => {
                            return Err(CodecError::UnexpectedConstructor { expected: "Vector".into(), found });
                        }
                    }
                }
                self.read_items(buf, elem.min_width(&self.entries), |buf| self.read_wire(buf, elem, depth))?
            }
            Wire::Generic => self.read_any(buf, depth)?,
        })
    }

    fn write_boxed(&self, buf: &mut Vec<u8>, object: &Object, union: Option<&str>) -> Result<()> {
        let entry = self.resolve(EntryKey::Name(&object.name))?;
        if self.config.check_unions {
            if let Some(expected) = union {
                if entry.union.as_deref() != Some(expected) {
                    return Err(CodecError::UnexpectedConstructor { expected: expected.to_owned(), found: entry.id });
                }
            }
        }
        entry.id.serialize(buf);
        entry.write_body(self, buf, &object.fields)
    }

    fn write_wire(&self, buf: &mut Vec<u8>, wire: &Wire, value: &Value, site: &Site<'_>) -> Result<()> {
        match (wire, value) {
            (Wire::Int, Value::Int(v)) => v.serialize(buf),
            (Wire::Long, Value::Long(v)) => v.serialize(buf),
            (Wire::Int128, Value::Int128(v)) => v.serialize(buf),
            (Wire::Int256, Value::Int256(v)) => v.serialize(buf),
            (Wire::Double, Value::Double(v)) => v.serialize(buf),
            (Wire::String, Value::String(s)) => check_len(s.as_bytes())?.serialize(buf),
            (Wire::Bytes, Value::Bytes(b)) => check_len(b)?.serialize(buf),
            (Wire::Bytes, Value::String(s)) => check_len(s.as_bytes())?.serialize(buf),
            (Wire::Bool, Value::Bool(b)) => b.serialize(buf),
            (Wire::Boxed { union }, Value::Object(obj)) => self.write_boxed(buf, obj, union.as_deref())?,
            (Wire::Bare { entry }, Value::Object(obj)) => {
                let entry = &self.entries[*entry];
                if obj.name != entry.name {
                    return Err(site.mismatch(value));
                }
                entry.write_body(self, buf, &obj.fields)?;
            }
            (Wire::Vector { elem, boxed }, Value::Vector(items)) => {
                if *boxed {
                    VECTOR_ID.serialize(buf);
                }
                (items.len() as i32).serialize(buf);
                for item in items {
                    self.write_wire(buf, elem, item, site)?;
                }
            }
            (Wire::Generic, Value::Object(obj)) => self.write_boxed(buf, obj, None)?,
            (Wire::Generic, Value::Raw(bytes)) => buf.extend_from_slice(bytes),
            (_, other) => return Err(site.mismatch(other)),
        }
        Ok(())
    }
}

impl EntryCodec {
    pub(crate) fn read_body(&self, codec: &Codec, buf: &mut Cursor<'_>, depth: usize) -> Result<Object> {
        let mut words = vec![0u32; self.flag_words];
        let mut fields = Fields::new();

        for field in &self.fields {
            match &field.kind {
                FieldKind::Flags { slot } => words[*slot] = u32::deserialize(buf)?,
                FieldKind::True { cond } => {
                    let set = cond.is_none_or(|c| c.is_set(&words));
                    fields.insert(field.name.clone(), Value::Bool(set));
                }
                FieldKind::Value { wire, cond } => {
                    if cond.is_some_and(|c| !c.is_set(&words)) {
                        continue;
                    }
                    fields.insert(field.name.clone(), codec.read_wire(buf, wire, depth)?);
                }
            }
        }

        Ok(Object { name: self.name.clone(), fields })
    }

    pub(crate) fn write_body(&self, codec: &Codec, buf: &mut Vec<u8>, fields: &Fields) -> Result<()> {
        // Validate and compute the flags words before writing anything.
        let mut words = vec![0u32; self.flag_words];
        for field in &self.fields {
            let value = fields.get(&field.name);
            match (&field.kind, value) {
                (FieldKind::True { cond: Some(cond) }, Some(Value::Bool(true))) => cond.set(&mut words),
                (FieldKind::True { .. }, None | Some(Value::Bool(_))) => {}
                (FieldKind::True { .. }, Some(other)) => {
                    return Err(Site { entry: &self.name, field }.mismatch(other));
                }
                (FieldKind::Value { cond: Some(cond), .. }, Some(_)) => cond.set(&mut words),
                (FieldKind::Value { cond: None, .. }, None) => {
                    return Err(CodecError::MissingField { entry: self.name.clone(), field: field.name.clone() });
                }
                _ => {}
            }
        }

        for field in &self.fields {
            match &field.kind {
                FieldKind::Flags { slot } => words[*slot].serialize(buf),
                FieldKind::True { .. } => {}
                FieldKind::Value { wire, .. } => {
                    if let Some(value) = fields.get(&field.name) {
                        codec.write_wire(buf, wire, value, &Site { entry: &self.name, field })?;
                    }
                }
            }
        }
        Ok(())
    }
}
