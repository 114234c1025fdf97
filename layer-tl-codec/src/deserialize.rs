//! The [`Deserializable`] trait, the [`Cursor`] buffer, and primitive impls.

use crate::errors::CodecError;

/// Specialized `Result` for decoding.
pub type Result<T> = std::result::Result<T, CodecError>;

/// A zero-copy cursor over an in-memory byte slice.
///
/// Several values can be read back to back from one cursor; the position is
/// all the state a stream of concatenated objects needs.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned at the start of `buf`.
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize { self.pos }

    /// Remaining bytes.
    pub fn remaining(&self) -> usize { self.buf.len() - self.pos }

    /// `true` once every byte has been consumed.
    pub fn is_empty(&self) -> bool { self.remaining() == 0 }

    /// Moves back to an offset previously returned by [`Self::pos`].
    pub(crate) fn rewind(&mut self, pos: usize) {
        debug_assert!(pos <= self.buf.len());
        self.pos = pos;
    }

    fn truncated(&self, needed: usize) -> CodecError {
        CodecError::Truncated { needed, remaining: self.remaining() }
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        match self.buf.get(self.pos).copied() {
            Some(b) => { self.pos += 1; Ok(b) }
            None    => Err(self.truncated(1)),
        }
    }

    /// Read exactly `out.len()` bytes.
    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<()> {
        let slice = self.read_slice(out.len())?;
        out.copy_from_slice(slice);
        Ok(())
    }

    /// Borrow the next `len` bytes.
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.truncated(len));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Look at the next 4-byte word without consuming it.
    pub fn peek_u32(&self) -> Option<u32> {
        let bytes = self.buf.get(self.pos..self.pos + 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Consume all remaining bytes into `out`.
    pub fn read_to_end(&mut self, out: &mut Vec<u8>) -> usize {
        let slice = &self.buf[self.pos..];
        out.extend_from_slice(slice);
        self.pos = self.buf.len();
        slice.len()
    }
}

/// Deserialize a value from TL binary format.
pub trait Deserializable: Sized {
    /// Read `Self` from `buf`, advancing its position.
    fn deserialize(buf: &mut Cursor<'_>) -> Result<Self>;

    /// Convenience: deserialize from a byte slice.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::from_slice(bytes);
        Self::deserialize(&mut cursor)
    }
}

/// `boolTrue#997275b5` / `boolFalse#bc799737`.
impl Deserializable for bool {
    fn deserialize(buf: &mut Cursor<'_>) -> Result<Self> {
        match u32::deserialize(buf)? {
            crate::BOOL_TRUE_ID => Ok(true),
            crate::BOOL_FALSE_ID => Ok(false),
            found => Err(CodecError::UnexpectedConstructor { expected: "Bool".into(), found }),
        }
    }
}

macro_rules! le_int {
    ($($ty:ty),*) => {$(
        impl Deserializable for $ty {
            fn deserialize(buf: &mut Cursor<'_>) -> Result<Self> {
                let mut b = [0u8; size_of::<$ty>()];
                buf.read_exact(&mut b)?;
                Ok(<$ty>::from_le_bytes(b))
            }
        }
    )*};
}

le_int!(i32, u32, i64, f64);

impl Deserializable for [u8; 16] {
    fn deserialize(buf: &mut Cursor<'_>) -> Result<Self> {
        let mut b = [0u8; 16];
        buf.read_exact(&mut b)?;
        Ok(b)
    }
}

impl Deserializable for [u8; 32] {
    fn deserialize(buf: &mut Cursor<'_>) -> Result<Self> {
        let mut b = [0u8; 32];
        buf.read_exact(&mut b)?;
        Ok(b)
    }
}

/// Length-prefixed byte string, padded to a multiple of 4.
impl Deserializable for Vec<u8> {
    fn deserialize(buf: &mut Cursor<'_>) -> Result<Self> {
        let first = buf.read_byte()?;
        let (len, header) = if first != 0xfe {
            (first as usize, 1)
        } else {
            let a = buf.read_byte()? as usize;
            let b = buf.read_byte()? as usize;
            let c = buf.read_byte()? as usize;
            (a | (b << 8) | (c << 16), 4)
        };

        let data = buf.read_slice(len)?.to_vec();

        let padding = (4 - (header + len) % 4) % 4;
        buf.read_slice(padding)?;

        Ok(data)
    }
}

impl Deserializable for String {
    fn deserialize(buf: &mut Cursor<'_>) -> Result<Self> {
        let bytes = Vec::<u8>::deserialize(buf)?;
        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
    }
}
