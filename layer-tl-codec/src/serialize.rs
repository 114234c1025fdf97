//! The [`Serializable`] trait and its implementations for primitive TL types.
//!
//! Encoding follows the [MTProto Binary Serialization] rules.
//!
//! [MTProto Binary Serialization]: https://core.telegram.org/mtproto/serialize

/// Serialize `self` into TL binary format.
pub trait Serializable {
    /// Appends the serialized form of `self` to `buf`.
    fn serialize(&self, buf: &mut impl Extend<u8>);

    /// Convenience: allocate a fresh `Vec<u8>` and serialize into it.
    fn to_bytes(&self) -> Vec<u8> {
        let mut v = Vec::new();
        self.serialize(&mut v);
        v
    }
}

/// `true`  → `boolTrue#997275b5`
/// `false` → `boolFalse#bc799737`
impl Serializable for bool {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let id = if *self { crate::BOOL_TRUE_ID } else { crate::BOOL_FALSE_ID };
        id.serialize(buf);
    }
}

macro_rules! le_int {
    ($($ty:ty),*) => {$(
        impl Serializable for $ty {
            fn serialize(&self, buf: &mut impl Extend<u8>) {
                buf.extend(self.to_le_bytes());
            }
        }
    )*};
}

le_int!(i32, u32, i64, f64);

impl<const N: usize> Serializable for [u8; N] {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        buf.extend(self.iter().copied());
    }
}

/// Longest `string`/`bytes` value the 3-byte length header can describe.
pub const MAX_BYTES_LEN: usize = (1 << 24) - 1;

/// TL string encoding: a length-prefixed, 4-byte aligned byte string.
///
/// * If `len < 254`: `[len as u8][data][0-padding to align to 4 bytes]`
/// * Otherwise: `[0xfe][len as 3 LE bytes][data][0-padding]`
///
/// Lengths above [`MAX_BYTES_LEN`] cannot be represented; callers check
/// first (the codec returns [`crate::CodecError::BytesTooLong`]).
impl Serializable for [u8] {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        let len = self.len();
        debug_assert!(len <= MAX_BYTES_LEN, "TL bytes length {len} overflows the 3-byte header");
        let header_len = if len < 254 {
            buf.extend([len as u8]);
            1
        } else {
            buf.extend([
                0xfe,
                (len & 0xff) as u8,
                ((len >> 8) & 0xff) as u8,
                ((len >> 16) & 0xff) as u8,
            ]);
            4
        };

        let padding = (4 - (header_len + len) % 4) % 4;

        buf.extend(self.iter().copied());
        buf.extend(std::iter::repeat_n(0u8, padding));
    }
}

impl Serializable for str {
    fn serialize(&self, buf: &mut impl Extend<u8>) {
        self.as_bytes().serialize(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_padding() {
        assert_eq!("A".to_bytes(), [0x01, 0x41, 0x00, 0x00]);
        assert_eq!("abc".to_bytes(), [0x03, b'a', b'b', b'c']);
        assert_eq!("".to_bytes(), [0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn long_header_switch_at_254() {
        let short = [7u8; 253].to_vec();
        assert_eq!(short.as_slice().to_bytes()[0], 253);

        let long = [7u8; 254].to_vec();
        let bytes = long.as_slice().to_bytes();
        assert_eq!(&bytes[..4], [0xfe, 254, 0, 0]);
        assert_eq!(bytes.len(), 4 + 256);
    }
}
