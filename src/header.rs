//! The 13-byte LZMA-Alone container header.
//!
//! | offset | length | meaning                                             |
//! |--------|--------|-----------------------------------------------------|
//! | 0      | 1      | `lc + lp * 9 + pb * 45`                             |
//! | 1      | 4      | dictionary size, little-endian, at most 2^28        |
//! | 5      | 8      | uncompressed size, little-endian, all `0xFF` if unknown |

use crate::{Error, Result};

/// Size of the serialized header in bytes.
pub const HEADER_SIZE: usize = 13;

/// Size of the LZMA properties prefix (properties byte and dictionary size).
pub const PROPERTIES_SIZE: usize = 5;

/// Largest dictionary size a header may declare (256 MiB).
pub const MAX_DICT_SIZE: u32 = 1 << 28;

const PROPERTIES_MAX: u8 = 9 * 5 * 5;
const STREAMED_SENTINEL: [u8; 8] = [0xFF; 8];

/// Decoded LZMA-Alone header.
///
/// `Header::default()` is the all-zero header every run starts from. Two
/// streamed headers compare equal whatever their `uncompressed_size` holds.
#[derive(Clone, Copy, Debug, Default)]
pub struct Header {
    /// Position bits, `0..=4`.
    pub pb: u8,
    /// Literal position bits, `0..=4`.
    pub lp: u8,
    /// Literal context bits, `0..=8`.
    pub lc: u8,
    /// Whether the uncompressed size was unknown when the stream was written.
    pub is_streamed: bool,
    /// Uncompressed size; only meaningful when `is_streamed` is false.
    pub uncompressed_size: u64,
    /// Dictionary size in bytes.
    pub dict_size: u32,
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        self.pb == other.pb
            && self.lp == other.lp
            && self.lc == other.lc
            && self.dict_size == other.dict_size
            && self.is_streamed == other.is_streamed
            && (self.is_streamed || self.uncompressed_size == other.uncompressed_size)
    }
}

impl Eq for Header {}

impl Header {
    /// The declared uncompressed size, or `None` for a streamed header.
    pub fn uncompressed_size(&self) -> Option<u64> {
        (!self.is_streamed).then_some(self.uncompressed_size)
    }

    /// The properties byte packing `lc`, `lp` and `pb`.
    pub fn properties_byte(&self) -> u8 {
        self.lc
            .wrapping_add(self.lp.wrapping_mul(9))
            .wrapping_add(self.pb.wrapping_mul(45))
    }

    /// The properties byte followed by the little-endian dictionary size.
    pub fn properties(&self) -> [u8; PROPERTIES_SIZE] {
        let mut props = [0; PROPERTIES_SIZE];
        props[0] = self.properties_byte();
        props[1..].copy_from_slice(&self.dict_size.to_le_bytes());
        props
    }

    /// Serialize into the 13-byte wire form.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0; HEADER_SIZE];
        buf[..PROPERTIES_SIZE].copy_from_slice(&self.properties());
        if self.is_streamed {
            buf[PROPERTIES_SIZE..].copy_from_slice(&STREAMED_SENTINEL);
        } else {
            buf[PROPERTIES_SIZE..].copy_from_slice(&self.uncompressed_size.to_le_bytes());
        }
        buf
    }

    /// Parse the 13-byte wire form.
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        let mut header = Self::default();

        let props = buf[0];
        if props > PROPERTIES_MAX {
            return Err(Error::CorruptHeader("properties byte out of range"));
        }
        header.pb = props / 45;
        header.lp = (props % 45) / 9;
        header.lc = props % 9;

        let mut dict = [0; 4];
        dict.copy_from_slice(&buf[1..PROPERTIES_SIZE]);
        header.dict_size = u32::from_le_bytes(dict);
        if header.dict_size > MAX_DICT_SIZE {
            return Err(Error::CorruptHeader("dictionary size above 256 MiB"));
        }

        let mut size = [0; 8];
        size.copy_from_slice(&buf[PROPERTIES_SIZE..]);
        header.is_streamed = size == STREAMED_SENTINEL;
        header.uncompressed_size = u64::from_le_bytes(size);

        Ok(header)
    }

    /// Parse a header from a slice that must be exactly [`HEADER_SIZE`] bytes.
    pub fn decode_slice(buf: &[u8]) -> Result<Self> {
        let buf: &[u8; HEADER_SIZE] = buf
            .try_into()
            .map_err(|_| Error::CorruptHeader("header must be exactly 13 bytes"))?;
        Self::decode(buf)
    }
}
