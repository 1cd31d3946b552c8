//! TIFF header and Image File Directory parsing.
//!
//! Every tag value is resolved up front against the full file bytes, so the
//! rest of the crate works with typed values and never re-reads offsets.

use std::collections::BTreeMap;

use crate::error::TiffError;

/// Well-known TIFF tag IDs.
pub mod tags {
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const PLANAR_CONFIG: u16 = 284;
    pub const PREDICTOR: u16 = 317;
    pub const TILE_WIDTH: u16 = 322;
    pub const TILE_LENGTH: u16 = 323;
    pub const TILE_OFFSETS: u16 = 324;
    pub const TILE_BYTE_COUNTS: u16 = 325;
    pub const SAMPLE_FORMAT: u16 = 339;
    pub const MODEL_PIXEL_SCALE: u16 = 33550;
    pub const MODEL_TIEPOINT: u16 = 33922;
    pub const MODEL_TRANSFORMATION: u16 = 34264;
}

/// Byte order declared by the TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    fn u16(self, b: [u8; 2]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(b),
            ByteOrder::BigEndian => u16::from_be_bytes(b),
        }
    }

    fn u32(self, b: [u8; 4]) -> u32 {
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(b),
            ByteOrder::BigEndian => u32::from_be_bytes(b),
        }
    }

    fn u64(self, b: [u8; 8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(b),
            ByteOrder::BigEndian => u64::from_be_bytes(b),
        }
    }
}

/// Parsed 8-byte TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    pub byte_order: ByteOrder,
    pub first_ifd_offset: u32,
}

/// A resolved tag value.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Unsigned(Vec<u64>),
    Signed(Vec<i64>),
    Float(Vec<f64>),
    Ascii(String),
}

impl TagValue {
    /// Values as unsigned integers, if the tag is integral and non-negative.
    pub fn as_u64s(&self) -> Option<Vec<u64>> {
        match self {
            TagValue::Unsigned(v) => Some(v.clone()),
            TagValue::Signed(v) => v.iter().map(|&x| u64::try_from(x).ok()).collect(),
            _ => None,
        }
    }

    /// Values widened to f64.
    pub fn as_f64s(&self) -> Option<Vec<f64>> {
        match self {
            TagValue::Unsigned(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TagValue::Signed(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TagValue::Float(v) => Some(v.clone()),
            TagValue::Ascii(_) => None,
        }
    }

    pub fn first_u64(&self) -> Option<u64> {
        self.as_u64s().and_then(|v| v.first().copied())
    }
}

/// One parsed IFD.
#[derive(Debug, Clone, Default)]
pub struct Ifd {
    entries: BTreeMap<u16, TagValue>,
    pub next_ifd_offset: u32,
}

impl Ifd {
    pub fn get(&self, tag: u16) -> Option<&TagValue> {
        self.entries.get(&tag)
    }

    pub fn contains(&self, tag: u16) -> bool {
        self.entries.contains_key(&tag)
    }

    /// First value of an integral tag.
    pub fn first_u64(&self, tag: u16) -> Option<u64> {
        self.get(tag).and_then(TagValue::first_u64)
    }

    pub fn u64s(&self, tag: u16) -> Option<Vec<u64>> {
        self.get(tag).and_then(TagValue::as_u64s)
    }

    pub fn f64s(&self, tag: u16) -> Option<Vec<f64>> {
        self.get(tag).and_then(TagValue::as_f64s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse the TIFF header.
pub fn parse_header(data: &[u8]) -> Result<TiffHeader, TiffError> {
    if data.len() < 8 {
        return Err(TiffError::InvalidHeader("header too short".into()));
    }

    let byte_order = match (data[0], data[1]) {
        (b'I', b'I') => ByteOrder::LittleEndian,
        (b'M', b'M') => ByteOrder::BigEndian,
        _ => return Err(TiffError::InvalidHeader("invalid byte order marker".into())),
    };

    match byte_order.u16([data[2], data[3]]) {
        42 => {}
        43 => return Err(TiffError::BigTiff),
        magic => {
            return Err(TiffError::InvalidHeader(format!(
                "expected magic 42, got {}",
                magic
            )))
        }
    }

    Ok(TiffHeader {
        byte_order,
        first_ifd_offset: byte_order.u32([data[4], data[5], data[6], data[7]]),
    })
}

/// Size in bytes of one value of a TIFF field type.
fn type_size(type_id: u16) -> Option<usize> {
    match type_id {
        1 | 2 | 6 | 7 => Some(1),
        3 | 8 => Some(2),
        4 | 9 | 11 => Some(4),
        5 | 10 | 12 | 16 => Some(8),
        _ => None,
    }
}

fn slice<'a>(data: &'a [u8], offset: usize, len: usize, what: &str) -> Result<&'a [u8], TiffError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            TiffError::Truncated(format!(
                "{} needs bytes {}..{} of {}",
                what,
                offset,
                offset.saturating_add(len),
                data.len()
            ))
        })
}

fn decode_value(order: ByteOrder, type_id: u16, count: usize, raw: &[u8]) -> TagValue {
    let at2 = |i: usize| [raw[i], raw[i + 1]];
    let at4 = |i: usize| [raw[i], raw[i + 1], raw[i + 2], raw[i + 3]];
    let at8 = |i: usize| {
        let mut b = [0u8; 8];
        b.copy_from_slice(&raw[i..i + 8]);
        b
    };

    match type_id {
        1 | 7 => TagValue::Unsigned(raw[..count].iter().map(|&b| b as u64).collect()),
        2 => {
            let end = raw[..count].iter().position(|&b| b == 0).unwrap_or(count);
            TagValue::Ascii(String::from_utf8_lossy(&raw[..end]).into_owned())
        }
        3 => TagValue::Unsigned((0..count).map(|i| order.u16(at2(i * 2)) as u64).collect()),
        4 => TagValue::Unsigned((0..count).map(|i| order.u32(at4(i * 4)) as u64).collect()),
        16 => TagValue::Unsigned((0..count).map(|i| order.u64(at8(i * 8))).collect()),
        6 => TagValue::Signed(raw[..count].iter().map(|&b| b as i8 as i64).collect()),
        8 => TagValue::Signed((0..count).map(|i| order.u16(at2(i * 2)) as i16 as i64).collect()),
        9 => TagValue::Signed((0..count).map(|i| order.u32(at4(i * 4)) as i32 as i64).collect()),
        5 => TagValue::Float(
            (0..count)
                .map(|i| {
                    let num = order.u32(at4(i * 8)) as f64;
                    let den = order.u32(at4(i * 8 + 4)) as f64;
                    num / den
                })
                .collect(),
        ),
        10 => TagValue::Float(
            (0..count)
                .map(|i| {
                    let num = order.u32(at4(i * 8)) as i32 as f64;
                    let den = order.u32(at4(i * 8 + 4)) as i32 as f64;
                    num / den
                })
                .collect(),
        ),
        11 => TagValue::Float(
            (0..count)
                .map(|i| f32::from_bits(order.u32(at4(i * 4))) as f64)
                .collect(),
        ),
        _ => TagValue::Float(
            (0..count)
                .map(|i| f64::from_bits(order.u64(at8(i * 8))))
                .collect(),
        ),
    }
}

/// Parse the IFD at `offset`, resolving every tag value.
///
/// Entries with unknown field types are skipped.
pub fn parse_ifd(data: &[u8], order: ByteOrder, offset: usize) -> Result<Ifd, TiffError> {
    let count_bytes = slice(data, offset, 2, "IFD entry count")?;
    let entry_count = order.u16([count_bytes[0], count_bytes[1]]) as usize;
    let table = slice(data, offset + 2, entry_count * 12 + 4, "IFD entries")?;

    let mut entries = BTreeMap::new();
    for i in 0..entry_count {
        let e = &table[i * 12..i * 12 + 12];
        let tag = order.u16([e[0], e[1]]);
        let type_id = order.u16([e[2], e[3]]);
        let count = order.u32([e[4], e[5], e[6], e[7]]) as usize;

        let size = match type_size(type_id) {
            Some(s) => s,
            None => continue,
        };
        let total = size
            .checked_mul(count)
            .ok_or_else(|| TiffError::InvalidTag(format!("tag {} count overflows", tag)))?;

        let raw = if total <= 4 {
            &e[8..8 + total]
        } else {
            let value_offset = order.u32([e[8], e[9], e[10], e[11]]) as usize;
            slice(data, value_offset, total, &format!("tag {} value", tag))?
        };

        entries.insert(tag, decode_value(order, type_id, count, raw));
    }

    let next = &table[entry_count * 12..entry_count * 12 + 4];
    Ok(Ifd {
        entries,
        next_ifd_offset: order.u32([next[0], next[1], next[2], next[3]]),
    })
}
