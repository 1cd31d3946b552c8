//! Single-sample extraction from raw chunk bytes.
//!
//! Chunk bytes are little-endian by the time they reach this module; the
//! reader swaps big-endian files beforehand.

/// Bits per stored sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    /// Unsigned byte, scaled by 1/255.
    Eight,
    /// Unsigned little-endian u16, scaled by 1/65535.
    Sixteen,
    /// IEEE float, passed through unscaled.
    ThirtyTwo,
}

impl BitDepth {
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(BitDepth::Eight),
            16 => Some(BitDepth::Sixteen),
            32 => Some(BitDepth::ThirtyTwo),
            _ => None,
        }
    }

    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::ThirtyTwo => 32,
        }
    }

    /// Bytes per sample.
    pub fn bytes(self) -> usize {
        self.bits() as usize / 8
    }
}

/// Decode the sample at `sample_index` of `buffer`.
///
/// 8- and 16-bit samples come back in [0, 1]; 32-bit floats are returned
/// as stored. Offsets past `buffer_len` (or past the end of `buffer`) read
/// as 0 so a short chunk decodes as zero padding instead of failing.
pub fn decode_sample(buffer: &[u8], sample_index: usize, depth: BitDepth, buffer_len: usize) -> f32 {
    let limit = buffer_len.min(buffer.len());
    let width = depth.bytes();
    let offset = match sample_index.checked_mul(width) {
        Some(o) => o,
        None => return 0.0,
    };
    if offset >= limit || offset + width > limit {
        return 0.0;
    }

    let bytes = &buffer[offset..offset + width];
    match depth {
        BitDepth::Eight => bytes[0] as f32 / 255.0,
        BitDepth::Sixteen => u16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 65535.0,
        BitDepth::ThirtyTwo => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}
