//! Chunk decompression and byte-order normalization.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::TiffError;
use crate::pixel::BitDepth;

const MAX_RATIO_HINT: usize = 8;

/// Compression schemes the decoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    /// Adobe Deflate (8) or the older PKZIP code (32946).
    Deflate,
}

impl Compression {
    pub fn from_code(code: u16) -> Result<Self, TiffError> {
        match code {
            1 => Ok(Compression::None),
            8 | 32946 => Ok(Compression::Deflate),
            other => Err(TiffError::UnsupportedCompression(other)),
        }
    }

    /// Return the chunk's uncompressed bytes.
    ///
    /// Inflated output stops at `expected_len` bytes; shorter output is not padded.
    pub fn decompress(self, chunk: &[u8], expected_len: usize) -> Result<Vec<u8>, TiffError> {
        match self {
            Compression::None => Ok(chunk.to_vec()),
            Compression::Deflate => {
                let hint = expected_len.min(chunk.len().saturating_mul(MAX_RATIO_HINT));
                let mut out = Vec::with_capacity(hint);
                ZlibDecoder::new(chunk)
                    .take(expected_len as u64)
                    .read_to_end(&mut out)
                    .map_err(|e| TiffError::Decompress(e.to_string()))?;
                Ok(out)
            }
        }
    }
}

/// Swap big-endian samples in place so they read as little-endian.
pub fn swap_to_little_endian(buffer: &mut [u8], depth: BitDepth) {
    let width = depth.bytes();
    if width < 2 {
        return;
    }
    for sample in buffer.chunks_exact_mut(width) {
        sample.reverse();
    }
}
