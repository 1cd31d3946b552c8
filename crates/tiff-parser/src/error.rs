//! Error types for TIFF parsing.

use raster_common::RasterError;
use thiserror::Error;

/// Structural problems found while reading a TIFF.
#[derive(Debug, Error)]
pub enum TiffError {
    #[error("not a TIFF file: {0}")]
    InvalidHeader(String),

    #[error("BigTIFF is not supported")]
    BigTiff,

    #[error("truncated data: {0}")]
    Truncated(String),

    #[error("missing required tag {0}")]
    MissingTag(&'static str),

    #[error("invalid tag value: {0}")]
    InvalidTag(String),

    #[error("unsupported compression: {0}")]
    UnsupportedCompression(u16),

    #[error("unsupported predictor: {0}")]
    UnsupportedPredictor(u16),

    #[error("unsupported sample layout: bits_per_sample={bits}, sample_format={format}")]
    UnsupportedSampleLayout { bits: u16, format: u16 },

    #[error("decompression failed: {0}")]
    Decompress(String),
}

impl From<TiffError> for RasterError {
    fn from(err: TiffError) -> Self {
        match err {
            TiffError::BigTiff
            | TiffError::UnsupportedCompression(_)
            | TiffError::UnsupportedPredictor(_)
            | TiffError::UnsupportedSampleLayout { .. } => {
                RasterError::UnsupportedFormat(err.to_string())
            }
            _ => RasterError::MalformedRaster(err.to_string()),
        }
    }
}
