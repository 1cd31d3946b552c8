//! Error types for raster loading and layer operations.

use thiserror::Error;

/// Result type alias using RasterError.
pub type RasterResult<T> = Result<T, RasterError>;

/// Primary error type for raster decoding and layer management.
///
/// Decode failures are local to one source path: they are returned to the
/// caller and never leave partial state in a cache.
#[derive(Debug, Error)]
pub enum RasterError {
    // === Source Errors ===
    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    // === Decode Errors ===
    #[error("Malformed raster: {0}")]
    MalformedRaster(String),

    #[error("Unsupported raster format: {0}")]
    UnsupportedFormat(String),

    #[error("Raster has no georeference: {0}")]
    MissingGeoreference(String),

    // === Layer Errors ===
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Layer already exists: {0}")]
    DuplicateLayer(String),

    #[error("Gradient not found: {0}")]
    GradientNotFound(String),

    #[error("Invalid gradient: {0}")]
    InvalidGradient(String),

    // === Infrastructure Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Encoding failed: {0}")]
    EncodeError(String),
}

impl RasterError {
    /// Create a MalformedRaster error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRaster(msg.into())
    }

    /// Create an UnsupportedFormat error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Create a LayerNotFound error.
    pub fn layer_not_found(name: impl Into<String>) -> Self {
        Self::LayerNotFound(name.into())
    }

    /// True for errors caused by the content of a file rather than its absence.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            RasterError::MalformedRaster(_) | RasterError::UnsupportedFormat(_)
        )
    }
}

impl From<std::io::Error> for RasterError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => RasterError::NotFound(err.to_string()),
            _ => RasterError::Io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RasterError {
    fn from(err: serde_json::Error) -> Self {
        RasterError::Json(err.to_string())
    }
}
