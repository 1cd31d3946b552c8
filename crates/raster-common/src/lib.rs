//! Common types shared by the raster decoding, color-mapping and layer crates.

pub mod bounds;
pub mod error;
pub mod layer;
pub mod ramp;
pub mod sidecar;
pub mod source;

pub use bounds::GeoBounds;
pub use error::{RasterError, RasterResult};
pub use layer::{clamp01, LayerKind, LayerSemantic, RasterLayer, ValueRange, RANGE_EPSILON};
pub use ramp::{Color, ColorRamp, ColorStop};
pub use sidecar::OverlaySidecar;
pub use source::{FsSourceReader, MemorySourceReader, SourceReader};
