//! Raster layer model: decoded samples, value range, and display buffer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::bounds::GeoBounds;
use crate::error::{RasterError, RasterResult};

/// Spans below this are treated as degenerate and replaced by a unit span.
pub const RANGE_EPSILON: f32 = 1e-4;

/// Clamp to [0, 1]; NaN maps to 0.
pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Value range in original physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// The range [0, 1].
    pub fn unit() -> Self {
        Self::new(0.0, 1.0)
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Span below [`RANGE_EPSILON`], inverted, or non-finite.
    pub fn is_degenerate(&self) -> bool {
        !(self.span() >= RANGE_EPSILON) || !self.min.is_finite() || !self.max.is_finite()
    }

    /// Divisor used for normalization: the span, or 1 when degenerate.
    pub fn normalizing_span(&self) -> f32 {
        if self.is_degenerate() {
            1.0
        } else {
            self.span()
        }
    }

    /// Map a raw sample into [0, 1].
    pub fn normalize(&self, raw: f32) -> f32 {
        let min = if self.min.is_finite() { self.min } else { 0.0 };
        clamp01((raw - min) / self.normalizing_span())
    }

    /// Recover the physical value of a normalized sample.
    pub fn denormalize(&self, normalized: f32) -> f32 {
        normalized * (self.max - self.min) + self.min
    }

    /// Same range, with a degenerate span widened to `[min, min + 1]`.
    pub fn corrected(&self) -> Self {
        if !self.is_degenerate() {
            return *self;
        }
        let min = if self.min.is_finite() { self.min } else { 0.0 };
        Self::new(min, min + 1.0)
    }

    /// Use `fallback` when this range is degenerate.
    pub fn or_if_degenerate(&self, fallback: ValueRange) -> Self {
        if self.is_degenerate() {
            fallback
        } else {
            *self
        }
    }
}

/// What a layer was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerKind {
    /// One band of a decoded raster.
    Band { index: usize },
    /// RGB composite of the first three bands.
    Composite,
    /// Externally produced PNG placed with supplied bounds.
    Overlay { single_band: bool },
}

/// Physical meaning of a layer's values, fixed when the layer is created.
///
/// Normalized-difference index families are colored in an absolute domain
/// (a fixed physical interval); everything else is colored relative to the
/// layer's own range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSemantic {
    /// Plain band values (reflectance, radiance, digital numbers).
    Reflectance,
    /// NDVI, GNDVI, NGRDI, SAVI, MSAVI, EVI, ARVI.
    Vegetation,
    /// NDWI, MNDWI.
    Water,
    /// NDTI.
    Turbidity,
    /// NDBI.
    BuiltUp,
    /// Unbounded ratio indices: RVI, TVI, CLGREEN.
    Ratio,
}

const NAME_TOKENS: &[(&str, LayerSemantic)] = &[
    ("NDWI", LayerSemantic::Water),
    ("MNDWI", LayerSemantic::Water),
    ("NDTI", LayerSemantic::Turbidity),
    ("NDBI", LayerSemantic::BuiltUp),
    ("NDVI", LayerSemantic::Vegetation),
    ("GNDVI", LayerSemantic::Vegetation),
    ("NGRDI", LayerSemantic::Vegetation),
    ("SAVI", LayerSemantic::Vegetation),
    ("MSAVI", LayerSemantic::Vegetation),
    ("EVI", LayerSemantic::Vegetation),
    ("ARVI", LayerSemantic::Vegetation),
    ("RVI", LayerSemantic::Ratio),
    ("TVI", LayerSemantic::Ratio),
    ("CLGREEN", LayerSemantic::Ratio),
];

impl LayerSemantic {
    /// Classify a layer from its name, matching whole tokens of index names.
    ///
    /// "Field NDVI_2024" is vegetation; "Band 3" is reflectance.
    pub fn classify(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        upper
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .find_map(|token| {
                NAME_TOKENS
                    .iter()
                    .find(|(index, _)| *index == token)
                    .map(|(_, semantic)| *semantic)
            })
            .unwrap_or(LayerSemantic::Reflectance)
    }

    /// Whether coloring uses a fixed physical interval.
    pub fn is_absolute(&self) -> bool {
        matches!(
            self,
            LayerSemantic::Vegetation
                | LayerSemantic::Water
                | LayerSemantic::Turbidity
                | LayerSemantic::BuiltUp
        )
    }

    /// Stable key used in configuration maps.
    pub fn key(&self) -> &'static str {
        match self {
            LayerSemantic::Reflectance => "reflectance",
            LayerSemantic::Vegetation => "vegetation",
            LayerSemantic::Water => "water",
            LayerSemantic::Turbidity => "turbidity",
            LayerSemantic::BuiltUp => "built_up",
            LayerSemantic::Ratio => "ratio",
        }
    }
}

/// A decoded raster layer ready for display.
///
/// `normalized_samples` holds one value in [0, 1] per pixel, row 0 at the
/// bottom of the geographic extent. The display buffer is RGBA8 in the same
/// order and is swapped wholesale on re-coloring, so a reader holding the
/// previous `Arc` keeps a consistent image.
#[derive(Debug, Clone)]
pub struct RasterLayer {
    pub name: String,
    pub source_path: Option<PathBuf>,
    pub width: usize,
    pub height: usize,
    pub value_range: ValueRange,
    pub kind: LayerKind,
    pub semantic: LayerSemantic,
    /// Name of a preset in the gradient registry; `None` renders grayscale.
    pub gradient: Option<String>,
    pub is_visible: bool,
    pub bounds: Option<GeoBounds>,
    normalized_samples: Arc<[f32]>,
    display: Arc<Vec<u8>>,
}

impl RasterLayer {
    /// Assemble a layer, checking buffer sizes against the dimensions.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        width: usize,
        height: usize,
        normalized_samples: Vec<f32>,
        value_range: ValueRange,
        kind: LayerKind,
        semantic: LayerSemantic,
        display: Vec<u8>,
    ) -> RasterResult<Self> {
        let name = name.into();
        let pixels = width
            .checked_mul(height)
            .ok_or_else(|| RasterError::malformed(format!("{}: dimensions overflow", name)))?;
        if normalized_samples.len() != pixels {
            return Err(RasterError::malformed(format!(
                "{}: {} samples for {}x{} pixels",
                name,
                normalized_samples.len(),
                width,
                height
            )));
        }
        if display.len() != pixels * 4 {
            return Err(RasterError::malformed(format!(
                "{}: display buffer is {} bytes, expected {}",
                name,
                display.len(),
                pixels * 4
            )));
        }
        Ok(Self {
            name,
            source_path: None,
            width,
            height,
            value_range,
            kind,
            semantic,
            gradient: None,
            is_visible: false,
            bounds: None,
            normalized_samples: normalized_samples.into(),
            display: Arc::new(display),
        })
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn with_bounds(mut self, bounds: Option<GeoBounds>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    /// Individual bands and single-band overlays take gradients; composites do not.
    pub fn is_single_band(&self) -> bool {
        match self.kind {
            LayerKind::Band { .. } => true,
            LayerKind::Composite => false,
            LayerKind::Overlay { single_band } => single_band,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn normalized_samples(&self) -> &[f32] {
        &self.normalized_samples
    }

    /// Current RGBA8 display buffer.
    pub fn display(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.display)
    }

    /// Install a freshly rendered display buffer.
    pub fn replace_display(&mut self, pixels: Vec<u8>) -> RasterResult<()> {
        if pixels.len() != self.pixel_count() * 4 {
            return Err(RasterError::malformed(format!(
                "{}: display buffer is {} bytes, expected {}",
                self.name,
                pixels.len(),
                self.pixel_count() * 4
            )));
        }
        self.display = Arc::new(pixels);
        Ok(())
    }

    /// Normalized sample at display coordinates (row 0 at the bottom).
    pub fn sample_at(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.normalized_samples.get(y * self.width + x).copied()
    }

    /// Physical value at display coordinates.
    pub fn physical_at(&self, x: usize, y: usize) -> Option<f32> {
        self.sample_at(x, y).map(|v| self.value_range.denormalize(v))
    }

    /// Bytes held by sample and display buffers.
    pub fn memory_bytes(&self) -> usize {
        self.normalized_samples.len() * std::mem::size_of::<f32>() + self.display.len()
    }
}
