//! PNG overlay import.
//!
//! Overlays are finished images produced by external processing tools. The
//! caller supplies their bounds; an optional sidecar JSON supplies the
//! physical value range.

use raster_common::{
    GeoBounds, LayerKind, LayerSemantic, OverlaySidecar, RasterError, RasterLayer, RasterResult,
    SourceReader, ValueRange,
};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// How an overlay enters the active layer set.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOptions {
    /// Import under the configured preview name, replacing any earlier preview.
    pub preview: bool,
    /// Drop every active layer before adding this one.
    pub clear_existing: bool,
    /// Layer name; defaults to the file stem.
    pub layer_name: Option<String>,
    /// Value semantics; classified from the layer name when absent.
    pub semantic: Option<LayerSemantic>,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            preview: false,
            clear_existing: true,
            layer_name: None,
            semantic: None,
        }
    }
}

impl OverlayOptions {
    pub fn preview() -> Self {
        Self {
            preview: true,
            clear_existing: false,
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            layer_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn appending(mut self) -> Self {
        self.clear_existing = false;
        self
    }

    pub fn with_semantic(mut self, semantic: LayerSemantic) -> Self {
        self.semantic = Some(semantic);
        self
    }
}

/// A PNG with no pixel differing across channels is treated as one band.
fn is_gray(rgba: &[u8]) -> bool {
    rgba.chunks_exact(4).all(|px| px[0] == px[1] && px[1] == px[2])
}

/// Decode the PNG at `png_path` into a visible overlay layer.
///
/// The display buffer is the PNG itself, flipped so row 0 is the southern
/// edge. Normalized samples are the red channel for single-band overlays and
/// the channel mean otherwise.
pub fn decode_overlay(
    source: &dyn SourceReader,
    png_path: &Path,
    name: &str,
    bounds: GeoBounds,
    semantic: Option<LayerSemantic>,
    absolute_ranges: &HashMap<LayerSemantic, ValueRange>,
) -> RasterResult<RasterLayer> {
    if !bounds.is_valid() {
        return Err(RasterError::MissingGeoreference(format!(
            "{}: invalid overlay bounds {:?}",
            png_path.display(),
            bounds
        )));
    }

    let bytes = source.read(png_path)?;
    let image = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
        .map_err(|e| RasterError::malformed(format!("{}: {}", png_path.display(), e)))?
        .to_rgba8();
    let (width, height) = (image.width() as usize, image.height() as usize);
    let pixels = image.into_raw();

    let sidecar = OverlaySidecar::discover(source, png_path);
    let single_band = sidecar.map_or_else(|| is_gray(&pixels), |s| s.is_single_band);
    let semantic = semantic.unwrap_or_else(|| LayerSemantic::classify(name));
    let range = match sidecar {
        Some(s) => s.value_range().corrected(),
        None if semantic.is_absolute() => absolute_ranges
            .get(&semantic)
            .copied()
            .unwrap_or_else(|| ValueRange::new(-1.0, 1.0)),
        None => ValueRange::unit(),
    };

    let row_bytes = width * 4;
    let mut display = Vec::with_capacity(pixels.len());
    for row in pixels.chunks_exact(row_bytes.max(1)).rev() {
        display.extend_from_slice(row);
    }
    let samples = display
        .chunks_exact(4)
        .map(|px| {
            if single_band {
                px[0] as f32 / 255.0
            } else {
                (px[0] as f32 + px[1] as f32 + px[2] as f32) / (3.0 * 255.0)
            }
        })
        .collect();

    debug!(
        path = %png_path.display(),
        layer = name,
        width,
        height,
        single_band,
        sidecar = sidecar.is_some(),
        min = range.min,
        max = range.max,
        "Decoded overlay"
    );

    Ok(RasterLayer::new(
        name,
        width,
        height,
        samples,
        range,
        LayerKind::Overlay { single_band },
        semantic,
        display,
    )?
    .with_source(png_path)
    .with_bounds(Some(bounds))
    .with_visibility(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_detection() {
        assert!(is_gray(&[5, 5, 5, 255, 9, 9, 9, 0]));
        assert!(!is_gray(&[5, 5, 5, 255, 9, 8, 9, 255]));
    }

    #[test]
    fn test_default_options_clear() {
        let options = OverlayOptions::default();
        assert!(options.clear_existing);
        assert!(!options.preview);
        assert!(!OverlayOptions::preview().clear_existing);
        assert!(!OverlayOptions::named("x").appending().clear_existing);
    }
}
