//! Layer construction from decoded band buffers.
//!
//! Raster files store row 0 at the top; layers store row 0 at the bottom of
//! the geographic extent, so every builder flips rows on the way in.

use std::path::Path;

use raster_common::{
    clamp01, GeoBounds, LayerKind, LayerSemantic, RasterError, RasterLayer, RasterResult, ValueRange,
};
use renderer::{composite_display, grayscale_display};
use tiff_parser::DecodedRaster;
use tracing::debug;

use crate::naming::LayerNaming;

/// Copy `src` with its rows reversed, applying `f` to each value.
fn flip_rows(src: &[f32], width: usize, height: usize, f: impl Fn(f32) -> f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        let row = (height - 1 - y) * width;
        out.extend(src[row..row + width].iter().map(|&v| f(v)));
    }
    out
}

fn check_len(name: &str, samples: &[f32], width: usize, height: usize) -> RasterResult<()> {
    if samples.len() != width * height {
        return Err(RasterError::malformed(format!(
            "{}: {} samples for {}x{} raster",
            name,
            samples.len(),
            width,
            height
        )));
    }
    Ok(())
}

/// Build a grayscale single-band layer from raw samples in file order.
///
/// A range narrower than the degeneracy threshold normalizes with a unit
/// span, giving a flat image instead of a division by zero.
pub fn build_band_layer(
    samples: &[f32],
    width: usize,
    height: usize,
    name: &str,
    range: ValueRange,
    band_index: usize,
) -> RasterResult<RasterLayer> {
    check_len(name, samples, width, height)?;

    let normalized = flip_rows(samples, width, height, |raw| range.normalize(raw));
    let display = grayscale_display(&normalized);
    RasterLayer::new(
        name,
        width,
        height,
        normalized,
        range.corrected(),
        LayerKind::Band { index: band_index },
        LayerSemantic::classify(name),
        display,
    )
}

/// Build an RGB composite from three bands, each normalized by its own range.
///
/// The composite's normalized samples are the per-pixel channel mean.
pub fn build_composite(
    bands: [&[f32]; 3],
    width: usize,
    height: usize,
    name: &str,
    ranges: [ValueRange; 3],
) -> RasterResult<RasterLayer> {
    for band in bands {
        check_len(name, band, width, height)?;
    }

    let [r, g, b] = [0, 1, 2].map(|c| flip_rows(bands[c], width, height, |raw| ranges[c].normalize(raw)));
    let display = composite_display(&r, &g, &b);
    let mean = r
        .iter()
        .zip(&g)
        .zip(&b)
        .map(|((r, g), b)| clamp01((r + g + b) / 3.0))
        .collect();

    RasterLayer::new(
        name,
        width,
        height,
        mean,
        ValueRange::unit(),
        LayerKind::Composite,
        LayerSemantic::Reflectance,
        display,
    )
}

/// Builds the full layer set of a decoded file.
#[derive(Debug, Clone, Default)]
pub struct LayerFactory {
    naming: LayerNaming,
}

impl LayerFactory {
    pub fn new(naming: LayerNaming) -> Self {
        Self { naming }
    }

    pub fn naming(&self) -> &LayerNaming {
        &self.naming
    }

    /// One layer per band, plus an RGB composite when there are three or more.
    ///
    /// Requires per-band ranges, so `decoded` must come from a range-tracking read.
    pub fn build_all(&self, decoded: &DecodedRaster, source: &Path) -> RasterResult<Vec<RasterLayer>> {
        self.build_all_with(decoded, source, None)
    }

    /// [`build_all`](Self::build_all) with band semantics forced to `semantic`
    /// instead of classified from each band's name.
    pub fn build_all_with(
        &self,
        decoded: &DecodedRaster,
        source: &Path,
        semantic: Option<LayerSemantic>,
    ) -> RasterResult<Vec<RasterLayer>> {
        let (width, height) = (decoded.info.width as usize, decoded.info.height as usize);
        let ranges = match &decoded.band_ranges {
            Some(r) if r.len() == decoded.bands.len() => r,
            _ => {
                return Err(RasterError::malformed(format!(
                    "{}: no value range for {} bands",
                    source.display(),
                    decoded.bands.len()
                )))
            }
        };
        let bounds: Option<GeoBounds> = decoded.bounds();
        let naming = self.naming.for_source(source);

        let mut layers = Vec::with_capacity(decoded.bands.len() + 1);
        for (i, band) in decoded.bands.iter().enumerate() {
            let mut layer = build_band_layer(band, width, height, &naming.band(i), ranges[i], i)?;
            if let Some(semantic) = semantic {
                layer.semantic = semantic;
            }
            layers.push(layer.with_source(source).with_bounds(bounds));
        }

        if decoded.bands.len() >= 3 {
            let composite = build_composite(
                [&decoded.bands[0], &decoded.bands[1], &decoded.bands[2]],
                width,
                height,
                &naming.composite(),
                [ranges[0], ranges[1], ranges[2]],
            )?;
            layers.push(composite.with_source(source).with_bounds(bounds));
        }

        debug!(
            path = %source.display(),
            layers = layers.len(),
            prefix = %naming.prefix,
            georeferenced = bounds.is_some(),
            "Built layers"
        );
        Ok(layers)
    }
}
