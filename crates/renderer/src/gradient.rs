//! Value-to-color mapping for raster layers.
//!
//! Every layer keeps its normalized samples; the display buffer is derived
//! from them and can be rebuilt with a different gradient at any time.
//! Two coloring domains exist:
//!
//! - **Relative**: `t` is the normalized sample itself, so the ramp spans the
//!   layer's own min/max.
//! - **Absolute**: the sample is mapped back to its physical value and then
//!   placed in a fixed interval (for example `[-1, 1]` for normalized
//!   difference indices), so the same index value always gets the same color.

use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use raster_common::{clamp01, Color, ColorRamp, LayerSemantic, RasterError, RasterLayer, RasterResult, ValueRange};

use crate::style::GradientRegistry;

/// Minimum pixels before color evaluation is spread across threads.
const PARALLEL_THRESHOLD: usize = 4096;

/// Pixels per parallel work item.
const PIXELS_PER_CHUNK: usize = 1024;

/// Interval used for index families with no configured range.
pub const DEFAULT_ABSOLUTE_RANGE: ValueRange = ValueRange { min: -1.0, max: 1.0 };

/// Where `t` comes from when evaluating a ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorDomain {
    Relative,
    Absolute(ValueRange),
}

impl ColorDomain {
    /// Ramp position for a normalized sample of a layer with `layer_range`.
    #[inline]
    pub fn position(&self, sample: f32, layer_range: ValueRange) -> f32 {
        match self {
            ColorDomain::Relative => clamp01(sample),
            ColorDomain::Absolute(interval) => {
                let range = layer_range.or_if_degenerate(*interval);
                let physical = range.denormalize(sample);
                clamp01((physical - interval.min) / interval.normalizing_span())
            }
        }
    }
}

/// Renders display buffers from normalized samples.
#[derive(Debug, Clone)]
pub struct ColorMapper {
    registry: Arc<GradientRegistry>,
    absolute_ranges: HashMap<LayerSemantic, ValueRange>,
}

impl ColorMapper {
    pub fn new(registry: Arc<GradientRegistry>) -> Self {
        Self {
            registry,
            absolute_ranges: HashMap::new(),
        }
    }

    /// Override the fixed interval of one index family.
    pub fn with_absolute_range(mut self, semantic: LayerSemantic, range: ValueRange) -> Self {
        self.absolute_ranges.insert(semantic, range);
        self
    }

    pub fn with_absolute_ranges(mut self, ranges: impl IntoIterator<Item = (LayerSemantic, ValueRange)>) -> Self {
        self.absolute_ranges.extend(ranges);
        self
    }

    pub fn registry(&self) -> &GradientRegistry {
        &self.registry
    }

    /// Coloring domain for a semantic.
    pub fn domain_for(&self, semantic: LayerSemantic) -> ColorDomain {
        if !semantic.is_absolute() {
            return ColorDomain::Relative;
        }
        let interval = self
            .absolute_ranges
            .get(&semantic)
            .copied()
            .unwrap_or(DEFAULT_ABSOLUTE_RANGE);
        ColorDomain::Absolute(interval.or_if_degenerate(DEFAULT_ABSOLUTE_RANGE))
    }

    /// Render `layer` with `ramp` into a fresh RGBA buffer.
    ///
    /// `None` renders the normalized samples as gray. Alpha is always opaque.
    pub fn render(&self, layer: &RasterLayer, ramp: Option<&ColorRamp>) -> Vec<u8> {
        let samples = layer.normalized_samples();
        match ramp {
            None => grayscale_display(samples),
            Some(ramp) => {
                let domain = self.domain_for(layer.semantic);
                let range = layer.value_range.corrected_for(domain);
                fill_rgba(samples, |s| ramp.evaluate(domain.position(s, range)).with_alpha(255))
            }
        }
    }

    /// Recolor a single-band layer with the named gradient, or grayscale for `None`.
    ///
    /// Only the display buffer and the gradient name change.
    pub fn apply_gradient(&self, layer: &mut RasterLayer, gradient: Option<&str>) -> RasterResult<()> {
        if !layer.is_single_band() {
            return Err(RasterError::InvalidGradient(format!(
                "{} is a multi-channel layer and takes no gradient",
                layer.name
            )));
        }
        let ramp = gradient.map(|name| self.registry.require(name)).transpose()?;
        let pixels = self.render(layer, ramp);
        layer.replace_display(pixels)?;
        layer.gradient = gradient.map(str::to_string);

        debug!(
            layer = %layer.name,
            gradient = gradient.unwrap_or("grayscale"),
            domain = ?self.domain_for(layer.semantic),
            "Applied gradient"
        );
        Ok(())
    }
}

/// Degenerate ranges are widened the way the domain expects.
trait DomainRange {
    fn corrected_for(&self, domain: ColorDomain) -> ValueRange;
}

impl DomainRange for ValueRange {
    fn corrected_for(&self, domain: ColorDomain) -> ValueRange {
        match domain {
            ColorDomain::Relative => self.corrected(),
            ColorDomain::Absolute(interval) => self.or_if_degenerate(interval),
        }
    }
}

/// Evaluate `color_of` for every sample into an RGBA8 buffer.
fn fill_rgba<F>(samples: &[f32], color_of: F) -> Vec<u8>
where
    F: Fn(f32) -> Color + Sync,
{
    let mut pixels = vec![0u8; samples.len() * 4];
    let paint = |out: &mut [u8], src: &[f32]| {
        for (px, &s) in out.chunks_exact_mut(4).zip(src) {
            px.copy_from_slice(&color_of(s).to_array());
        }
    };

    if samples.len() >= PARALLEL_THRESHOLD {
        pixels
            .par_chunks_mut(PIXELS_PER_CHUNK * 4)
            .zip(samples.par_chunks(PIXELS_PER_CHUNK))
            .for_each(|(out, src)| paint(out, src));
    } else {
        paint(&mut pixels, samples);
    }
    pixels
}

/// Opaque gray pixels from normalized samples.
pub fn grayscale_display(samples: &[f32]) -> Vec<u8> {
    fill_rgba(samples, Color::gray)
}

/// Opaque RGB pixels from three normalized channels.
pub fn composite_display(red: &[f32], green: &[f32], blue: &[f32]) -> Vec<u8> {
    let n = red.len().min(green.len()).min(blue.len());
    let mut pixels = Vec::with_capacity(n * 4);
    for i in 0..n {
        pixels.extend_from_slice(&Color::from_unit(red[i], green[i], blue[i], 1.0).to_array());
    }
    pixels
}
