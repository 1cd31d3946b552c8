//! Configuration for the layer manager.

use raster_common::{LayerSemantic, ValueRange};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::zoom::FitZoom;

/// Configuration for the layer manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerManagerConfig {
    /// Highest zoom level tried by the fit-zoom search.
    pub max_zoom: u8,

    /// Lowest zoom level tried by the fit-zoom search.
    pub min_zoom: u8,

    /// Zoom used when there are no bounds at all.
    pub unplaced_zoom: u8,

    /// Fraction of the viewport the bounds may occupy.
    pub viewport_fill: f64,

    /// Map tile edge in pixels.
    pub tile_size: u32,

    /// Fixed physical interval per index family, used for absolute coloring.
    pub absolute_ranges: HashMap<LayerSemantic, ValueRange>,

    /// Custom names for bands, by band index.
    pub band_names: Vec<String>,

    /// Prepended (with a space) to every layer name built from a file.
    pub name_prefix: String,

    /// Name given to preview overlays; a new preview replaces the old one.
    pub preview_name: String,
}

impl Default for LayerManagerConfig {
    fn default() -> Self {
        let index_range = ValueRange::new(-1.0, 1.0);
        Self {
            max_zoom: 18,
            min_zoom: 3,
            unplaced_zoom: 15,
            viewport_fill: 0.8,
            tile_size: 256,
            absolute_ranges: [
                LayerSemantic::Vegetation,
                LayerSemantic::Water,
                LayerSemantic::Turbidity,
                LayerSemantic::BuiltUp,
            ]
            .into_iter()
            .map(|s| (s, index_range))
            .collect(),
            band_names: Vec::new(),
            name_prefix: String::new(),
            preview_name: "PREVIEW".to_string(),
        }
    }
}

impl LayerManagerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RASTER_MAX_ZOOM") {
            if let Ok(zoom) = val.parse() {
                config.max_zoom = zoom;
            }
        }

        if let Ok(val) = std::env::var("RASTER_MIN_ZOOM") {
            if let Ok(zoom) = val.parse() {
                config.min_zoom = zoom;
            }
        }

        if let Ok(val) = std::env::var("RASTER_UNPLACED_ZOOM") {
            if let Ok(zoom) = val.parse() {
                config.unplaced_zoom = zoom;
            }
        }

        if let Ok(val) = std::env::var("RASTER_VIEWPORT_FILL") {
            if let Ok(fill) = val.parse() {
                config.viewport_fill = fill;
            }
        }

        if let Ok(val) = std::env::var("RASTER_NAME_PREFIX") {
            config.name_prefix = val;
        }

        if let Ok(val) = std::env::var("RASTER_BAND_NAMES") {
            config.band_names = parse_band_names(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_zoom > self.max_zoom {
            return Err(format!(
                "min_zoom ({}) must be <= max_zoom ({})",
                self.min_zoom, self.max_zoom
            ));
        }

        if self.max_zoom > 30 {
            return Err("max_zoom must be <= 30".to_string());
        }

        if !(self.viewport_fill > 0.0 && self.viewport_fill <= 1.0) {
            return Err("viewport_fill must be in (0, 1]".to_string());
        }

        if self.tile_size == 0 {
            return Err("tile_size must be > 0".to_string());
        }

        for (semantic, range) in &self.absolute_ranges {
            if range.is_degenerate() {
                return Err(format!(
                    "absolute range for {} is degenerate: [{}, {}]",
                    semantic.key(),
                    range.min,
                    range.max
                ));
            }
        }

        if self.preview_name.trim().is_empty() {
            return Err("preview_name must not be empty".to_string());
        }

        Ok(())
    }

    /// Zoom search parameters.
    pub fn fit_zoom(&self) -> FitZoom {
        FitZoom {
            max_zoom: self.max_zoom,
            min_zoom: self.min_zoom,
            unplaced_zoom: self.unplaced_zoom,
            viewport_fill: self.viewport_fill,
            tile_size: self.tile_size,
        }
    }
}

/// Split a comma-separated list, trimming blanks.
fn parse_band_names(val: &str) -> Vec<String> {
    val.split(',').map(|s| s.trim().to_string()).collect()
}
