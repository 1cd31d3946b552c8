//! Named gradient presets.
//!
//! A [`GradientRegistry`] is an explicit, ordered set of color ramps passed
//! to whoever needs to resolve a gradient by name. It starts from the
//! built-in presets or is loaded from a JSON document:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "gradients": {
//!     "Thermal": {
//!       "description": "Cold to hot",
//!       "stops": [
//!         { "position": 0.0, "color": "#0000FF" },
//!         { "position": 1.0, "color": "#FF0000" }
//!       ]
//!     }
//!   }
//! }
//! ```

use raster_common::{Color, ColorRamp, ColorStop, RasterError, RasterResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Names of the built-in presets.
pub mod presets {
    pub const GRAYSCALE: &str = "Grayscale";
    pub const THERMAL: &str = "Thermal";
    pub const NDVI: &str = "NDVI";
    pub const VIRIDIS: &str = "Viridis";
}

/// Stop tables of the built-in presets after Grayscale, as unit RGB.
const PRESET_STOPS: &[(&str, &[(f32, [f32; 3])])] = &[
    (
        presets::THERMAL,
        &[
            (0.0, [0.0, 0.0, 1.0]),
            (0.33, [0.0, 1.0, 0.0]),
            (0.66, [1.0, 1.0, 0.0]),
            (1.0, [1.0, 0.0, 0.0]),
        ],
    ),
    (
        presets::NDVI,
        &[
            (0.0, [0.8, 0.0, 0.0]),
            (0.5, [1.0, 1.0, 0.0]),
            (1.0, [0.0, 0.6, 0.0]),
        ],
    ),
    (
        presets::VIRIDIS,
        &[
            (0.0, [0.26, 0.0, 0.32]),
            (0.33, [0.28, 0.35, 0.54]),
            (0.66, [0.12, 0.63, 0.53]),
            (1.0, [0.99, 0.90, 0.14]),
        ],
    ),
];

fn preset_ramp(stops: &[(f32, [f32; 3])]) -> RasterResult<ColorRamp> {
    ColorRamp::new(
        stops
            .iter()
            .map(|&(position, [r, g, b])| ColorStop::new(position, Color::from_unit(r, g, b, 1.0)))
            .collect(),
    )
}

/// Gradient document as stored on disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GradientConfig {
    pub version: String,
    pub gradients: BTreeMap<String, GradientDefinition>,
}

/// One named gradient in a [`GradientConfig`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GradientDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stops: Vec<ColorStop>,
}

impl GradientConfig {
    /// Load gradient configuration from JSON string
    pub fn from_json(json_str: &str) -> RasterResult<Self> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Load gradient configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> RasterResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check every gradient's stops.
    pub fn validate(&self) -> RasterResult<()> {
        if self.gradients.is_empty() {
            return Err(RasterError::InvalidGradient("no gradients defined".into()));
        }
        for (name, def) in &self.gradients {
            ColorRamp::new(def.stops.clone())
                .map_err(|e| RasterError::InvalidGradient(format!("{}: {}", name, e)))?;
        }
        Ok(())
    }
}

/// Ordered set of named color ramps.
#[derive(Debug, Clone, Default)]
pub struct GradientRegistry {
    entries: Vec<(String, ColorRamp)>,
}

impl GradientRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grayscale, Thermal, NDVI and Viridis, in that order.
    pub fn with_presets() -> Self {
        let mut registry = Self::new();
        registry.register(presets::GRAYSCALE, ColorRamp::grayscale());
        for (name, stops) in PRESET_STOPS {
            match preset_ramp(stops) {
                Ok(ramp) => registry.register(*name, ramp),
                Err(e) => warn!(gradient = *name, error = %e, "Built-in gradient rejected"),
            }
        }
        registry
    }

    /// Build from a validated document.
    ///
    /// `gradients` is a sorted map, so the registry lists them by name, not
    /// in the order the document wrote them.
    pub fn from_config(config: &GradientConfig) -> RasterResult<Self> {
        config.validate()?;
        let mut registry = Self::new();
        for (name, def) in &config.gradients {
            registry.register(name.clone(), ColorRamp::new(def.stops.clone())?);
        }
        Ok(registry)
    }

    pub fn from_json(json_str: &str) -> RasterResult<Self> {
        Self::from_config(&GradientConfig::from_json(json_str)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> RasterResult<Self> {
        Self::from_config(&GradientConfig::from_file(path)?)
    }

    /// Serializable form of this registry.
    pub fn to_config(&self) -> GradientConfig {
        GradientConfig {
            version: "1.0".to_string(),
            gradients: self
                .entries
                .iter()
                .map(|(name, ramp)| {
                    (
                        name.clone(),
                        GradientDefinition {
                            description: None,
                            stops: ramp.stops().to_vec(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Add a ramp, replacing any ramp of the same name in place.
    pub fn register(&mut self, name: impl Into<String>, ramp: ColorRamp) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = ramp,
            None => self.entries.push((name, ramp)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ColorRamp> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// Like [`get`](Self::get), but an unknown name is an error.
    pub fn require(&self, name: &str) -> RasterResult<&ColorRamp> {
        self.get(name)
            .ok_or_else(|| RasterError::GradientNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sample a ramp into a `width` x 1 RGBA strip, left = 0, right = 1.
    pub fn strip(&self, name: &str, width: usize) -> RasterResult<Vec<u8>> {
        let ramp = self.require(name)?;
        let denom = width.saturating_sub(1).max(1) as f32;
        Ok((0..width)
            .flat_map(|i| ramp.evaluate(i as f32 / denom).to_array())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_order() {
        let registry = GradientRegistry::with_presets();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["Grayscale", "Thermal", "NDVI", "Viridis"]);
    }

    #[test]
    fn test_every_preset_table_is_valid() {
        for (name, stops) in PRESET_STOPS {
            assert!(preset_ramp(stops).is_ok(), "{} stops rejected", name);
        }
        let registry = GradientRegistry::with_presets();
        assert_eq!(registry.len(), PRESET_STOPS.len() + 1);
        for name in [presets::GRAYSCALE, presets::THERMAL, presets::NDVI, presets::VIRIDIS] {
            assert!(registry.contains(name), "{} missing", name);
        }
    }

    // ========================================================================
    // Document order
    // ========================================================================

    #[test]
    fn test_document_gradients_listed_by_name() {
        let json = r##"{
            "version": "1.0",
            "gradients": {
                "Zeta": { "stops": [
                    { "position": 0.0, "color": "#000000" },
                    { "position": 1.0, "color": "#FFFFFF" }
                ] },
                "Alpha": { "stops": [
                    { "position": 0.0, "color": "#FF0000" },
                    { "position": 1.0, "color": "#0000FF" }
                ] }
            }
        }"##;
        let registry = GradientRegistry::from_json(json).unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_thermal_stops() {
        let registry = GradientRegistry::with_presets();
        let thermal = registry.get(presets::THERMAL).unwrap();
        assert_eq!(thermal.evaluate(0.0), Color::rgb(0, 0, 255));
        assert_eq!(thermal.evaluate(0.33), Color::rgb(0, 255, 0));
        assert_eq!(thermal.evaluate(1.0), Color::rgb(255, 0, 0));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = GradientRegistry::with_presets();
        registry.register(presets::THERMAL, ColorRamp::grayscale());
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get(presets::THERMAL), Some(&ColorRamp::grayscale()));
    }

    #[test]
    fn test_require_unknown() {
        let registry = GradientRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.require("Nope"),
            Err(RasterError::GradientNotFound(_))
        ));
    }

    #[test]
    fn test_strip_endpoints() {
        let registry = GradientRegistry::with_presets();
        let strip = registry.strip(presets::GRAYSCALE, 3).unwrap();
        assert_eq!(strip.len(), 12);
        assert_eq!(&strip[0..4], &[0, 0, 0, 255]);
        assert_eq!(&strip[8..12], &[255, 255, 255, 255]);
    }
}
