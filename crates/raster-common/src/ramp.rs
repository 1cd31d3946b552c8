//! Colors and color ramps used to map normalized values to display colors.

use serde::{Deserialize, Serialize};

use crate::error::{RasterError, RasterResult};

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorSpec", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Build from unit-interval channels, rounding to the nearest byte.
    pub fn from_unit(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::new(unit_to_u8(r), unit_to_u8(g), unit_to_u8(b), unit_to_u8(a))
    }

    /// Gray level for a value in [0, 1], fully opaque.
    pub fn gray(v: f32) -> Self {
        let l = unit_to_u8(v);
        Self::new(l, l, l, 255)
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse "#RRGGBB" or "#RRGGBBAA".
    pub fn from_hex(hex: &str) -> Option<Self> {
        let s = hex.trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(s.get(i..i + 2)?, 16).ok();
        match s.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// Linear interpolation, every channel (alpha included) independently.
    pub fn lerp(&self, other: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

fn unit_to_u8(v: f32) -> u8 {
    (crate::layer::clamp01(v) * 255.0).round() as u8
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

/// Accepted JSON spellings of a color.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ColorSpec {
    /// Hex string: "#RRGGBB" or "#RRGGBBAA"
    Hex(String),
    /// RGB array: [r, g, b] or [r, g, b, a]
    Array(Vec<u8>),
    /// Explicit RGBA
    Rgba { r: u8, g: u8, b: u8, a: u8 },
}

impl TryFrom<ColorSpec> for Color {
    type Error = String;

    fn try_from(spec: ColorSpec) -> Result<Self, Self::Error> {
        match spec {
            ColorSpec::Hex(s) => {
                Color::from_hex(&s).ok_or_else(|| format!("invalid hex color '{}'", s))
            }
            ColorSpec::Array(arr) if arr.len() == 3 || arr.len() == 4 => Ok(Color::new(
                arr[0],
                arr[1],
                arr[2],
                arr.get(3).copied().unwrap_or(255),
            )),
            ColorSpec::Array(arr) => Err(format!("color array needs 3 or 4 entries, got {}", arr.len())),
            ColorSpec::Rgba { r, g, b, a } => Ok(Color::new(r, g, b, a)),
        }
    }
}

/// A color stop at a position in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f32,
    pub color: Color,
}

impl ColorStop {
    pub fn new(position: f32, color: Color) -> Self {
        Self { position, color }
    }
}

/// Ordered color stops spanning [0, 1].
///
/// Positions increase strictly, the first stop sits at 0 and the last at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RampStops", into = "RampStops")]
pub struct ColorRamp {
    stops: Vec<ColorStop>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RampStops {
    stops: Vec<ColorStop>,
}

impl TryFrom<RampStops> for ColorRamp {
    type Error = RasterError;

    fn try_from(raw: RampStops) -> Result<Self, Self::Error> {
        ColorRamp::new(raw.stops)
    }
}

impl From<ColorRamp> for RampStops {
    fn from(ramp: ColorRamp) -> Self {
        RampStops { stops: ramp.stops }
    }
}

impl ColorRamp {
    /// Validate and build a ramp.
    pub fn new(stops: Vec<ColorStop>) -> RasterResult<Self> {
        if stops.len() < 2 {
            return Err(RasterError::InvalidGradient(
                "a ramp needs at least 2 color stops".to_string(),
            ));
        }
        for pair in stops.windows(2) {
            if !(pair[1].position > pair[0].position) {
                return Err(RasterError::InvalidGradient(
                    "stop positions must increase strictly".to_string(),
                ));
            }
        }
        let first = stops[0].position;
        let last = stops[stops.len() - 1].position;
        if first.abs() > f32::EPSILON || (last - 1.0).abs() > f32::EPSILON {
            return Err(RasterError::InvalidGradient(format!(
                "stops must span [0, 1], got [{}, {}]",
                first, last
            )));
        }
        Ok(Self { stops })
    }

    /// Build from evenly spaced colors.
    pub fn evenly_spaced(colors: &[Color]) -> RasterResult<Self> {
        let n = colors.len();
        if n < 2 {
            return Self::new(colors.iter().map(|&c| ColorStop::new(0.0, c)).collect());
        }
        let stops = colors
            .iter()
            .enumerate()
            .map(|(i, &c)| ColorStop::new(i as f32 / (n - 1) as f32, c))
            .collect();
        Self::new(stops)
    }

    /// Black to white.
    pub fn grayscale() -> Self {
        Self {
            stops: vec![
                ColorStop::new(0.0, Color::BLACK),
                ColorStop::new(1.0, Color::WHITE),
            ],
        }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Color at `t`, interpolated between the bracketing stops.
    ///
    /// `t` outside [0, 1] (or NaN) is clamped to the nearest end stop.
    pub fn evaluate(&self, t: f32) -> Color {
        let t = crate::layer::clamp01(t);
        let upper = self
            .stops
            .iter()
            .position(|s| s.position >= t)
            .unwrap_or(self.stops.len() - 1);
        if upper == 0 {
            return self.stops[0].color;
        }
        let low = &self.stops[upper - 1];
        let high = &self.stops[upper];
        let local = (t - low.position) / (high.position - low.position);
        low.color.lerp(&high.color, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(Color::from_hex("#FF0000"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::from_hex("00ff0080"), Some(Color::new(0, 255, 0, 128)));
        assert_eq!(Color::from_hex("#GGGGGG"), None);
        assert_eq!(Color::rgb(1, 2, 3).to_hex(), "#010203FF");
    }

    #[test]
    fn test_ramp_rejects_bad_stops() {
        assert!(ColorRamp::new(vec![ColorStop::new(0.0, Color::BLACK)]).is_err());
        assert!(ColorRamp::new(vec![
            ColorStop::new(0.0, Color::BLACK),
            ColorStop::new(0.0, Color::WHITE),
        ])
        .is_err());
        assert!(ColorRamp::new(vec![
            ColorStop::new(0.1, Color::BLACK),
            ColorStop::new(1.0, Color::WHITE),
        ])
        .is_err());
    }

    #[test]
    fn test_evaluate_midpoint() {
        let ramp = ColorRamp::grayscale();
        assert_eq!(ramp.evaluate(0.0), Color::BLACK);
        assert_eq!(ramp.evaluate(1.0), Color::WHITE);
        assert_eq!(ramp.evaluate(0.5), Color::rgb(128, 128, 128));
        assert_eq!(ramp.evaluate(-3.0), Color::BLACK);
        assert_eq!(ramp.evaluate(f32::NAN), Color::BLACK);
    }

    #[test]
    fn test_alpha_interpolates_independently() {
        let ramp = ColorRamp::new(vec![
            ColorStop::new(0.0, Color::new(0, 0, 0, 0)),
            ColorStop::new(1.0, Color::new(0, 0, 0, 200)),
        ])
        .unwrap();
        assert_eq!(ramp.evaluate(0.5).a, 100);
    }
}
