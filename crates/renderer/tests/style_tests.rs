//! Tests for the gradient registry and its JSON document format.

use raster_common::{Color, RasterError};
use renderer::{presets, GradientConfig, GradientRegistry};
use std::io::Write;

const SAMPLE_JSON: &str = r##"{
    "version": "1.0",
    "gradients": {
        "Water": {
            "description": "Dry to wet",
            "stops": [
                { "position": 0.0, "color": "#8B4513" },
                { "position": 0.5, "color": [255, 255, 255] },
                { "position": 1.0, "color": "#0000FFFF" }
            ]
        },
        "Heat": {
            "stops": [
                { "position": 0.0, "color": { "r": 0, "g": 0, "b": 0, "a": 255 } },
                { "position": 1.0, "color": "#FF0000" }
            ]
        }
    }
}"##;

// ============================================================================
// Built-in preset tests
// ============================================================================

#[test]
fn test_presets_present() {
    let registry = GradientRegistry::with_presets();
    for name in [presets::GRAYSCALE, presets::THERMAL, presets::NDVI, presets::VIRIDIS] {
        assert!(registry.contains(name), "missing preset {}", name);
    }
}

#[test]
fn test_ndvi_preset_colors() {
    let registry = GradientRegistry::with_presets();
    let ndvi = registry.get(presets::NDVI).unwrap();
    assert_eq!(ndvi.evaluate(0.0), Color::rgb(204, 0, 0));
    assert_eq!(ndvi.evaluate(0.5), Color::rgb(255, 255, 0));
    assert_eq!(ndvi.evaluate(1.0), Color::rgb(0, 153, 0));
}

#[test]
fn test_viridis_endpoints() {
    let registry = GradientRegistry::with_presets();
    let viridis = registry.get(presets::VIRIDIS).unwrap();
    assert_eq!(viridis.evaluate(0.0), Color::rgb(66, 0, 82));
    assert_eq!(viridis.evaluate(1.0), Color::rgb(252, 230, 36));
}

#[test]
fn test_grayscale_midpoint() {
    let registry = GradientRegistry::with_presets();
    let gray = registry.get(presets::GRAYSCALE).unwrap().evaluate(0.5);
    assert_eq!(gray, Color::rgb(128, 128, 128));
}

// ============================================================================
// JSON loading tests
// ============================================================================

#[test]
fn test_from_json() {
    let registry = GradientRegistry::from_json(SAMPLE_JSON).unwrap();
    assert_eq!(registry.len(), 2);
    // Document keys come back sorted.
    let names: Vec<&str> = registry.names().collect();
    assert_eq!(names, vec!["Heat", "Water"]);

    let water = registry.get("Water").unwrap();
    assert_eq!(water.evaluate(0.0), Color::rgb(139, 69, 19));
    assert_eq!(water.evaluate(0.5), Color::WHITE);
    assert_eq!(water.evaluate(1.0), Color::rgb(0, 0, 255));
}

#[test]
fn test_config_round_trip_through_registry() {
    let registry = GradientRegistry::with_presets();
    let json = serde_json::to_string(&registry.to_config()).unwrap();
    let reloaded = GradientRegistry::from_json(&json).unwrap();
    assert_eq!(reloaded.len(), registry.len());
    assert_eq!(reloaded.get(presets::THERMAL), registry.get(presets::THERMAL));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE_JSON.as_bytes()).unwrap();
    let registry = GradientRegistry::from_file(file.path()).unwrap();
    assert!(registry.contains("Heat"));
}

#[test]
fn test_from_file_missing() {
    let err = GradientRegistry::from_file("/nonexistent/gradients.json").unwrap_err();
    assert!(matches!(err, RasterError::NotFound(_)));
}

// ============================================================================
// Validation tests
// ============================================================================

#[test]
fn test_validate_rejects_unordered_stops() {
    let json = r##"{"version":"1.0","gradients":{"Bad":{"stops":[
        {"position":0.0,"color":"#000000"},
        {"position":0.7,"color":"#FFFFFF"},
        {"position":0.3,"color":"#FF0000"},
        {"position":1.0,"color":"#00FF00"}]}}}"##;
    let config = GradientConfig::from_json(json).unwrap();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, RasterError::InvalidGradient(ref msg) if msg.starts_with("Bad")));
    assert!(GradientRegistry::from_json(json).is_err());
}

#[test]
fn test_validate_rejects_partial_span() {
    let json = r##"{"version":"1.0","gradients":{"Half":{"stops":[
        {"position":0.0,"color":"#000000"},
        {"position":0.5,"color":"#FFFFFF"}]}}}"##;
    assert!(matches!(
        GradientRegistry::from_json(json),
        Err(RasterError::InvalidGradient(_))
    ));
}

#[test]
fn test_validate_rejects_empty_document() {
    let json = r#"{"version":"1.0","gradients":{}}"#;
    assert!(matches!(
        GradientRegistry::from_json(json),
        Err(RasterError::InvalidGradient(_))
    ));
}

#[test]
fn test_bad_color_is_json_error() {
    let json = r##"{"version":"1.0","gradients":{"X":{"stops":[
        {"position":0.0,"color":"#GG0000"},
        {"position":1.0,"color":"#FFFFFF"}]}}}"##;
    assert!(matches!(GradientRegistry::from_json(json), Err(RasterError::Json(_))));
}

// ============================================================================
// Strip tests
// ============================================================================

#[test]
fn test_strip_samples_ramp() {
    let registry = GradientRegistry::with_presets();
    let strip = registry.strip(presets::THERMAL, 4).unwrap();
    assert_eq!(strip.len(), 16);
    assert_eq!(&strip[0..4], &[0, 0, 255, 255]);
    assert_eq!(&strip[12..16], &[255, 0, 0, 255]);
}

#[test]
fn test_strip_single_pixel_and_unknown() {
    let registry = GradientRegistry::with_presets();
    assert_eq!(registry.strip(presets::GRAYSCALE, 1).unwrap(), vec![0, 0, 0, 255]);
    assert!(registry.strip(presets::GRAYSCALE, 0).unwrap().is_empty());
    assert!(matches!(
        registry.strip("Unknown", 8),
        Err(RasterError::GradientNotFound(_))
    ));
}
