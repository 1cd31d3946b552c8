//! Layer construction tests: orientation, normalization, composites, naming.

use std::path::Path;

use layer_manager::{build_band_layer, build_composite, LayerFactory, LayerNaming};
use raster_common::{LayerKind, LayerSemantic, ValueRange};
use test_utils::{
    assert_approx_eq, assert_slice_approx_eq, create_constant_grid, create_ramp_grid, size, SampleType, TiffBuilder,
};
use tiff_parser::{decode_raster, parse_info};

fn channel(display: &[u8], pixel: usize, c: usize) -> u8 {
    display[pixel * 4 + c]
}

// ============================================================================
// Band layer tests
// ============================================================================

#[test]
fn test_rows_flipped_bottom_up() {
    let (a, b, c, d) = (0.1f32, 0.2, 0.3, 0.4);
    let layer = build_band_layer(&[a, b, c, d], 2, 2, "Band 1", ValueRange::unit(), 0).unwrap();

    assert_slice_approx_eq!(layer.normalized_samples(), &[c, d, a, b], 1e-6);
}

#[test]
fn test_normalized_against_range() {
    let layer = build_band_layer(&[100.0, 150.0, 200.0], 3, 1, "Band 1", ValueRange::new(100.0, 200.0), 0).unwrap();

    assert_slice_approx_eq!(layer.normalized_samples(), &[0.0, 0.5, 1.0], 1e-6);
    assert_eq!(layer.value_range, ValueRange::new(100.0, 200.0));
}

#[test]
fn test_out_of_range_samples_clamped() {
    let layer = build_band_layer(&[-5.0, 50.0], 2, 1, "Band 1", ValueRange::new(0.0, 10.0), 0).unwrap();
    assert_slice_approx_eq!(layer.normalized_samples(), &[0.0, 1.0], 1e-6);
}

#[test]
fn test_degenerate_range_gives_flat_layer() {
    let layer = build_band_layer(&[5.0; 4], 2, 2, "flat", ValueRange::new(5.0, 5.0), 0).unwrap();

    assert_approx_eq!(layer.value_range.span(), 1.0, 1e-6);
    assert_approx_eq!(layer.value_range.min, 5.0, 1e-6);
    for &s in layer.normalized_samples() {
        assert!(s.is_finite());
        assert_approx_eq!(s, 0.0, 1e-6);
    }
}

#[test]
fn test_band_display_is_opaque_gray() {
    let layer = build_band_layer(&[0.0, 1.0], 2, 1, "Band 1", ValueRange::unit(), 0).unwrap();
    let display = layer.display();
    assert_eq!(&display[..], &[0, 0, 0, 255, 255, 255, 255, 255]);
}

// ============================================================================
// Composite tests
// ============================================================================

#[test]
fn test_composite_channels_normalized_independently() {
    let composite = build_composite(
        [&[0.2], &[50.0], &[0.9]],
        1,
        1,
        "RGB Composite",
        [ValueRange::unit(), ValueRange::new(0.0, 100.0), ValueRange::new(0.5, 1.0)],
    )
    .unwrap();

    let display = composite.display();
    assert!((channel(&display, 0, 0) as i32 - 51).abs() <= 1);
    assert!((channel(&display, 0, 1) as i32 - 128).abs() <= 1);
    assert!((channel(&display, 0, 2) as i32 - 204).abs() <= 1);
    assert_eq!(channel(&display, 0, 3), 255);

    assert_eq!(composite.kind, LayerKind::Composite);
    assert!(!composite.is_single_band());
    assert!(!composite.is_visible);
    assert_approx_eq!(composite.normalized_samples()[0], 0.5, 1e-6);
}

#[test]
fn test_composite_rows_flipped() {
    let red = [0.0f32, 1.0];
    let zeros = [0.0f32, 0.0];
    let composite = build_composite([&red, &zeros, &zeros], 1, 2, "RGB", [ValueRange::unit(); 3]).unwrap();
    let display = composite.display();
    assert_eq!(channel(&display, 0, 0), 255);
    assert_eq!(channel(&display, 1, 0), 0);
}

// ============================================================================
// Factory tests
// ============================================================================

fn decoded(tiff: &[u8]) -> tiff_parser::DecodedRaster {
    let info = parse_info(tiff).unwrap();
    decode_raster(tiff, &info, true).unwrap()
}

#[test]
fn test_factory_builds_bands_and_composite() {
    let tiff = TiffBuilder::new(2, 1, SampleType::U8)
        .band(vec![0.0, 255.0])
        .band(vec![10.0, 20.0])
        .band(vec![30.0, 40.0])
        .tiepoint(10.0, 50.0)
        .pixel_scale(0.5, 1.0)
        .build();
    let factory = LayerFactory::new(LayerNaming::new("Field", vec!["Red".into(), String::new()]));
    let layers = factory.build_all(&decoded(&tiff), Path::new("field.tif")).unwrap();

    let names: Vec<&str> = layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Field Red", "Field Band 2", "Field Band 3", "Field RGB Composite"]);
    assert_eq!(layers[1].kind, LayerKind::Band { index: 1 });
    assert_eq!(layers[3].kind, LayerKind::Composite);
    for layer in &layers {
        assert_eq!(layer.source_path.as_deref(), Some(Path::new("field.tif")));
        let bounds = layer.bounds.unwrap();
        assert_approx_eq!(bounds.east, 11.0, 1e-9);
        assert_approx_eq!(bounds.south, 49.0, 1e-9);
        assert!(!layer.is_visible);
    }
}

#[test]
fn test_factory_two_bands_no_composite() {
    let tiff = TiffBuilder::new(1, 1, SampleType::F32)
        .band(vec![0.25])
        .band(vec![0.75])
        .build();
    let layers = LayerFactory::default()
        .build_all(&decoded(&tiff), Path::new("pair.tif"))
        .unwrap();
    assert_eq!(layers.len(), 2);
    assert!(layers.iter().all(|l| l.bounds.is_none()));
}

#[test]
fn test_factory_classifies_index_names() {
    let tiff = TiffBuilder::new(1, 1, SampleType::F32).band(vec![0.3]).build();
    let factory = LayerFactory::new(LayerNaming::new("", vec!["NDVI".into()]));
    let layers = factory.build_all(&decoded(&tiff), Path::new("ndvi.tif")).unwrap();
    assert_eq!(layers[0].semantic, LayerSemantic::Vegetation);
}

#[test]
fn test_factory_names_from_file_stem() {
    let tiff = TiffBuilder::new(1, 1, SampleType::F32).band(vec![0.3]).build();
    let layers = LayerFactory::default()
        .build_all(&decoded(&tiff), Path::new("/data/ndvi_custom_20240501.tif"))
        .unwrap();
    assert_eq!(layers[0].name, "ndvi Band 1");
    assert_eq!(layers[0].semantic, LayerSemantic::Vegetation);
}

#[test]
fn test_factory_semantic_override() {
    let tiff = TiffBuilder::new(1, 1, SampleType::U8)
        .band(vec![1.0])
        .band(vec![2.0])
        .band(vec![3.0])
        .build();
    let layers = LayerFactory::default()
        .build_all_with(&decoded(&tiff), Path::new("scene.tif"), Some(LayerSemantic::Water))
        .unwrap();
    assert!(layers
        .iter()
        .filter(|l| l.is_single_band())
        .all(|l| l.semantic == LayerSemantic::Water));
    assert_eq!(layers[3].semantic, LayerSemantic::Reflectance);
}

#[test]
fn test_factory_requires_ranges() {
    let tiff = TiffBuilder::new(1, 1, SampleType::U8).band(vec![1.0]).build();
    let info = parse_info(&tiff).unwrap();
    let untracked = decode_raster(&tiff, &info, false).unwrap();
    assert!(LayerFactory::default()
        .build_all(&untracked, Path::new("x.tif"))
        .is_err());
}

#[test]
fn test_constant_band_decodes_flat() {
    let (w, h) = size::TINY;
    let tiff = TiffBuilder::new(w, h, SampleType::F32)
        .band(create_constant_grid(w as usize, h as usize, 5.0))
        .build();
    let layers = LayerFactory::default()
        .build_all(&decoded(&tiff), Path::new("flat.tif"))
        .unwrap();

    let layer = &layers[0];
    assert_eq!(layer.value_range, ValueRange::new(5.0, 6.0));
    assert!(layer.normalized_samples().iter().all(|&s| s == 0.0));
    assert_eq!(&layer.display()[..4], &[0, 0, 0, 255]);
}

#[test]
fn test_ramp_band_spans_unit_interval() {
    let (w, h) = size::ODD;
    let tiff = TiffBuilder::new(w, h, SampleType::U16)
        .band(create_ramp_grid(w as usize, h as usize, 1000.0, 3000.0))
        .build();
    let layers = LayerFactory::default()
        .build_all(&decoded(&tiff), Path::new("ramp.tif"))
        .unwrap();

    let layer = &layers[0];
    assert_eq!((layer.width, layer.height), (5, 3));
    for y in 0..3 {
        assert_approx_eq!(layer.sample_at(0, y).unwrap(), 0.0, 1e-6);
        assert_approx_eq!(layer.sample_at(2, y).unwrap(), 0.5, 1e-4);
        assert_approx_eq!(layer.sample_at(4, y).unwrap(), 1.0, 1e-6);
    }
    assert_approx_eq!(layer.physical_at(4, 0).unwrap(), 3000.0 / 65535.0, 1e-6);
}
