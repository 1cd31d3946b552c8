//! Fit-zoom tests over common extents and viewports.

use layer_manager::{compute_fit_zoom, FitZoom, LayerManagerConfig, Viewport};
use raster_common::GeoBounds;
use test_utils::{bounds, viewport};

fn geo((n, s, w, e): (f64, f64, f64, f64)) -> GeoBounds {
    GeoBounds::new(n, s, w, e)
}

fn view((w, h): (f64, f64)) -> Viewport {
    Viewport::new(w, h)
}

// ============================================================================
// Search tests
// ============================================================================

#[test]
fn test_smaller_extent_never_zooms_out() {
    let extents = [bounds::GLOBAL, bounds::CONUS, bounds::ONE_DEGREE, bounds::FIELD];
    for vp in [viewport::SMALL, viewport::HD] {
        let zooms: Vec<u8> = extents
            .iter()
            .map(|&b| compute_fit_zoom(Some(&geo(b)), view(vp)))
            .collect();
        assert!(zooms.windows(2).all(|w| w[0] <= w[1]), "{:?} for {:?}", zooms, vp);
    }
}

#[test]
fn test_larger_viewport_never_zooms_out() {
    for b in [bounds::CONUS, bounds::ONE_DEGREE, bounds::FIELD, bounds::PACIFIC] {
        let small = compute_fit_zoom(Some(&geo(b)), view(viewport::SMALL));
        let hd = compute_fit_zoom(Some(&geo(b)), view(viewport::HD));
        assert!(small <= hd, "{:?}: {} > {}", b, small, hd);
    }
}

#[test]
fn test_chosen_zoom_fits_and_next_does_not() {
    let fit = FitZoom::default();
    let vp = view(viewport::HD);
    let b = geo(bounds::CONUS);
    let zoom = fit.fit(Some(&b), vp);

    let fits = |z: u8| {
        let dpp = fit.degrees_per_pixel(z);
        b.lon_span() / dpp < 0.8 * vp.width && b.lat_span() / dpp < 0.8 * vp.height
    };
    assert!(fits(zoom));
    assert!(!fits(zoom + 1));
}

#[test]
fn test_antimeridian_extent_fits() {
    // 60° of longitude across the antimeridian is an ordinary span.
    let zoom = compute_fit_zoom(Some(&geo(bounds::PACIFIC)), view(viewport::HD));
    assert_eq!(zoom, 3);
}

#[test]
fn test_oversized_extent_gets_min_zoom() {
    assert_eq!(compute_fit_zoom(Some(&geo(bounds::GLOBAL)), view(viewport::SMALL)), 3);
}

#[test]
fn test_invalid_bounds_unplaced() {
    let inverted = GeoBounds::new(10.0, 20.0, 0.0, 1.0);
    assert_eq!(compute_fit_zoom(Some(&inverted), view(viewport::HD)), 15);
}

// ============================================================================
// Configured search tests
// ============================================================================

#[test]
fn test_config_caps_max_zoom() {
    let config = LayerManagerConfig {
        max_zoom: 12,
        ..Default::default()
    };
    let zoom = config.fit_zoom().fit(Some(&geo(bounds::FIELD)), view(viewport::HD));
    assert_eq!(zoom, 12);
}

#[test]
fn test_config_zoom_limits() {
    let config = LayerManagerConfig {
        min_zoom: 1,
        unplaced_zoom: 4,
        ..Default::default()
    };
    let fit = config.fit_zoom();
    assert_eq!(fit.fit(Some(&geo(bounds::GLOBAL)), view(viewport::SMALL)), 1);
    assert_eq!(fit.fit(None, view(viewport::SMALL)), 4);
}
