//! Best-fit zoom search for slippy-map viewports.

use raster_common::GeoBounds;
use serde::{Deserialize, Serialize};

/// Viewport size in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Zoom search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitZoom {
    pub max_zoom: u8,
    pub min_zoom: u8,
    pub unplaced_zoom: u8,
    pub viewport_fill: f64,
    pub tile_size: u32,
}

impl Default for FitZoom {
    fn default() -> Self {
        Self {
            max_zoom: 18,
            min_zoom: 3,
            unplaced_zoom: 15,
            viewport_fill: 0.8,
            tile_size: 256,
        }
    }
}

impl FitZoom {
    /// Degrees of longitude per screen pixel at `zoom`.
    pub fn degrees_per_pixel(&self, zoom: u8) -> f64 {
        360.0 / (self.tile_size as f64 * 2f64.powi(zoom as i32))
    }

    /// Highest zoom at which `bounds` fits inside the filled part of `viewport`.
    ///
    /// Bounds too large for every level get `min_zoom`, so a larger extent
    /// never gets a higher zoom than a smaller one.
    pub fn fit(&self, bounds: Option<&GeoBounds>, viewport: Viewport) -> u8 {
        let bounds = match bounds {
            Some(b) if b.is_valid() => b,
            _ => return self.unplaced_zoom,
        };

        let max_w = self.viewport_fill * viewport.width;
        let max_h = self.viewport_fill * viewport.height;
        (self.min_zoom..=self.max_zoom)
            .rev()
            .find(|&zoom| {
                let dpp = self.degrees_per_pixel(zoom);
                bounds.lon_span() / dpp < max_w && bounds.lat_span() / dpp < max_h
            })
            .unwrap_or(self.min_zoom)
    }
}

/// [`FitZoom::fit`] with default parameters.
pub fn compute_fit_zoom(bounds: Option<&GeoBounds>, viewport: Viewport) -> u8 {
    FitZoom::default().fit(bounds, viewport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrees_per_pixel() {
        let fit = FitZoom::default();
        assert_eq!(fit.degrees_per_pixel(0), 360.0 / 256.0);
        assert_eq!(fit.degrees_per_pixel(1), 360.0 / 512.0);
    }

    #[test]
    fn test_one_degree_box() {
        // At z=9 dpp = 360 / 131072 ~ 0.00275, 1 degree ~ 364 px < 0.8 * 1000.
        // At z=10 it is ~728 px, which fails the 0.8 * 600 height check.
        let b = GeoBounds::new(50.0, 49.0, 10.0, 11.0);
        assert_eq!(compute_fit_zoom(Some(&b), Viewport::new(1000.0, 600.0)), 9);
    }

    #[test]
    fn test_unplaced_and_oversized() {
        assert_eq!(compute_fit_zoom(None, Viewport::new(800.0, 600.0)), 15);
        let invalid = GeoBounds::new(1.0, 2.0, 0.0, 1.0);
        assert_eq!(compute_fit_zoom(Some(&invalid), Viewport::new(800.0, 600.0)), 15);

        // Whole world never fits a tiny viewport, even at min zoom.
        let world = GeoBounds::new(85.0, -85.0, -180.0, 180.0);
        assert_eq!(compute_fit_zoom(Some(&world), Viewport::new(100.0, 100.0)), 3);
    }

    #[test]
    fn test_tiny_box_hits_max_zoom() {
        let b = GeoBounds::new(0.0001, 0.0, 0.0, 0.0001);
        assert_eq!(compute_fit_zoom(Some(&b), Viewport::new(800.0, 600.0)), 18);
    }
}
