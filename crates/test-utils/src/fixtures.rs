//! Common test fixtures for raster overlay tests.
//!
//! This module provides pre-defined geographic extents and viewports that
//! come up repeatedly in georeferencing and fit-zoom tests.

/// Bounding boxes as `(north, south, west, east)`.
pub mod bounds {
    /// Whole world in plate carrée.
    pub const GLOBAL: (f64, f64, f64, f64) = (90.0, -90.0, -180.0, 180.0);

    /// Continental United States.
    pub const CONUS: (f64, f64, f64, f64) = (55.0, 20.0, -130.0, -60.0);

    /// One-degree cell used by the tiepoint examples.
    pub const ONE_DEGREE: (f64, f64, f64, f64) = (50.0, 49.0, 10.0, 11.0);

    /// A single agricultural field (a few hundred meters across).
    pub const FIELD: (f64, f64, f64, f64) = (41.0050, 41.0000, -93.6100, -93.6030);

    /// Extent whose east edge runs past the antimeridian.
    pub const PACIFIC: (f64, f64, f64, f64) = (50.0, -50.0, 160.0, 220.0);
}

/// Viewport sizes as `(width, height)` in screen pixels.
pub mod viewport {
    pub const SMALL: (f64, f64) = (400.0, 300.0);
    pub const HD: (f64, f64) = (1920.0, 1080.0);
}

/// Standard test raster sizes.
pub mod size {
    pub const TINY: (u32, u32) = (2, 2);
    pub const ODD: (u32, u32) = (5, 3);
    pub const TILE_256: (u32, u32) = (256, 256);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_ordered() {
        for (n, s, w, e) in [bounds::GLOBAL, bounds::CONUS, bounds::ONE_DEGREE, bounds::FIELD, bounds::PACIFIC] {
            assert!(n > s);
            assert!(e > w);
        }
    }
}
