//! Geographic bounds of a placed raster.

use serde::{Deserialize, Serialize};

/// Geographic extent of a raster in decimal degrees.
///
/// `north > south` for any valid bounds. `east` is not normalized and may
/// exceed 180° for rasters that cross the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Create bounds from the four edges.
    pub fn new(north: f64, south: f64, west: f64, east: f64) -> Self {
        Self {
            north,
            south,
            west,
            east,
        }
    }

    /// Bounds enclosing a set of `(lat, lon)` vertices, e.g. a project polygon.
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(first.0, first.0, first.1, first.1);
        for &(lat, lon) in rest {
            bounds.north = bounds.north.max(lat);
            bounds.south = bounds.south.min(lat);
            bounds.west = bounds.west.min(lon);
            bounds.east = bounds.east.max(lon);
        }
        Some(bounds)
    }

    /// Latitude extent in degrees.
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude extent in degrees.
    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    /// Center as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.north + self.south) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// All edges finite and the box has positive extent.
    pub fn is_valid(&self) -> bool {
        [self.north, self.south, self.west, self.east]
            .iter()
            .all(|v| v.is_finite())
            && self.north > self.south
            && self.east > self.west
    }

    /// Smallest bounds covering both boxes.
    pub fn union(&self, other: &GeoBounds) -> GeoBounds {
        GeoBounds {
            north: self.north.max(other.north),
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            east: self.east.max(other.east),
        }
    }

    /// Check if a point is inside (edges inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }
}
