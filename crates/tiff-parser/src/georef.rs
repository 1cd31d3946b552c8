//! GeoTIFF georeferencing tags and bounds resolution.

use raster_common::GeoBounds;
use tracing::debug;

use crate::ifd::{tags, Ifd};

/// Raw GeoTIFF placement tags from the first IFD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoTags {
    /// ModelTiepointTag: (I, J, K, X, Y, Z) per tiepoint.
    pub tiepoint: Option<Vec<f64>>,
    /// ModelPixelScaleTag: (ScaleX, ScaleY, ScaleZ).
    pub pixel_scale: Option<Vec<f64>>,
    /// ModelTransformationTag: 4x4 row-major affine matrix.
    pub transformation: Option<Vec<f64>>,
}

impl GeoTags {
    pub fn from_ifd(ifd: &Ifd) -> Self {
        Self {
            tiepoint: ifd.f64s(tags::MODEL_TIEPOINT),
            pixel_scale: ifd.f64s(tags::MODEL_PIXEL_SCALE),
            transformation: ifd.f64s(tags::MODEL_TRANSFORMATION),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tiepoint.is_none() && self.pixel_scale.is_none() && self.transformation.is_none()
    }
}

/// Resolve geographic bounds for a `width` x `height` raster.
///
/// Tiepoint plus pixel scale wins; the transformation matrix is the
/// fallback. Returns `None` when neither yields a valid box.
pub fn resolve_bounds(geo: &GeoTags, width: u32, height: u32) -> Option<GeoBounds> {
    let w = width as f64;
    let h = height as f64;

    let from_tiepoint = match (&geo.tiepoint, &geo.pixel_scale) {
        (Some(tp), Some(scale)) if tp.len() >= 6 && scale.len() >= 2 => {
            // Tiepoint raster (I, J) need not be the corner pixel.
            let west = tp[3] - tp[0] * scale[0];
            let north = tp[4] + tp[1] * scale[1];
            Some(GeoBounds::new(north, north - h * scale[1], west, west + w * scale[0]))
        }
        _ => None,
    };

    let candidate = from_tiepoint.or_else(|| match &geo.transformation {
        Some(t) if t.len() >= 16 => {
            let west = t[3];
            let north = t[7];
            Some(GeoBounds::new(north, north - h * t[5].abs(), west, west + w * t[0]))
        }
        _ => None,
    });

    match candidate {
        Some(bounds) if bounds.is_valid() => Some(bounds),
        Some(bounds) => {
            debug!(?bounds, "Discarding invalid georeference");
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiepoint_and_scale() {
        let geo = GeoTags {
            tiepoint: Some(vec![0.0, 0.0, 0.0, 10.0, 50.0, 0.0]),
            pixel_scale: Some(vec![0.01, 0.01, 0.0]),
            transformation: None,
        };
        let b = resolve_bounds(&geo, 100, 100).unwrap();
        assert!((b.west - 10.0).abs() < 1e-9);
        assert!((b.north - 50.0).abs() < 1e-9);
        assert!((b.east - 11.0).abs() < 1e-9);
        assert!((b.south - 49.0).abs() < 1e-9);
    }

    #[test]
    fn test_transformation_fallback() {
        let mut t = vec![0.0; 16];
        t[0] = 0.5;
        t[3] = -120.0;
        t[5] = -0.25;
        t[7] = 40.0;
        t[15] = 1.0;
        let geo = GeoTags {
            transformation: Some(t),
            ..Default::default()
        };
        let b = resolve_bounds(&geo, 4, 8).unwrap();
        assert_eq!(b.west, -120.0);
        assert_eq!(b.east, -118.0);
        assert_eq!(b.north, 40.0);
        assert_eq!(b.south, 38.0);
    }

    #[test]
    fn test_tiepoint_preferred_over_transformation() {
        let mut t = vec![0.0; 16];
        t[0] = 1.0;
        t[5] = -1.0;
        let geo = GeoTags {
            tiepoint: Some(vec![0.0, 0.0, 0.0, 5.0, 5.0, 0.0]),
            pixel_scale: Some(vec![1.0, 1.0]),
            transformation: Some(t),
        };
        let b = resolve_bounds(&geo, 2, 2).unwrap();
        assert_eq!(b.west, 5.0);
        assert_eq!(b.south, 3.0);
    }

    #[test]
    fn test_tiepoint_offset_from_corner() {
        let geo = GeoTags {
            tiepoint: Some(vec![10.0, 20.0, 0.0, 100.0, 40.0, 0.0]),
            pixel_scale: Some(vec![0.5, 0.25]),
            transformation: None,
        };
        let b = resolve_bounds(&geo, 40, 40).unwrap();
        assert_eq!(b.west, 95.0);
        assert_eq!(b.north, 45.0);
        assert_eq!(b.east, 115.0);
        assert_eq!(b.south, 35.0);
    }

    #[test]
    fn test_missing_or_short_tags() {
        assert!(resolve_bounds(&GeoTags::default(), 10, 10).is_none());

        let geo = GeoTags {
            tiepoint: Some(vec![0.0, 0.0, 0.0, 10.0]),
            pixel_scale: Some(vec![0.01, 0.01]),
            transformation: None,
        };
        assert!(resolve_bounds(&geo, 10, 10).is_none());
    }

    #[test]
    fn test_zero_scale_is_invalid() {
        let geo = GeoTags {
            tiepoint: Some(vec![0.0, 0.0, 0.0, 10.0, 50.0, 0.0]),
            pixel_scale: Some(vec![0.0, 0.0]),
            transformation: None,
        };
        assert!(resolve_bounds(&geo, 10, 10).is_none());
    }
}
