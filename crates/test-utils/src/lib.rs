//! Shared test utilities for the raster overlay workspace.
//!
//! This crate provides common testing infrastructure including:
//! - In-memory TIFF/GeoTIFF writer ([`TiffBuilder`])
//! - PNG fixture encoding
//! - Band data generators
//! - Common bounds fixtures
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{TiffBuilder, SampleType};
//! ```

pub mod fixtures;
pub mod generators;
pub mod png;
pub mod tiff;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use png::*;
pub use tiff::*;

/// Create a temporary directory that is removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("raster-test-")
        .tempdir()
        .unwrap_or_else(|e| panic!("failed to create temp dir: {}", e))
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Element-wise approximate equality of two float slices.
///
/// ```ignore
/// assert_slice_approx_eq!(&[0.5, 1.0], &[0.5001, 1.0], 0.001);
/// ```
#[macro_export]
macro_rules! assert_slice_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left = $left;
        let right = $right;
        assert_eq!(left.len(), right.len(), "slice lengths differ");
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            let diff = (*l as f64 - *r as f64).abs();
            if !(diff <= $epsilon as f64) {
                panic!(
                    "assertion failed at index {}: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`",
                    i, l, r
                );
            }
        }
    }};
}

/// Approximate equality of `GeoBounds`-like values (north, south, west, east fields).
#[macro_export]
macro_rules! assert_bounds_approx_eq {
    ($bounds:expr, ($n:expr, $s:expr, $w:expr, $e:expr), $epsilon:expr) => {{
        let b = $bounds;
        $crate::assert_approx_eq!(b.north, $n, $epsilon);
        $crate::assert_approx_eq!(b.south, $s, $epsilon);
        $crate::assert_approx_eq!(b.west, $w, $epsilon);
        $crate::assert_approx_eq!(b.east, $e, $epsilon);
    }};
}
