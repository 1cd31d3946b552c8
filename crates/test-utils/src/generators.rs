//! Test data generators for synthetic band data.
//!
//! These generators create predictable, verifiable patterns that can be
//! used across the test suite. All grids are row-major with row 0 first.

/// Creates a grid where each cell is `row * width + col`.
///
/// Makes it easy to verify orientation and layout handling: the value at
/// any position identifies where it came from.
///
/// # Example
///
/// ```
/// use test_utils::create_index_grid;
///
/// let grid = create_index_grid(3, 2);
/// assert_eq!(grid, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
/// ```
pub fn create_index_grid(width: usize, height: usize) -> Vec<f64> {
    (0..width * height).map(|i| i as f64).collect()
}

/// Creates a horizontal ramp from `min` (left column) to `max` (right column).
pub fn create_ramp_grid(width: usize, height: usize, min: f64, max: f64) -> Vec<f64> {
    let denom = (width.max(2) - 1) as f64;
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(min + (max - min) * col as f64 / denom);
        }
    }
    data
}

/// Creates a grid where every cell has the same value.
pub fn create_constant_grid(width: usize, height: usize, value: f64) -> Vec<f64> {
    vec![value; width * height]
}

/// Creates NDVI-like values in [-1, 1]: water on the left, dense vegetation
/// on the right, with a mild vertical modulation.
pub fn create_ndvi_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x = col as f64 / width.max(1) as f64;
            let y = row as f64 / height.max(1) as f64;
            let v = -0.4 + 1.3 * x + 0.1 * (y * std::f64::consts::PI).sin();
            data.push(v.clamp(-1.0, 1.0));
        }
    }
    data
}

/// Creates reflectance-like 16-bit digital numbers with a deterministic
/// pseudo-random texture.
pub fn create_reflectance_grid(width: usize, height: usize, seed: u32) -> Vec<f64> {
    let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..width * height {
        // xorshift32
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        data.push(1000.0 + (state % 20000) as f64);
    }
    data
}

/// Creates a checkerboard of `low`/`high` cells.
pub fn create_checkerboard_grid(width: usize, height: usize, low: f64, high: f64) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(if (row + col) % 2 == 0 { low } else { high });
        }
    }
    data
}
