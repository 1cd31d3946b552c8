//! Display rendering for raster layers.
//!
//! - [`style`]: the gradient preset registry
//! - [`gradient`]: the color mapper that turns normalized samples into RGBA
//! - [`png`]: PNG encoding of display buffers

pub mod gradient;
pub mod png;
pub mod style;

pub use gradient::{composite_display, grayscale_display, ColorDomain, ColorMapper, DEFAULT_ABSOLUTE_RANGE};
pub use png::{encode_rgba_png, encode_rgba_png_with_order, RowOrder};
pub use style::{presets, GradientConfig, GradientDefinition, GradientRegistry};
