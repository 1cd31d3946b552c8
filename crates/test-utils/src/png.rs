//! PNG fixture encoding.

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

/// Encode 8-bit RGBA pixels (top row first) as a PNG file.
pub fn encode_png_fixture(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
    assert_eq!(rgba.len(), width as usize * height as usize * 4, "RGBA length mismatch");
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(rgba, width, height, ColorType::Rgba8)
        .unwrap_or_else(|e| panic!("PNG encode failed: {}", e));
    out
}

/// Encode a grayscale ramp as an RGBA PNG (R = G = B = value).
pub fn encode_gray_png_fixture(width: u32, height: u32, values: &[u8]) -> Vec<u8> {
    let rgba: Vec<u8> = values.iter().flat_map(|&v| [v, v, v, 255]).collect();
    encode_png_fixture(width, height, &rgba)
}
