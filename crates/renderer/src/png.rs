//! PNG encoding for layer display buffers.
//!
//! Display buffers store row 0 at the bottom of the geographic extent. The
//! encoder writes rows in reverse so the image comes out north-up.

use std::io::Write;

use raster_common::{RasterError, RasterResult};

/// Rows of a display buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Row 0 is the top of the image.
    TopDown,
    /// Row 0 is the bottom of the image (layer display buffers).
    BottomUp,
}

/// Encode a layer display buffer (row 0 at the bottom) as an RGBA PNG.
pub fn encode_rgba_png(pixels: &[u8], width: usize, height: usize) -> RasterResult<Vec<u8>> {
    encode_rgba_png_with_order(pixels, width, height, RowOrder::BottomUp)
}

/// Encode 8-bit RGBA pixels as a PNG (color type 6).
pub fn encode_rgba_png_with_order(
    pixels: &[u8],
    width: usize,
    height: usize,
    order: RowOrder,
) -> RasterResult<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(RasterError::EncodeError(format!("empty image {}x{}", width, height)));
    }
    if pixels.len() != width * height * 4 {
        return Err(RasterError::EncodeError(format!(
            "expected {} bytes for {}x{} RGBA, got {}",
            width * height * 4,
            width,
            height,
            pixels.len()
        )));
    }

    let mut png = Vec::new();

    // PNG signature
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    // IHDR chunk
    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(6); // color type (RGBA)
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    let idat_data = deflate_idat_rgba(pixels, width, height, order)
        .map_err(|e| RasterError::EncodeError(format!("IDAT compression failed: {}", e)))?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Deflate RGBA scanlines for the IDAT chunk.
fn deflate_idat_rgba(pixels: &[u8], width: usize, height: usize, order: RowOrder) -> std::io::Result<Vec<u8>> {
    let stride = width * 4;
    let mut uncompressed = Vec::with_capacity(height * (1 + stride));
    for y in 0..height {
        let row = match order {
            RowOrder::TopDown => y,
            RowOrder::BottomUp => height - 1 - y,
        };
        uncompressed.push(0); // filter type: none
        uncompressed.extend_from_slice(&pixels[row * stride..(row + 1) * stride]);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&uncompressed)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_and_ihdr() {
        let png = encode_rgba_png(&[255, 0, 0, 255], 1, 1).unwrap();
        assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 1);
        assert_eq!(png[25], 6);
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
    }

    #[test]
    fn test_ihdr_crc() {
        let png = encode_rgba_png(&[0; 16], 2, 2).unwrap();
        let crc = crc32fast::hash(&png[12..29]);
        assert_eq!(u32::from_be_bytes([png[29], png[30], png[31], png[32]]), crc);
    }

    #[test]
    fn test_size_mismatch() {
        assert!(matches!(
            encode_rgba_png(&[0; 12], 2, 2),
            Err(RasterError::EncodeError(_))
        ));
        assert!(encode_rgba_png(&[], 0, 0).is_err());
    }
}
