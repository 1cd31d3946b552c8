//! In-memory TIFF/GeoTIFF writer for decoder tests.
//!
//! Band values are given as `f64` and stored according to [`SampleType`]:
//! integer types truncate, `F32` keeps the float.

use std::io::Write;

use flate2::write::ZlibEncoder;

/// Stored sample representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8,
    U16,
    F32,
}

impl SampleType {
    fn bits(self) -> u16 {
        match self {
            SampleType::U8 => 8,
            SampleType::U16 => 16,
            SampleType::F32 => 32,
        }
    }

    fn bytes(self) -> usize {
        self.bits() as usize / 8
    }

    fn format(self) -> u16 {
        match self {
            SampleType::F32 => 3,
            _ => 1,
        }
    }
}

const SHORT: u16 = 3;
const LONG: u16 = 4;
const DOUBLE: u16 = 12;

struct Entry {
    tag: u16,
    type_id: u16,
    count: u32,
    bytes: Vec<u8>,
}

/// Builder for small TIFF files.
///
/// ```ignore
/// let tiff = TiffBuilder::new(2, 2, SampleType::U8)
///     .band(vec![0.0, 64.0, 128.0, 255.0])
///     .tiepoint(10.0, 50.0)
///     .pixel_scale(0.01, 0.01)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TiffBuilder {
    width: u32,
    height: u32,
    sample_type: SampleType,
    bands: Vec<Vec<f64>>,
    big_endian: bool,
    separate: bool,
    tile: Option<(u32, u32)>,
    rows_per_strip: Option<u32>,
    deflate: bool,
    compression_code: Option<u16>,
    sample_format: Option<u16>,
    bits_override: Option<u16>,
    tiepoint: Option<Vec<f64>>,
    pixel_scale: Option<Vec<f64>>,
    transformation: Option<Vec<f64>>,
    omitted: Vec<u16>,
    truncate_data: bool,
    declared_size: Option<(u32, u32)>,
}

impl TiffBuilder {
    pub fn new(width: u32, height: u32, sample_type: SampleType) -> Self {
        Self {
            width,
            height,
            sample_type,
            bands: Vec::new(),
            big_endian: false,
            separate: false,
            tile: None,
            rows_per_strip: None,
            deflate: false,
            compression_code: None,
            sample_format: None,
            bits_override: None,
            tiepoint: None,
            pixel_scale: None,
            transformation: None,
            omitted: Vec::new(),
            truncate_data: false,
            declared_size: None,
        }
    }

    /// Append a band; values are row-major with the top row first.
    pub fn band(mut self, values: Vec<f64>) -> Self {
        assert_eq!(
            values.len(),
            self.width as usize * self.height as usize,
            "band length mismatch"
        );
        self.bands.push(values);
        self
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    /// PlanarConfiguration = 2.
    pub fn planar_separate(mut self) -> Self {
        self.separate = true;
        self
    }

    pub fn tiled(mut self, tile_width: u32, tile_height: u32) -> Self {
        self.tile = Some((tile_width, tile_height));
        self
    }

    pub fn rows_per_strip(mut self, rows: u32) -> Self {
        self.rows_per_strip = Some(rows);
        self
    }

    pub fn deflate(mut self) -> Self {
        self.deflate = true;
        self
    }

    /// Write an arbitrary Compression tag value (data stays uncompressed).
    pub fn compression_code(mut self, code: u16) -> Self {
        self.compression_code = Some(code);
        self
    }

    pub fn sample_format(mut self, format: u16) -> Self {
        self.sample_format = Some(format);
        self
    }

    /// Write an arbitrary BitsPerSample tag value.
    pub fn bits_per_sample(mut self, bits: u16) -> Self {
        self.bits_override = Some(bits);
        self
    }

    /// Tiepoint anchoring raster (0, 0) at (`west`, `north`).
    pub fn tiepoint(self, west: f64, north: f64) -> Self {
        self.tiepoint_raw(vec![0.0, 0.0, 0.0, west, north, 0.0])
    }

    pub fn tiepoint_raw(mut self, values: Vec<f64>) -> Self {
        self.tiepoint = Some(values);
        self
    }

    pub fn pixel_scale(mut self, x: f64, y: f64) -> Self {
        self.pixel_scale = Some(vec![x, y, 0.0]);
        self
    }

    pub fn transformation(mut self, matrix: [f64; 16]) -> Self {
        self.transformation = Some(matrix.to_vec());
        self
    }

    /// Drop a tag from the written IFD.
    pub fn omit_tag(mut self, tag: u16) -> Self {
        self.omitted.push(tag);
        self
    }

    /// Write these dimensions into the IFD while encoding the real samples.
    pub fn declared_size(mut self, width: u32, height: u32) -> Self {
        self.declared_size = Some((width, height));
        self
    }

    /// Point the last chunk past the end of the file.
    pub fn truncate_data(mut self) -> Self {
        self.truncate_data = true;
        self
    }

    fn put_u16(&self, out: &mut Vec<u8>, v: u16) {
        if self.big_endian {
            out.extend_from_slice(&v.to_be_bytes());
        } else {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn put_u32(&self, out: &mut Vec<u8>, v: u32) {
        if self.big_endian {
            out.extend_from_slice(&v.to_be_bytes());
        } else {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn put_f64(&self, out: &mut Vec<u8>, v: f64) {
        if self.big_endian {
            out.extend_from_slice(&v.to_be_bytes());
        } else {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn put_sample(&self, out: &mut [u8], value: f64) {
        match self.sample_type {
            SampleType::U8 => out[0] = value as u8,
            SampleType::U16 => {
                let b = if self.big_endian {
                    (value as u16).to_be_bytes()
                } else {
                    (value as u16).to_le_bytes()
                };
                out.copy_from_slice(&b);
            }
            SampleType::F32 => {
                let b = if self.big_endian {
                    (value as f32).to_be_bytes()
                } else {
                    (value as f32).to_le_bytes()
                };
                out.copy_from_slice(&b);
            }
        }
    }

    fn shorts(&self, values: &[u16]) -> Entry {
        let mut bytes = Vec::new();
        for &v in values {
            self.put_u16(&mut bytes, v);
        }
        Entry {
            tag: 0,
            type_id: SHORT,
            count: values.len() as u32,
            bytes,
        }
    }

    fn longs(&self, values: &[u32]) -> Entry {
        let mut bytes = Vec::new();
        for &v in values {
            self.put_u32(&mut bytes, v);
        }
        Entry {
            tag: 0,
            type_id: LONG,
            count: values.len() as u32,
            bytes,
        }
    }

    fn doubles(&self, values: &[f64]) -> Entry {
        let mut bytes = Vec::new();
        for &v in values {
            self.put_f64(&mut bytes, v);
        }
        Entry {
            tag: 0,
            type_id: DOUBLE,
            count: values.len() as u32,
            bytes,
        }
    }

    /// Raw (uncompressed) chunk buffers in file order.
    fn chunks(&self) -> Vec<Vec<u8>> {
        let (w, h) = (self.width as usize, self.height as usize);
        let spp = self.bands.len();
        let bps = self.sample_type.bytes();
        let planes: Vec<Vec<usize>> = if self.separate {
            (0..spp).map(|s| vec![s]).collect()
        } else {
            vec![(0..spp).collect()]
        };

        let mut chunks = Vec::new();
        for plane in &planes {
            let n = plane.len();
            match self.tile {
                Some((tw, th)) => {
                    let (tw, th) = (tw as usize, th as usize);
                    for ty in 0..h.div_ceil(th) {
                        for tx in 0..w.div_ceil(tw) {
                            let mut buf = vec![0u8; tw * th * n * bps];
                            for py in 0..th {
                                for px in 0..tw {
                                    let (gx, gy) = (tx * tw + px, ty * th + py);
                                    if gx >= w || gy >= h {
                                        continue;
                                    }
                                    for (k, &band) in plane.iter().enumerate() {
                                        let at = ((py * tw + px) * n + k) * bps;
                                        self.put_sample(&mut buf[at..at + bps], self.bands[band][gy * w + gx]);
                                    }
                                }
                            }
                            chunks.push(buf);
                        }
                    }
                }
                None => {
                    let rps = self.rows_per_strip.unwrap_or(self.height) as usize;
                    for first in (0..h).step_by(rps) {
                        let rows = rps.min(h - first);
                        let mut buf = vec![0u8; rows * w * n * bps];
                        for r in 0..rows {
                            for x in 0..w {
                                for (k, &band) in plane.iter().enumerate() {
                                    let at = ((r * w + x) * n + k) * bps;
                                    self.put_sample(&mut buf[at..at + bps], self.bands[band][(first + r) * w + x]);
                                }
                            }
                        }
                        chunks.push(buf);
                    }
                }
            }
        }
        chunks
    }

    pub fn build(&self) -> Vec<u8> {
        let spp = self.bands.len().max(1) as u16;
        let mut out = Vec::new();
        out.extend_from_slice(if self.big_endian { b"MM" } else { b"II" });
        self.put_u16(&mut out, 42);
        self.put_u32(&mut out, 0);

        let mut offsets = Vec::new();
        let mut counts = Vec::new();
        for chunk in self.chunks() {
            let stored = if self.deflate {
                let mut enc = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                enc.write_all(&chunk)
                    .unwrap_or_else(|e| panic!("deflate failed: {}", e));
                enc.finish().unwrap_or_else(|e| panic!("deflate failed: {}", e))
            } else {
                chunk
            };
            offsets.push(out.len() as u32);
            counts.push(stored.len() as u32);
            out.extend_from_slice(&stored);
        }
        if self.truncate_data {
            if let Some(last) = offsets.last_mut() {
                *last = out.len() as u32 + 1024;
            }
        }

        let compression = self
            .compression_code
            .unwrap_or(if self.deflate { 8 } else { 1 });
        let bits = self.bits_override.unwrap_or(self.sample_type.bits());
        let format = self.sample_format.unwrap_or(self.sample_type.format());

        let (width, height) = self.declared_size.unwrap_or((self.width, self.height));
        let mut entries: Vec<(u16, Entry)> = vec![
            (256, self.longs(&[width])),
            (257, self.longs(&[height])),
            (258, self.shorts(&vec![bits; spp as usize])),
            (259, self.shorts(&[compression])),
            (262, self.shorts(&[if spp >= 3 { 2 } else { 1 }])),
            (277, self.shorts(&[spp])),
            (284, self.shorts(&[if self.separate { 2 } else { 1 }])),
            (339, self.shorts(&vec![format; spp as usize])),
        ];
        match self.tile {
            Some((tw, th)) => {
                entries.push((322, self.longs(&[tw])));
                entries.push((323, self.longs(&[th])));
                entries.push((324, self.longs(&offsets)));
                entries.push((325, self.longs(&counts)));
            }
            None => {
                entries.push((273, self.longs(&offsets)));
                entries.push((278, self.longs(&[self.rows_per_strip.unwrap_or(self.height)])));
                entries.push((279, self.longs(&counts)));
            }
        }
        if let Some(v) = &self.pixel_scale {
            entries.push((33550, self.doubles(v)));
        }
        if let Some(v) = &self.tiepoint {
            entries.push((33922, self.doubles(v)));
        }
        if let Some(v) = &self.transformation {
            entries.push((34264, self.doubles(v)));
        }

        entries.retain(|(tag, _)| !self.omitted.contains(tag));
        entries.sort_by_key(|(tag, _)| *tag);
        let entries: Vec<Entry> = entries
            .into_iter()
            .map(|(tag, e)| Entry { tag, ..e })
            .collect();

        // Out-of-line values go before the IFD.
        let mut value_offsets = Vec::with_capacity(entries.len());
        for e in &entries {
            if e.bytes.len() > 4 {
                if out.len() % 2 == 1 {
                    out.push(0);
                }
                value_offsets.push(Some(out.len() as u32));
                out.extend_from_slice(&e.bytes);
            } else {
                value_offsets.push(None);
            }
        }
        if out.len() % 2 == 1 {
            out.push(0);
        }

        let ifd_offset = out.len() as u32;
        self.put_u16(&mut out, entries.len() as u16);
        for (e, value_offset) in entries.iter().zip(&value_offsets) {
            self.put_u16(&mut out, e.tag);
            self.put_u16(&mut out, e.type_id);
            self.put_u32(&mut out, e.count);
            match value_offset {
                Some(off) => self.put_u32(&mut out, *off),
                None => {
                    let mut inline = e.bytes.clone();
                    inline.resize(4, 0);
                    out.extend_from_slice(&inline);
                }
            }
        }
        self.put_u32(&mut out, 0);

        let mut header_offset = Vec::new();
        self.put_u32(&mut header_offset, ifd_offset);
        out[4..8].copy_from_slice(&header_offset);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_ifd_offset() {
        let tiff = TiffBuilder::new(2, 2, SampleType::U8)
            .band(vec![1.0, 2.0, 3.0, 4.0])
            .build();
        assert_eq!(&tiff[..4], &[b'I', b'I', 42, 0]);
        // Pixel data directly follows the header.
        assert_eq!(&tiff[8..12], &[1, 2, 3, 4]);
        let ifd = u32::from_le_bytes([tiff[4], tiff[5], tiff[6], tiff[7]]) as usize;
        assert!(ifd > 12 && ifd < tiff.len());
    }

    #[test]
    fn test_big_endian_header() {
        let tiff = TiffBuilder::new(1, 1, SampleType::U16)
            .band(vec![258.0])
            .big_endian()
            .build();
        assert_eq!(&tiff[..4], &[b'M', b'M', 0, 42]);
        assert_eq!(&tiff[8..10], &[1, 2]);
    }

    #[test]
    fn test_tile_padding() {
        let builder = TiffBuilder::new(3, 1, SampleType::U8)
            .band(vec![7.0, 8.0, 9.0])
            .tiled(2, 2);
        let chunks = builder.chunks();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], vec![7, 8, 0, 0]);
        assert_eq!(chunks[1], vec![9, 0, 0, 0]);
    }

    #[test]
    fn test_separate_strips_band_major() {
        let builder = TiffBuilder::new(1, 2, SampleType::U8)
            .band(vec![1.0, 2.0])
            .band(vec![3.0, 4.0])
            .planar_separate()
            .rows_per_strip(1);
        assert_eq!(builder.chunks(), vec![vec![1], vec![2], vec![3], vec![4]]);
    }
}
