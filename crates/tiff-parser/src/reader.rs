//! RasterReader: TIFF metadata and per-band sample extraction.
//!
//! Decoding is a pure function of the file bytes ([`parse_info`] then
//! [`decode_raster`]); [`RasterReader`] only adds the injected byte source.
//! Samples come out in file order (row 0 at the top); flipping to the
//! display orientation is the caller's job.

use std::path::Path;
use std::sync::Arc;

use raster_common::{GeoBounds, RasterResult, SourceReader, ValueRange};
use tracing::{debug, info};

use crate::compression::{swap_to_little_endian, Compression};
use crate::error::TiffError;
use crate::georef::{resolve_bounds, GeoTags};
use crate::ifd::{parse_header, parse_ifd, tags, ByteOrder, Ifd};
use crate::pixel::{decode_sample, BitDepth};

/// How samples of different bands are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanarConfig {
    /// All bands interleaved per pixel.
    Contiguous,
    /// One full plane per band.
    Separate,
}

impl PlanarConfig {
    fn from_code(code: u64) -> Result<Self, TiffError> {
        match code {
            1 => Ok(PlanarConfig::Contiguous),
            2 => Ok(PlanarConfig::Separate),
            other => Err(TiffError::InvalidTag(format!("PlanarConfiguration {}", other))),
        }
    }
}

/// How pixel data is chunked in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLayout {
    Striped { rows_per_strip: u32 },
    Tiled { tile_width: u32, tile_height: u32 },
}

/// Everything needed to decode a raster, read from the first IFD.
#[derive(Debug, Clone)]
pub struct RasterInfo {
    pub width: u32,
    pub height: u32,
    pub band_count: usize,
    pub bit_depth: BitDepth,
    pub planar_config: PlanarConfig,
    pub layout: StorageLayout,
    pub compression: Compression,
    pub byte_order: ByteOrder,
    pub geo_tags: GeoTags,
    pub(crate) chunk_offsets: Vec<u64>,
    pub(crate) chunk_byte_counts: Vec<u64>,
}

impl RasterInfo {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Geographic bounds, when the file carries usable GeoTIFF tags.
    pub fn bounds(&self) -> Option<GeoBounds> {
        resolve_bounds(&self.geo_tags, self.width, self.height)
    }

    /// Number of strips or tiles covering one plane.
    fn chunks_per_plane(&self) -> usize {
        let (w, h) = (self.width as usize, self.height as usize);
        match self.layout {
            StorageLayout::Striped { rows_per_strip } => h.div_ceil(rows_per_strip as usize),
            StorageLayout::Tiled {
                tile_width,
                tile_height,
            } => w.div_ceil(tile_width as usize) * h.div_ceil(tile_height as usize),
        }
    }

    /// Decoded size of every band's samples in bytes, if it fits in memory.
    fn sample_bytes(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.band_count)?
            .checked_mul(self.bit_depth.bytes())
    }

    /// Reject headers whose chunk tables cannot hold the declared image.
    ///
    /// Dimensions come straight from the file, so they are checked against
    /// the listed chunks before any band buffer is sized from them.
    fn check_chunk_coverage(&self) -> Result<(), TiffError> {
        let planes = match self.planar_config {
            PlanarConfig::Separate => self.band_count,
            PlanarConfig::Contiguous => 1,
        };
        let needed_chunks = self
            .chunks_per_plane()
            .checked_mul(planes)
            .ok_or_else(|| TiffError::InvalidTag("chunk count overflows".into()))?;
        let listed = self.chunk_offsets.len().min(self.chunk_byte_counts.len());
        if listed < needed_chunks {
            return Err(TiffError::InvalidTag(format!(
                "{}x{} image needs {} chunks, {} listed",
                self.width, self.height, needed_chunks, listed
            )));
        }

        let needed = self.sample_bytes().ok_or_else(|| {
            TiffError::InvalidTag(format!(
                "{}x{}x{} samples overflow",
                self.width, self.height, self.band_count
            ))
        })? as u64;
        let stored = self.chunk_byte_counts[..needed_chunks]
            .iter()
            .fold(0u64, |acc, &c| acc.saturating_add(c));
        let capacity = match self.compression {
            Compression::None => stored,
            Compression::Deflate => stored.saturating_mul(MAX_DEFLATE_RATIO),
        };
        if capacity < needed {
            return Err(TiffError::Truncated(format!(
                "{} stored bytes cannot hold {} sample bytes",
                stored, needed
            )));
        }
        Ok(())
    }

    /// Load one chunk, inflated and in little-endian sample order.
    fn chunk(&self, data: &[u8], index: usize, expected_len: usize) -> Result<Vec<u8>, TiffError> {
        let (offset, count) = match (self.chunk_offsets.get(index), self.chunk_byte_counts.get(index)) {
            (Some(&o), Some(&c)) => (o as usize, c as usize),
            _ => {
                return Err(TiffError::InvalidTag(format!(
                    "no offset/byte count for chunk {} ({} listed)",
                    index,
                    self.chunk_offsets.len()
                )))
            }
        };

        let raw = offset
            .checked_add(count)
            .and_then(|end| data.get(offset..end))
            .ok_or_else(|| {
                TiffError::Truncated(format!(
                    "chunk {} at {}+{} exceeds file size {}",
                    index,
                    offset,
                    count,
                    data.len()
                ))
            })?;

        let mut buf = self.compression.decompress(raw, expected_len)?;
        if self.byte_order == ByteOrder::BigEndian {
            swap_to_little_endian(&mut buf, self.bit_depth);
        }
        Ok(buf)
    }
}

/// Deflate cannot expand its input by more than this factor.
const MAX_DEFLATE_RATIO: u64 = 1032;

/// Allocate a zeroed band, failing instead of aborting when memory runs out.
fn zeroed_band(len: usize) -> Result<Vec<f32>, TiffError> {
    let mut band = Vec::new();
    band.try_reserve_exact(len)
        .map_err(|_| TiffError::InvalidTag(format!("cannot allocate {} samples", len)))?;
    band.resize(len, 0.0);
    Ok(band)
}

/// Decoded band buffers plus optional running statistics.
#[derive(Debug, Clone)]
pub struct DecodedRaster {
    pub info: RasterInfo,
    /// One buffer of `width * height` samples per band, top row first.
    pub bands: Vec<Vec<f32>>,
    /// Per-band min/max of decoded samples, when tracking was requested.
    pub band_ranges: Option<Vec<ValueRange>>,
}

impl DecodedRaster {
    pub fn bounds(&self) -> Option<GeoBounds> {
        self.info.bounds()
    }
}

fn required_u32(ifd: &Ifd, tag: u16, name: &'static str) -> Result<u32, TiffError> {
    let value = ifd.first_u64(tag).ok_or(TiffError::MissingTag(name))?;
    u32::try_from(value).map_err(|_| TiffError::InvalidTag(format!("{} = {}", name, value)))
}

fn sample_depth(ifd: &Ifd) -> Result<BitDepth, TiffError> {
    let bits = ifd.first_u64(tags::BITS_PER_SAMPLE).unwrap_or(8);
    let depth = u16::try_from(bits)
        .ok()
        .and_then(BitDepth::from_bits)
        .ok_or_else(|| TiffError::InvalidTag(format!("BitsPerSample = {}", bits)))?;

    let format = ifd.first_u64(tags::SAMPLE_FORMAT);
    let supported = match depth {
        BitDepth::Eight | BitDepth::Sixteen => matches!(format, None | Some(1)),
        BitDepth::ThirtyTwo => matches!(format, None | Some(3)),
    };
    if !supported {
        return Err(TiffError::UnsupportedSampleLayout {
            bits: depth.bits(),
            format: format.unwrap_or(1) as u16,
        });
    }
    Ok(depth)
}

/// Parse the header and first IFD without touching pixel data.
pub fn parse_info(data: &[u8]) -> Result<RasterInfo, TiffError> {
    let header = parse_header(data)?;
    let ifd = parse_ifd(data, header.byte_order, header.first_ifd_offset as usize)?;

    let width = required_u32(&ifd, tags::IMAGE_WIDTH, "ImageWidth")?;
    let height = required_u32(&ifd, tags::IMAGE_LENGTH, "ImageLength")?;
    if width == 0 || height == 0 {
        return Err(TiffError::InvalidTag(format!("empty image {}x{}", width, height)));
    }

    let band_count = ifd.first_u64(tags::SAMPLES_PER_PIXEL).unwrap_or(1) as usize;
    if band_count == 0 {
        return Err(TiffError::InvalidTag("zero bands".into()));
    }

    let bit_depth = sample_depth(&ifd)?;
    let compression = Compression::from_code(ifd.first_u64(tags::COMPRESSION).unwrap_or(1) as u16)?;
    match ifd.first_u64(tags::PREDICTOR) {
        None | Some(1) => {}
        Some(p) => return Err(TiffError::UnsupportedPredictor(p as u16)),
    }
    let planar_config = PlanarConfig::from_code(ifd.first_u64(tags::PLANAR_CONFIG).unwrap_or(1))?;

    let (layout, chunk_offsets, chunk_byte_counts) = if ifd.contains(tags::TILE_WIDTH) {
        let tile_width = required_u32(&ifd, tags::TILE_WIDTH, "TileWidth")?;
        let tile_height = required_u32(&ifd, tags::TILE_LENGTH, "TileLength")?;
        if tile_width == 0 || tile_height == 0 {
            return Err(TiffError::InvalidTag("zero tile size".into()));
        }
        (tile_width as usize)
            .checked_mul(tile_height as usize)
            .and_then(|n| n.checked_mul(band_count))
            .and_then(|n| n.checked_mul(bit_depth.bytes()))
            .ok_or_else(|| {
                TiffError::InvalidTag(format!("tile {}x{} overflows", tile_width, tile_height))
            })?;
        (
            StorageLayout::Tiled {
                tile_width,
                tile_height,
            },
            ifd.u64s(tags::TILE_OFFSETS).ok_or(TiffError::MissingTag("TileOffsets"))?,
            ifd.u64s(tags::TILE_BYTE_COUNTS)
                .ok_or(TiffError::MissingTag("TileByteCounts"))?,
        )
    } else {
        let rows_per_strip = ifd
            .first_u64(tags::ROWS_PER_STRIP)
            .map(|r| r.clamp(1, height as u64) as u32)
            .unwrap_or(height);
        (
            StorageLayout::Striped { rows_per_strip },
            ifd.u64s(tags::STRIP_OFFSETS).ok_or(TiffError::MissingTag("StripOffsets"))?,
            ifd.u64s(tags::STRIP_BYTE_COUNTS)
                .ok_or(TiffError::MissingTag("StripByteCounts"))?,
        )
    };

    let info = RasterInfo {
        width,
        height,
        band_count,
        bit_depth,
        planar_config,
        layout,
        compression,
        byte_order: header.byte_order,
        geo_tags: GeoTags::from_ifd(&ifd),
        chunk_offsets,
        chunk_byte_counts,
    };

    info.check_chunk_coverage()?;

    debug!(
        width,
        height,
        bands = band_count,
        bits = bit_depth.bits(),
        layout = ?info.layout,
        planar = ?info.planar_config,
        "Parsed TIFF metadata"
    );
    Ok(info)
}

/// Running min/max per band.
struct RangeTracker {
    mins: Vec<f32>,
    maxs: Vec<f32>,
}

impl RangeTracker {
    fn new(bands: usize) -> Self {
        Self {
            mins: vec![f32::MAX; bands],
            maxs: vec![f32::MIN; bands],
        }
    }

    #[inline]
    fn update(&mut self, band: usize, value: f32) {
        if value < self.mins[band] {
            self.mins[band] = value;
        }
        if value > self.maxs[band] {
            self.maxs[band] = value;
        }
    }

    fn finish(self) -> Vec<ValueRange> {
        self.mins
            .into_iter()
            .zip(self.maxs)
            .map(|(min, max)| {
                // A band with no comparable samples (all NaN) reports [0, 0].
                if min > max {
                    ValueRange::new(0.0, 0.0)
                } else {
                    ValueRange::new(min, max)
                }
            })
            .collect()
    }
}

/// Decode every band of the raster described by `info`.
///
/// With `track_range`, per-band min/max is accumulated over every decoded
/// sample; callers that already know the authoritative range skip it.
pub fn decode_raster(data: &[u8], info: &RasterInfo, track_range: bool) -> Result<DecodedRaster, TiffError> {
    let (w, h) = (info.width as usize, info.height as usize);
    let spp = info.band_count;
    let depth = info.bit_depth;
    let per_plane = info.chunks_per_plane();

    let pixels = w
        .checked_mul(h)
        .ok_or_else(|| TiffError::InvalidTag(format!("{}x{} overflows", w, h)))?;
    let mut bands = (0..spp)
        .map(|_| zeroed_band(pixels))
        .collect::<Result<Vec<_>, _>>()?;
    let mut tracker = track_range.then(|| RangeTracker::new(spp));
    let mut store = |band: usize, pixel: usize, value: f32| {
        bands[band][pixel] = value;
        if let Some(t) = tracker.as_mut() {
            t.update(band, value);
        }
    };

    match (info.layout, info.planar_config) {
        (StorageLayout::Striped { rows_per_strip }, planar) => {
            let rps = rows_per_strip as usize;
            for strip in 0..per_plane {
                let first_row = strip * rps;
                let rows = rps.min(h - first_row);
                match planar {
                    PlanarConfig::Contiguous => {
                        let expected = rows * w * spp * depth.bytes();
                        let buf = info.chunk(data, strip, expected)?;
                        for r in 0..rows {
                            for x in 0..w {
                                let pixel = (first_row + r) * w + x;
                                for s in 0..spp {
                                    let idx = (r * w + x) * spp + s;
                                    store(s, pixel, decode_sample(&buf, idx, depth, buf.len()));
                                }
                            }
                        }
                    }
                    PlanarConfig::Separate => {
                        let expected = rows * w * depth.bytes();
                        for s in 0..spp {
                            let buf = info.chunk(data, s * per_plane + strip, expected)?;
                            for r in 0..rows {
                                for x in 0..w {
                                    let idx = r * w + x;
                                    store(s, first_row * w + idx, decode_sample(&buf, idx, depth, buf.len()));
                                }
                            }
                        }
                    }
                }
            }
        }
        (
            StorageLayout::Tiled {
                tile_width,
                tile_height,
            },
            planar,
        ) => {
            let (tw, th) = (tile_width as usize, tile_height as usize);
            let across = w.div_ceil(tw);
            for tile in 0..per_plane {
                let (ty, tx) = (tile / across, tile % across);
                // Pixels of edge tiles that fall outside the image are skipped.
                let cols = tw.min(w - tx * tw);
                let rows = th.min(h - ty * th);
                match planar {
                    PlanarConfig::Contiguous => {
                        let buf = info.chunk(data, tile, tw * th * spp * depth.bytes())?;
                        for py in 0..rows {
                            for px in 0..cols {
                                let pixel = (ty * th + py) * w + tx * tw + px;
                                for s in 0..spp {
                                    let idx = (py * tw + px) * spp + s;
                                    store(s, pixel, decode_sample(&buf, idx, depth, buf.len()));
                                }
                            }
                        }
                    }
                    PlanarConfig::Separate => {
                        for s in 0..spp {
                            let buf = info.chunk(data, s * per_plane + tile, tw * th * depth.bytes())?;
                            for py in 0..rows {
                                for px in 0..cols {
                                    let pixel = (ty * th + py) * w + tx * tw + px;
                                    store(s, pixel, decode_sample(&buf, py * tw + px, depth, buf.len()));
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(DecodedRaster {
        info: info.clone(),
        bands,
        band_ranges: tracker.map(RangeTracker::finish),
    })
}

/// Reads rasters through an injected [`SourceReader`].
#[derive(Clone)]
pub struct RasterReader {
    source: Arc<dyn SourceReader>,
}

impl RasterReader {
    pub fn new(source: Arc<dyn SourceReader>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn SourceReader> {
        &self.source
    }

    /// Metadata only; pixel chunks are not decoded.
    pub fn read_info(&self, path: &Path) -> RasterResult<RasterInfo> {
        let data = self.source.read(path)?;
        Ok(parse_info(&data)?)
    }

    /// Decode every band of the raster at `path`.
    pub fn read(&self, path: &Path, track_range: bool) -> RasterResult<DecodedRaster> {
        let data = self.source.read(path)?;
        let info = parse_info(&data)?;
        let decoded = decode_raster(&data, &info, track_range)?;

        info!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            bands = info.band_count,
            georeferenced = decoded.bounds().is_some(),
            "Decoded raster"
        );
        Ok(decoded)
    }
}
