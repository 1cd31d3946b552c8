//! TIFF and GeoTIFF decoding for raster overlays.
//!
//! Reads baseline TIFF structure (header, first IFD, strips or tiles,
//! contiguous or separate planes) and turns every band into a float buffer
//! with running statistics. GeoTIFF tiepoint/scale and transformation tags
//! are resolved into geographic bounds.
//!
//! Supported samples: 8- and 16-bit unsigned integers, 32-bit IEEE float.
//! Supported compression: none, Deflate.

pub mod compression;
pub mod error;
pub mod georef;
pub mod ifd;
pub mod pixel;
pub mod reader;

pub use compression::Compression;
pub use error::TiffError;
pub use georef::{resolve_bounds, GeoTags};
pub use ifd::{parse_header, parse_ifd, ByteOrder, Ifd, TagValue, TiffHeader};
pub use pixel::{decode_sample, BitDepth};
pub use reader::{decode_raster, parse_info, DecodedRaster, PlanarConfig, RasterInfo, RasterReader, StorageLayout};
