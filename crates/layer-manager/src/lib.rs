//! Layer construction, caching and orchestration for raster overlays.
//!
//! [`LayerManager`] is the entry point: it decodes TIFF/GeoTIFF files into
//! per-band and composite [`RasterLayer`](raster_common::RasterLayer)s,
//! caches them by source path, imports PNG overlays, and keeps the ordered
//! set of layers currently offered to the map.
//!
//! Decoding is synchronous; callers run it off any latency-sensitive thread.

pub mod cache;
pub mod config;
pub mod factory;
pub mod manager;
pub mod naming;
pub mod overlay;
pub mod zoom;

pub use cache::{CacheStats, LayerCache, LayerHandle, LayerSet};
pub use config::LayerManagerConfig;
pub use factory::{build_band_layer, build_composite, LayerFactory};
pub use manager::{LayerManager, LoadOptions};
pub use naming::{clean_layer_name, LayerNaming};
pub use overlay::{decode_overlay, OverlayOptions};
pub use zoom::{compute_fit_zoom, FitZoom, Viewport};
