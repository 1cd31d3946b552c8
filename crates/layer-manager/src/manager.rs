//! Layer orchestration: decode, cache, active set, recoloring and export.

use raster_common::{
    FsSourceReader, GeoBounds, LayerSemantic, RasterError, RasterLayer, RasterResult, SourceReader,
};
use renderer::{encode_rgba_png, ColorMapper, GradientRegistry};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tiff_parser::RasterReader;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, LayerCache, LayerHandle, LayerSet};
use crate::config::LayerManagerConfig;
use crate::factory::LayerFactory;
use crate::naming::{clean_layer_name, LayerNaming};
use crate::overlay::{decode_overlay, OverlayOptions};
use crate::zoom::{FitZoom, Viewport};

fn read(handle: &LayerHandle) -> RwLockReadGuard<'_, RasterLayer> {
    handle.read().unwrap_or_else(|e| e.into_inner())
}

fn write(handle: &LayerHandle) -> RwLockWriteGuard<'_, RasterLayer> {
    handle.write().unwrap_or_else(|e| e.into_inner())
}

fn position(active: &[LayerHandle], name: &str) -> Option<usize> {
    active.iter().position(|h| read(h).name == name)
}

/// How a decoded raster enters the active layer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Drop every active layer before adding the loaded ones.
    pub clear_existing: bool,
    /// Band semantics; classified from each band's name when absent.
    ///
    /// Applied when the file is decoded. A cached file keeps the semantics
    /// it was first loaded with until it is unloaded.
    pub semantic: Option<LayerSemantic>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            clear_existing: true,
            semantic: None,
        }
    }
}

impl LoadOptions {
    pub fn appending(mut self) -> Self {
        self.clear_existing = false;
        self
    }

    pub fn with_semantic(mut self, semantic: LayerSemantic) -> Self {
        self.semantic = Some(semantic);
        self
    }
}

/// Owns the decode cache and the ordered set of layers offered to the map.
///
/// Loading the same path twice returns the same handles without decoding
/// again. Decode failures leave both the cache and the active set untouched.
pub struct LayerManager {
    config: LayerManagerConfig,
    reader: RasterReader,
    source: Arc<dyn SourceReader>,
    mapper: ColorMapper,
    factory: LayerFactory,
    fit: FitZoom,
    cache: LayerCache,
    active: RwLock<Vec<LayerHandle>>,
}

impl LayerManager {
    pub fn new(
        config: LayerManagerConfig,
        source: Arc<dyn SourceReader>,
        registry: Arc<GradientRegistry>,
    ) -> RasterResult<Self> {
        config.validate().map_err(RasterError::InvalidConfig)?;

        let mapper = ColorMapper::new(registry).with_absolute_ranges(config.absolute_ranges.clone());
        let factory = LayerFactory::new(LayerNaming::new(
            config.name_prefix.clone(),
            config.band_names.clone(),
        ));
        info!(
            presets = mapper.registry().len(),
            max_zoom = config.max_zoom,
            prefix = %config.name_prefix,
            "Layer manager ready"
        );

        Ok(Self {
            reader: RasterReader::new(Arc::clone(&source)),
            fit: config.fit_zoom(),
            config,
            source,
            mapper,
            factory,
            cache: LayerCache::new(),
            active: RwLock::new(Vec::new()),
        })
    }

    /// Filesystem-backed manager with the built-in gradient presets.
    pub fn from_fs(config: LayerManagerConfig) -> RasterResult<Self> {
        Self::new(
            config,
            Arc::new(FsSourceReader),
            Arc::new(GradientRegistry::with_presets()),
        )
    }

    pub fn config(&self) -> &LayerManagerConfig {
        &self.config
    }

    pub fn registry(&self) -> &GradientRegistry {
        self.mapper.registry()
    }

    pub fn cache(&self) -> &LayerCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn active(&self) -> RwLockReadGuard<'_, Vec<LayerHandle>> {
        self.active.read().unwrap_or_else(|e| e.into_inner())
    }

    fn active_mut(&self) -> RwLockWriteGuard<'_, Vec<LayerHandle>> {
        self.active.write().unwrap_or_else(|e| e.into_inner())
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Decode `path` into band and composite layers, or return the cached set.
    ///
    /// With `clear_existing` the active set is replaced by the loaded layers;
    /// otherwise layers whose names are already active are skipped.
    pub fn load_path(&self, path: impl AsRef<Path>, clear_existing: bool) -> RasterResult<LayerSet> {
        let options = LoadOptions {
            clear_existing,
            ..LoadOptions::default()
        };
        self.load_path_with(path, options)
    }

    /// [`load_path`](Self::load_path) with explicit [`LoadOptions`].
    pub fn load_path_with(&self, path: impl AsRef<Path>, options: LoadOptions) -> RasterResult<LayerSet> {
        let path = path.as_ref();
        let set = match self.cache.get(path) {
            Some(set) => {
                debug!(path = %path.display(), layers = set.len(), "Cache hit");
                set
            }
            None => {
                debug!(path = %path.display(), "Cache miss, decoding");
                let decoded = self.reader.read(path, true)?;
                let layers = self.factory.build_all_with(&decoded, path, options.semantic)?;
                self.cache.record_decode();
                self.cache.insert(path, layers)
            }
        };

        let mut active = self.active_mut();
        if options.clear_existing {
            active.clear();
        }
        let mut skipped = Vec::new();
        for handle in set.iter() {
            let name = read(handle).name.clone();
            if position(&active, &name).is_some() {
                skipped.push(name);
                continue;
            }
            active.push(Arc::clone(handle));
        }
        if !skipped.is_empty() {
            warn!(
                path = %path.display(),
                skipped = ?skipped,
                "Layers with these names are already active, not added"
            );
        }
        Ok(set)
    }

    /// Drop the cached layers of `path` and remove them from the active set.
    pub fn unload(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let Some(set) = self.cache.remove(path) else {
            return false;
        };
        self.active_mut()
            .retain(|h| !set.iter().any(|cached| Arc::ptr_eq(cached, h)));
        info!(path = %path.display(), layers = set.len(), "Unloaded raster");
        true
    }

    /// Georeferenced bounds from the header alone; pixels are not decoded.
    pub fn peek_bounds(&self, path: impl AsRef<Path>) -> RasterResult<Option<GeoBounds>> {
        Ok(self.reader.read_info(path.as_ref())?.bounds())
    }

    /// `(lat, lon)` center of [`peek_bounds`](Self::peek_bounds).
    pub fn peek_center(&self, path: impl AsRef<Path>) -> RasterResult<Option<(f64, f64)>> {
        Ok(self.peek_bounds(path)?.map(|b| b.center()))
    }

    /// Import a PNG overlay placed at `bounds`.
    ///
    /// A preview replaces any earlier preview. Any other name that is already
    /// active is not imported again and the existing handle is returned.
    pub fn import_overlay(
        &self,
        png_path: impl AsRef<Path>,
        bounds: GeoBounds,
        options: OverlayOptions,
    ) -> RasterResult<LayerHandle> {
        let png_path = png_path.as_ref();
        let name = if options.preview {
            self.config.preview_name.clone()
        } else {
            let raw = match &options.layer_name {
                Some(custom) => custom.clone(),
                None => png_path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            };
            clean_layer_name(raw.trim()).to_string()
        };
        if name.is_empty() {
            return Err(RasterError::InvalidConfig(format!(
                "{}: overlay has no usable name",
                png_path.display()
            )));
        }

        if !options.preview && !options.clear_existing {
            if let Some(existing) = self.layer(&name) {
                debug!(layer = %name, "Overlay already active, skipping");
                return Ok(existing);
            }
        }

        let layer = decode_overlay(
            self.source.as_ref(),
            png_path,
            &name,
            bounds,
            options.semantic,
            &self.config.absolute_ranges,
        )?;
        let handle: LayerHandle = Arc::new(RwLock::new(layer));

        let mut active = self.active_mut();
        if options.clear_existing {
            active.clear();
        } else if let Some(idx) = position(&active, &name) {
            if options.preview {
                active.remove(idx);
            } else {
                return Ok(Arc::clone(&active[idx]));
            }
        }
        active.push(Arc::clone(&handle));

        info!(path = %png_path.display(), layer = %name, preview = options.preview, "Imported overlay");
        Ok(handle)
    }

    // =========================================================================
    // Active set
    // =========================================================================

    /// Active layers in display order.
    pub fn layers(&self) -> Vec<LayerHandle> {
        self.active().clone()
    }

    pub fn layer_names(&self) -> Vec<String> {
        self.active().iter().map(|h| read(h).name.clone()).collect()
    }

    pub fn layer(&self, name: &str) -> Option<LayerHandle> {
        let active = self.active();
        position(&active, name).map(|idx| Arc::clone(&active[idx]))
    }

    fn require(&self, name: &str) -> RasterResult<LayerHandle> {
        self.layer(name).ok_or_else(|| RasterError::layer_not_found(name))
    }

    pub fn visible_layers(&self) -> Vec<LayerHandle> {
        self.active()
            .iter()
            .filter(|h| read(h).is_visible)
            .cloned()
            .collect()
    }

    pub fn set_visibility(&self, name: &str, visible: bool) -> RasterResult<()> {
        let handle = self.require(name)?;
        write(&handle).is_visible = visible;
        debug!(layer = name, visible, "Set visibility");
        Ok(())
    }

    /// Remove a layer from the active set. Cached copies are kept.
    pub fn remove_layer(&self, name: &str) -> RasterResult<LayerHandle> {
        let mut active = self.active_mut();
        let idx = position(&active, name).ok_or_else(|| RasterError::layer_not_found(name))?;
        debug!(layer = name, "Removed layer");
        Ok(active.remove(idx))
    }

    /// Rename an active layer. The new name must not already be active.
    pub fn rename_layer(&self, old: &str, new: &str) -> RasterResult<()> {
        let new = new.trim();
        if new.is_empty() {
            return Err(RasterError::InvalidConfig("layer name must not be empty".to_string()));
        }
        let active = self.active();
        let idx = position(&active, old).ok_or_else(|| RasterError::layer_not_found(old))?;
        if old != new && position(&active, new).is_some() {
            return Err(RasterError::DuplicateLayer(new.to_string()));
        }
        write(&active[idx]).name = new.to_string();
        debug!(from = old, to = new, "Renamed layer");
        Ok(())
    }

    /// Empty the active set. The cache is not touched.
    pub fn clear_layers(&self) {
        let mut active = self.active_mut();
        debug!(layers = active.len(), "Cleared layers");
        active.clear();
    }

    pub fn layer_bounds(&self, name: &str) -> RasterResult<GeoBounds> {
        let handle = self.require(name)?;
        let bounds = read(&handle).bounds;
        bounds.ok_or_else(|| RasterError::MissingGeoreference(name.to_string()))
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Recolor a single-band layer with a registry preset, or grayscale for `None`.
    pub fn set_gradient(&self, name: &str, gradient: Option<&str>) -> RasterResult<()> {
        let handle = self.require(name)?;
        let mut layer = write(&handle);
        self.mapper.apply_gradient(&mut layer, gradient)
    }

    /// PNG of a layer's current display buffer, north up.
    pub fn export_png(&self, name: &str) -> RasterResult<Vec<u8>> {
        let handle = self.require(name)?;
        let (pixels, width, height) = {
            let layer = read(&handle);
            (layer.display(), layer.width, layer.height)
        };
        encode_rgba_png(&pixels, width, height)
    }

    // =========================================================================
    // Zoom
    // =========================================================================

    pub fn fit_zoom(&self, bounds: Option<&GeoBounds>, viewport: Viewport) -> u8 {
        self.fit.fit(bounds, viewport)
    }

    /// Fit zoom for the union of the bounds of all active layers.
    pub fn fit_zoom_for(&self, viewport: Viewport) -> u8 {
        let union = self
            .active()
            .iter()
            .filter_map(|h| read(h).bounds)
            .filter(GeoBounds::is_valid)
            .reduce(|acc, b| acc.union(&b));
        if union.is_none() {
            warn!("No georeferenced layers active, using unplaced zoom");
        }
        self.fit_zoom(union.as_ref(), viewport)
    }
}
