//! Raster inspection tool.
//!
//! Loads TIFF/GeoTIFF files (and PNG overlays placed with `--bounds`)
//! through the layer manager, logs what was decoded, and optionally writes
//! every layer out as a north-up PNG.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use layer_manager::{LayerManager, LayerManagerConfig, OverlayOptions, Viewport};
use raster_common::{FsSourceReader, GeoBounds};
use renderer::GradientRegistry;

#[derive(Parser, Debug)]
#[command(name = "raster-inspect")]
#[command(about = "Decode rasters and report layers, bounds and fit zoom")]
struct Args {
    /// TIFF/GeoTIFF files, or PNG overlays when --bounds is given
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Custom band names, in band order
    #[arg(long, env = "RASTER_BAND_NAMES", value_delimiter = ',')]
    band_names: Vec<String>,

    /// Prefix for every layer name
    #[arg(long, env = "RASTER_NAME_PREFIX")]
    prefix: Option<String>,

    /// Gradient applied to single-band layers before export
    #[arg(short, long)]
    gradient: Option<String>,

    /// JSON file of gradient presets (replaces the built-in ones)
    #[arg(long)]
    gradients_file: Option<PathBuf>,

    /// Bounds for PNG overlays as north,south,west,east
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    bounds: Option<Vec<f64>>,

    /// Write each layer as PNG into this directory
    #[arg(short, long)]
    export_dir: Option<PathBuf>,

    /// Viewport used for the fit-zoom report, as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x800")]
    viewport: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

fn parse_viewport(s: &str) -> Result<Viewport> {
    let (w, h) = s
        .split_once(|c: char| c == 'x' || c == 'X')
        .with_context(|| format!("viewport must be WIDTHxHEIGHT, got {:?}", s))?;
    let width: f64 = w.trim().parse().context("viewport width")?;
    let height: f64 = h.trim().parse().context("viewport height")?;
    if width <= 0.0 || height <= 0.0 {
        bail!("viewport must be positive, got {}", s);
    }
    Ok(Viewport::new(width, height))
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

/// File name for an exported layer.
fn export_name(layer: &str) -> String {
    let stem: String = layer
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}.png", stem)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if args.json {
        let subscriber = FmtSubscriber::builder().with_max_level(level).json().finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    let viewport = parse_viewport(&args.viewport)?;

    let mut config = LayerManagerConfig::from_env();
    if !args.band_names.is_empty() {
        config.band_names = args.band_names.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.name_prefix = prefix.clone();
    }

    let registry = match &args.gradients_file {
        Some(path) => GradientRegistry::from_file(path)
            .with_context(|| format!("loading gradients from {}", path.display()))?,
        None => GradientRegistry::with_presets(),
    };
    if let Some(name) = &args.gradient {
        if !registry.contains(name) {
            let known: Vec<&str> = registry.names().collect();
            bail!("unknown gradient {:?}; available: {}", name, known.join(", "));
        }
    }

    let overlay_bounds = match args.bounds.as_deref() {
        None => None,
        Some(&[north, south, west, east]) => Some(GeoBounds::new(north, south, west, east)),
        Some(other) => bail!("--bounds takes 4 values, got {}", other.len()),
    };

    let manager = LayerManager::new(config, Arc::new(FsSourceReader), Arc::new(registry))?;
    info!(paths = args.paths.len(), "Starting raster inspection");

    for path in &args.paths {
        if is_png(path) {
            let Some(bounds) = overlay_bounds else {
                warn!(path = %path.display(), "Skipping PNG overlay without --bounds");
                continue;
            };
            manager
                .import_overlay(path, bounds, OverlayOptions::default().appending())
                .with_context(|| format!("importing overlay {}", path.display()))?;
            continue;
        }

        match manager.peek_center(path) {
            Ok(Some((lat, lon))) => info!(path = %path.display(), lat, lon, "Raster center"),
            Ok(None) => warn!(path = %path.display(), "Raster has no georeference"),
            Err(e) => warn!(path = %path.display(), error = %e, "Could not read raster header"),
        }
        manager
            .load_path(path, false)
            .with_context(|| format!("loading {}", path.display()))?;
    }

    if let Some(dir) = &args.export_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    for handle in manager.layers() {
        let (name, single_band) = {
            let layer = handle.read().unwrap_or_else(|e| e.into_inner());
            let bounds = layer.bounds.map(|b| serde_json::to_string(&b)).transpose()?;
            info!(
                layer = %layer.name,
                width = layer.width,
                height = layer.height,
                min = layer.value_range.min,
                max = layer.value_range.max,
                semantic = layer.semantic.key(),
                bounds = bounds.as_deref().unwrap_or("none"),
                "Layer"
            );
            (layer.name.clone(), layer.is_single_band())
        };

        if single_band {
            if let Some(gradient) = &args.gradient {
                manager.set_gradient(&name, Some(gradient))?;
            }
        }

        if let Some(dir) = &args.export_dir {
            let target = dir.join(export_name(&name));
            let png = manager.export_png(&name)?;
            std::fs::write(&target, &png).with_context(|| format!("writing {}", target.display()))?;
            info!(layer = %name, path = %target.display(), bytes = png.len(), "Exported layer");
        }
    }

    let stats = manager.cache_stats();
    info!(
        layers = manager.layers().len(),
        fit_zoom = manager.fit_zoom_for(viewport),
        cached_files = stats.entries,
        decodes = stats.decodes,
        cached_samples = stats.cached_samples,
        "Inspection complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewport() {
        let v = parse_viewport("1024x768").unwrap();
        assert_eq!((v.width, v.height), (1024.0, 768.0));
        assert!(parse_viewport("1024").is_err());
        assert!(parse_viewport("0x10").is_err());
    }

    #[test]
    fn test_export_name() {
        assert_eq!(export_name("Field RGB Composite"), "Field_RGB_Composite.png");
        assert_eq!(export_name("NDVI/2024"), "NDVI_2024.png");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "raster-inspect",
            "--bounds",
            "50,49,10,11",
            "--band-names",
            "Red,NIR",
            "a.tif",
        ]);
        assert_eq!(args.bounds, Some(vec![50.0, 49.0, 10.0, 11.0]));
        assert_eq!(args.band_names, vec!["Red", "NIR"]);
        assert_eq!(args.paths, vec![PathBuf::from("a.tif")]);
    }
}
