//! Layer naming.

use std::path::Path;

/// Markers appended by external processing tools before a timestamp.
const GENERATED_SUFFIXES: &[&str] = &["_custom_", "_transformed_"];

/// Strip a trailing `_custom_<stamp>` or `_transformed_<stamp>` from a name.
///
/// `NDWI_transformed_20240101120000` becomes `NDWI`.
pub fn clean_layer_name(name: &str) -> &str {
    for marker in GENERATED_SUFFIXES {
        if let Some(idx) = name.find(marker) {
            if idx > 0 {
                return &name[..idx];
            }
        }
    }
    name
}

/// How layers built from one file are named.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerNaming {
    pub prefix: String,
    pub band_names: Vec<String>,
}

impl LayerNaming {
    pub fn new(prefix: impl Into<String>, band_names: Vec<String>) -> Self {
        Self {
            prefix: prefix.into(),
            band_names,
        }
    }

    /// Naming for layers of `source`.
    ///
    /// An empty prefix is replaced by the cleaned file stem, so bands of
    /// different files get distinct names.
    pub fn for_source(&self, source: &Path) -> LayerNaming {
        if !self.prefix.trim().is_empty() {
            return self.clone();
        }
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(clean_layer_name(stem.trim()), self.band_names.clone())
    }

    fn prefixed(&self, name: &str) -> String {
        let prefix = self.prefix.trim();
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{} {}", prefix, name)
        }
    }

    /// Configured name of band `index`, else `Band {index + 1}`.
    pub fn band(&self, index: usize) -> String {
        match self.band_names.get(index).map(|n| n.trim()) {
            Some(custom) if !custom.is_empty() => self.prefixed(custom),
            _ => self.prefixed(&format!("Band {}", index + 1)),
        }
    }

    pub fn composite(&self) -> String {
        self.prefixed("RGB Composite")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_layer_name() {
        assert_eq!(clean_layer_name("NDWI_transformed_20240101120000"), "NDWI");
        assert_eq!(clean_layer_name("field_custom_20231105"), "field");
        assert_eq!(clean_layer_name("Band 1"), "Band 1");
        // A bare marker is not a suffix.
        assert_eq!(clean_layer_name("_custom_x"), "_custom_x");
    }

    #[test]
    fn test_band_names() {
        let naming = LayerNaming::new("", vec!["Blue".into(), "".into()]);
        assert_eq!(naming.band(0), "Blue");
        assert_eq!(naming.band(1), "Band 2");
        assert_eq!(naming.band(5), "Band 6");
        assert_eq!(naming.composite(), "RGB Composite");
    }

    #[test]
    fn test_prefix() {
        let naming = LayerNaming::new("Farm A", vec!["NIR".into()]);
        assert_eq!(naming.band(0), "Farm A NIR");
        assert_eq!(naming.band(1), "Farm A Band 2");
        assert_eq!(naming.composite(), "Farm A RGB Composite");
    }

    // ========================================================================
    // Per-source naming
    // ========================================================================

    #[test]
    fn test_for_source_uses_stem() {
        let naming = LayerNaming::default().for_source(Path::new("/data/east_field.tif"));
        assert_eq!(naming.band(0), "east_field Band 1");
        assert_eq!(naming.composite(), "east_field RGB Composite");

        let cleaned = LayerNaming::default().for_source(Path::new("NDWI_transformed_20240101.tif"));
        assert_eq!(cleaned.band(0), "NDWI Band 1");
    }

    #[test]
    fn test_for_source_keeps_configured_prefix() {
        let naming = LayerNaming::new("Farm A", vec![]).for_source(Path::new("east_field.tif"));
        assert_eq!(naming.band(0), "Farm A Band 1");
    }

    #[test]
    fn test_for_source_without_stem() {
        let naming = LayerNaming::default().for_source(Path::new(""));
        assert_eq!(naming.band(0), "Band 1");
    }
}
