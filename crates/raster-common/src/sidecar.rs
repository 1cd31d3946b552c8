//! Sidecar metadata written next to externally produced overlay PNGs.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::RasterResult;
use crate::layer::ValueRange;
use crate::source::SourceReader;

/// `{"min_val": .., "max_val": .., "is_single_band": ..}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlaySidecar {
    pub min_val: f32,
    pub max_val: f32,
    #[serde(default = "default_single_band")]
    pub is_single_band: bool,
}

fn default_single_band() -> bool {
    true
}

impl OverlaySidecar {
    pub fn from_json(json: &str) -> RasterResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Authoritative physical range of the overlay values.
    pub fn value_range(&self) -> ValueRange {
        ValueRange::new(self.min_val, self.max_val)
    }

    /// Paths checked for a sidecar, in order: `<path>.json`, then the path
    /// with its extension replaced by `.json`.
    pub fn candidate_paths(path: &Path) -> Vec<PathBuf> {
        let mut appended = OsString::from(path.as_os_str());
        appended.push(".json");
        let appended = PathBuf::from(appended);
        let swapped = path.with_extension("json");

        if swapped == appended || swapped == path {
            vec![appended]
        } else {
            vec![appended, swapped]
        }
    }

    /// Find and parse the sidecar for `path`.
    ///
    /// A malformed sidecar is logged and ignored so the caller falls back to
    /// its own range estimate.
    pub fn discover(reader: &dyn SourceReader, path: &Path) -> Option<Self> {
        for candidate in Self::candidate_paths(path) {
            if !reader.exists(&candidate) {
                continue;
            }
            let parsed = reader
                .read(&candidate)
                .and_then(|bytes| Self::from_json(&String::from_utf8_lossy(&bytes)));
            match parsed {
                Ok(sidecar) => {
                    debug!(path = %candidate.display(), min = sidecar.min_val, max = sidecar.max_val, "Using overlay sidecar");
                    return Some(sidecar);
                }
                Err(e) => {
                    warn!(path = %candidate.display(), error = %e, "Ignoring malformed sidecar");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySourceReader;

    #[test]
    fn test_candidate_paths() {
        let paths = OverlaySidecar::candidate_paths(Path::new("/out/ndvi.png"));
        assert_eq!(
            paths,
            vec![PathBuf::from("/out/ndvi.png.json"), PathBuf::from("/out/ndvi.json")]
        );
    }

    #[test]
    fn test_discover_prefers_appended_name() {
        let reader = MemorySourceReader::new();
        reader.insert("/out/ndvi.json", r#"{"min_val": -1.0, "max_val": 1.0}"#);
        reader.insert(
            "/out/ndvi.png.json",
            r#"{"min_val": -0.5, "max_val": 0.9, "is_single_band": false}"#,
        );
        let sidecar = OverlaySidecar::discover(&reader, Path::new("/out/ndvi.png")).unwrap();
        assert_eq!(sidecar.min_val, -0.5);
        assert!(!sidecar.is_single_band);
    }

    #[test]
    fn test_malformed_sidecar_is_ignored() {
        let reader = MemorySourceReader::new();
        reader.insert("/out/ndvi.png.json", "{not json");
        reader.insert("/out/ndvi.json", r#"{"min_val": -1.0, "max_val": 1.0}"#);
        let sidecar = OverlaySidecar::discover(&reader, Path::new("/out/ndvi.png")).unwrap();
        assert_eq!(sidecar.value_range(), ValueRange::new(-1.0, 1.0));
        assert!(sidecar.is_single_band);

        let only_bad = MemorySourceReader::new();
        only_bad.insert("/x.png.json", "[]");
        assert!(OverlaySidecar::discover(&only_bad, Path::new("/x.png")).is_none());
    }
}
