//! Byte sources for raster files.
//!
//! Decoding never touches the filesystem directly; it asks a [`SourceReader`]
//! for the bytes of a path. Production code uses [`FsSourceReader`], tests
//! use [`MemorySourceReader`].

use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::{RasterError, RasterResult};

/// Gives the full contents of a source path.
pub trait SourceReader: Send + Sync {
    /// Read every byte of `path`. A missing path is `RasterError::NotFound`.
    fn read(&self, path: &Path) -> RasterResult<Bytes>;

    /// Whether `path` can be read.
    fn exists(&self, path: &Path) -> bool;
}

/// Reads from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
    fn read(&self, path: &Path) -> RasterResult<Bytes> {
        std::fs::read(path).map(Bytes::from).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RasterError::NotFound(path.display().to_string()),
            _ => RasterError::Io(format!("{}: {}", path.display(), e)),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory files keyed by path, counting reads.
#[derive(Debug, Default)]
pub struct MemorySourceReader {
    files: RwLock<HashMap<PathBuf, Bytes>>,
    reads: AtomicUsize,
}

impl MemorySourceReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, data: impl Into<Bytes>) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(path.into(), data.into());
    }

    pub fn remove(&self, path: &Path) -> Option<Bytes> {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.remove(path)
    }

    /// Number of successful `read` calls so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl SourceReader for MemorySourceReader {
    fn read(&self, path: &Path) -> RasterResult<Bytes> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        let data = files
            .get(path)
            .cloned()
            .ok_or_else(|| RasterError::NotFound(path.display().to_string()))?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(data)
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.contains_key(path)
    }
}
