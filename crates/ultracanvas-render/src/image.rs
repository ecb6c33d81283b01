//! Process-wide decoded image cache.
//!
//! Images are keyed by path and decoded once into straight-alpha RGBA8. The
//! cache holds at most `max_size_bytes` of pixel data and drops the least
//! recently used entries beyond that.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use image::{ImageFormat, RgbaImage};
use parking_lot::RwLock;
use ultracanvas_core::logging::targets;

use crate::error::{RenderError, RenderResult};

/// Cache limits.
#[derive(Debug, Clone)]
pub struct ImageCacheConfig {
    pub max_size_bytes: usize,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 64 * 1024 * 1024,
        }
    }
}

impl ImageCacheConfig {
    #[must_use]
    pub fn with_max_size_mb(mut self, mb: usize) -> Self {
        self.max_size_bytes = mb * 1024 * 1024;
        self
    }
}

struct CacheEntry {
    image: Arc<RgbaImage>,
    bytes: usize,
    last_used: AtomicU64,
}

/// Decoded images keyed by path.
pub struct ImageCache {
    config: ImageCacheConfig,
    entries: HashMap<PathBuf, CacheEntry>,
    total_bytes: usize,
    clock: AtomicU64,
}

static GLOBAL: OnceLock<RwLock<ImageCache>> = OnceLock::new();

impl ImageCache {
    pub fn new(config: ImageCacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            total_bytes: 0,
            clock: AtomicU64::new(0),
        }
    }

    /// The shared cache used by render contexts.
    pub fn global() -> &'static RwLock<ImageCache> {
        GLOBAL.get_or_init(|| RwLock::new(ImageCache::new(ImageCacheConfig::default())))
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Cached image, refreshing its recency.
    pub fn get(&self, path: &Path) -> Option<Arc<RgbaImage>> {
        let entry = self.entries.get(path)?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        Some(Arc::clone(&entry.image))
    }

    /// Insert an already decoded image.
    pub fn insert(&mut self, path: impl Into<PathBuf>, image: RgbaImage) -> Arc<RgbaImage> {
        let path = path.into();
        let bytes = image.as_raw().len();
        let image = Arc::new(image);
        let entry = CacheEntry {
            image: Arc::clone(&image),
            bytes,
            last_used: AtomicU64::new(self.tick()),
        };
        if let Some(old) = self.entries.insert(path, entry) {
            self.total_bytes -= old.bytes;
        }
        self.total_bytes += bytes;
        self.trim();
        image
    }

    fn trim(&mut self) {
        while self.total_bytes > self.config.max_size_bytes && self.entries.len() > 1 {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used.load(Ordering::Relaxed))
                .map(|(p, _)| p.clone());
            match oldest {
                Some(path) => {
                    self.evict(&path);
                }
                None => break,
            }
        }
    }

    /// Remove one entry. Returns whether it was cached.
    pub fn evict(&mut self, path: &Path) -> bool {
        match self.entries.remove(path) {
            Some(entry) => {
                self.total_bytes -= entry.bytes;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn set_config(&mut self, config: ImageCacheConfig) {
        self.config = config;
        self.trim();
    }
}

/// Whether the path's extension names a format this build can decode.
pub fn is_format_supported(path: &Path) -> bool {
    ImageFormat::from_path(path)
        .map(|format| format.reading_enabled())
        .unwrap_or(false)
}

/// Load through the global cache.
pub fn load_image(path: &Path) -> RenderResult<Arc<RgbaImage>> {
    if let Some(image) = ImageCache::global().read().get(path) {
        return Ok(image);
    }
    if !is_format_supported(path) {
        return Err(RenderError::UnsupportedFormat(path.to_path_buf()));
    }
    let decoded = image::open(path)
        .map_err(|source| RenderError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    tracing::debug!(
        target: targets::RENDER,
        path = %path.display(),
        width = decoded.width(),
        height = decoded.height(),
        "image decoded"
    );
    Ok(ImageCache::global().write().insert(path, decoded))
}

/// Pixel size of an image, from the cache or the file header.
pub fn image_dimensions(path: &Path) -> Option<(u32, u32)> {
    if let Some(image) = ImageCache::global().read().get(path) {
        return Some(image.dimensions());
    }
    if !is_format_supported(path) {
        return None;
    }
    match image::image_dimensions(path) {
        Ok(dims) => Some(dims),
        Err(err) => {
            tracing::debug!(target: targets::RENDER, path = %path.display(), %err, "image header unreadable");
            None
        }
    }
}
