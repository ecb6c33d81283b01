//! Error types for the render crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in render resource management.
///
/// Drawing calls never surface these; they are returned only by setup and
/// resource operations (surface allocation, image loading, pixel transfers).
#[derive(Error, Debug)]
pub enum RenderError {
    /// Invalid surface dimensions (zero or too large).
    #[error("invalid surface dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Failed to read or decode an image.
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The file extension does not name a supported image format.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(PathBuf),

    /// A pixel region falls entirely outside the surface.
    #[error("pixel region {x},{y} {width}x{height} is outside the surface")]
    RegionOutOfBounds { x: i32, y: i32, width: i32, height: i32 },

    /// Pixel data length does not match the stated dimensions.
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// The double buffer was used before `initialize`.
    #[error("double buffer not initialized")]
    NotInitialized,
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
