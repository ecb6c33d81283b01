//! Off-screen staging with an explicit swap.
//!
//! Windows draw a frame into the staging context and call
//! [`DoubleBuffer::swap`] once the frame is complete. The front buffer only
//! ever holds finished frames, so a present never shows a partial one.

use std::sync::Arc;

use ultracanvas_core::logging::targets;

use crate::context::RenderContext;
use crate::error::{RenderError, RenderResult};
use crate::pixels::{PixelBuffer, Surface};
use crate::software::SoftwareContext;
use crate::text::TextShaper;

/// Staging/front buffer pair.
pub trait DoubleBuffer {
    /// Allocate both buffers.
    fn initialize(&mut self, width: u32, height: u32) -> RenderResult<()>;

    /// Reallocate both buffers; content is discarded.
    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()>;

    fn is_initialized(&self) -> bool;

    /// Buffer size, `(0, 0)` before initialization.
    fn size(&self) -> (u32, u32);

    /// The context frames are drawn into.
    fn staging_context(&mut self) -> Option<&mut dyn RenderContext>;

    /// Copy the staging content to the front buffer.
    fn swap(&mut self) -> RenderResult<()>;

    /// The last swapped frame as straight-alpha pixels.
    fn front_buffer(&self) -> Option<PixelBuffer>;
}

/// CPU double buffer built on [`SoftwareContext`].
#[derive(Debug)]
pub struct SoftwareDoubleBuffer {
    shaper: Arc<dyn TextShaper>,
    staging: Option<SoftwareContext>,
    front: Option<Surface>,
    swaps: u64,
}

impl SoftwareDoubleBuffer {
    pub fn new(shaper: Arc<dyn TextShaper>) -> Self {
        Self {
            shaper,
            staging: None,
            front: None,
            swaps: 0,
        }
    }

    /// The concrete staging context.
    pub fn staging(&mut self) -> Option<&mut SoftwareContext> {
        self.staging.as_mut()
    }

    /// Number of completed swaps.
    pub fn swap_count(&self) -> u64 {
        self.swaps
    }
}

impl DoubleBuffer for SoftwareDoubleBuffer {
    fn initialize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        let staging = SoftwareContext::with_shaper(width, height, Arc::clone(&self.shaper))?;
        self.front = Some(Surface::new(width, height)?);
        self.staging = Some(staging);
        tracing::debug!(target: targets::RENDER, width, height, "double buffer initialized");
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if self.size() == (width, height) {
            return Ok(());
        }
        self.initialize(width, height)
    }

    fn is_initialized(&self) -> bool {
        self.staging.is_some()
    }

    fn size(&self) -> (u32, u32) {
        self.staging.as_ref().map(|s| s.size()).unwrap_or((0, 0))
    }

    fn staging_context(&mut self) -> Option<&mut dyn RenderContext> {
        self.staging.as_mut().map(|s| s as &mut dyn RenderContext)
    }

    fn swap(&mut self) -> RenderResult<()> {
        let (Some(staging), Some(front)) = (self.staging.as_ref(), self.front.as_mut()) else {
            return Err(RenderError::NotInitialized);
        };
        front.copy_from(staging.surface());
        self.swaps += 1;
        Ok(())
    }

    fn front_buffer(&self) -> Option<PixelBuffer> {
        self.front.as_ref().map(Surface::to_pixel_buffer)
    }
}
