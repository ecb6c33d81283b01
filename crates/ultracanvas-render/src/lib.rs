//! Rendering layer for UltraCanvas.
//!
//! Elements draw through the object-safe [`RenderContext`] trait. It carries
//! a cairo-like state machine: a save/restore stack of transform, clip,
//! paints, stroke style and text style, plus a current path that is filled,
//! stroked or used as a clip.
//!
//! [`SoftwareContext`] implements the trait on the CPU. Windows wrap it in a
//! [`SoftwareDoubleBuffer`] so only complete frames reach the screen.
//!
//! # Drawing
//!
//! ```
//! use ultracanvas_render::{Color, RenderContext, SoftwareContext};
//!
//! # fn main() -> ultracanvas_render::RenderResult<()> {
//! let mut ctx = SoftwareContext::new(64, 64)?;
//! ctx.begin_frame();
//! ctx.clear(Color::WHITE);
//!
//! ctx.push_state();
//! ctx.translate(16.0, 16.0);
//! ctx.set_fill_color(Color::RED);
//! ctx.fill_rectangle(0.0, 0.0, 32.0, 32.0);
//! ctx.pop_state();
//!
//! let stats = ctx.end_frame();
//! assert_eq!(stats.fills, 1);
//! assert_eq!(ctx.pixel(20, 20), Some([255, 0, 0, 255]));
//! # Ok(())
//! # }
//! ```
//!
//! # Gradients
//!
//! Gradient patterns are owned by the caller. A context holds a handle only
//! while the pattern is installed in its state and drops every handle at
//! [`RenderContext::end_frame`].

mod context;
mod double_buffer;
mod error;
pub mod image;
mod paint;
pub mod path;
mod pixels;
mod software;
mod state;
pub mod text;
mod transform;
mod types;

pub use context::{DrawCommand, FrameStats, LineDimensions, PixelRegion, RenderContext};
pub use double_buffer::{DoubleBuffer, SoftwareDoubleBuffer};
pub use error::{RenderError, RenderResult};
pub use image::{ImageCache, ImageCacheConfig};
pub use paint::{
    BoxShadow, DashPattern, Gradient, GradientStop, LineCap, LineJoin, Paint, PatternHandle,
    StrokeStyle,
};
pub use path::{Path, PathCommand};
pub use pixels::{MAX_SURFACE_DIMENSION, PixelBuffer, Surface};
pub use software::SoftwareContext;
pub use state::{ClipMask, RenderState, RenderStateStack};
pub use text::{
    FixedAdvanceShaper, FontFace, FontSlant, FontWeight, TextAlignment, TextShaper, TextStyle,
    VerticalAlignment,
};
pub use transform::Transform2D;
pub use types::{Color, CornerRadii, IntPoint, IntRect, Point, Rect, RoundedRect, Size};
