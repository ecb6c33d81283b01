//! The abstract 2D drawing API elements render through.
//!
//! [`RenderContext`] is object safe; windows hand elements a
//! `&mut dyn RenderContext`. Backends implement the primitive operations
//! (filling and stroking device-space paths, text, images, pixel transfer)
//! and get the path builder, transforms, state setters, shape helpers and
//! text measurement from default methods.
//!
//! Drawing calls never fail. Invalid input (non-finite coordinates,
//! degenerate paths, unreadable images) draws nothing.

use std::path::{Path as FsPath, PathBuf};

use crate::error::RenderResult;
use crate::image;
use crate::paint::{
    DashPattern, Gradient, GradientStop, LineCap, LineJoin, Paint, PatternHandle,
};
use crate::path::Path;
use crate::pixels::PixelBuffer;
use crate::state::{RenderState, RenderStateStack};
use crate::text::{
    FontFace, FontSlant, FontWeight, StyledText, TextAlignment, TextLayout, TextShaper,
    TextStyle, VerticalAlignment,
};
use crate::transform::Transform2D;
use crate::types::{Color, CornerRadii, IntRect, Point, Rect};

/// One recorded drawing operation, in device space.
///
/// Recording contexts keep the commands of the current frame so callers can
/// inspect what was drawn. Paint patterns are recorded as a representative
/// color so the log never extends a pattern's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    FillPath {
        bounds: Rect,
        color: Color,
        pattern: bool,
    },
    StrokePath {
        bounds: Rect,
        color: Color,
        width: f32,
    },
    Text {
        text: String,
        /// Top-left of the text box.
        origin: Point,
        /// Layout box for text drawn into a rectangle.
        rect: Option<Rect>,
        style: TextStyle,
        color: Color,
    },
    Image {
        path: PathBuf,
        dest: Rect,
    },
    PixelBuffer {
        rect: IntRect,
    },
}

impl DrawCommand {
    /// The text of a text command.
    pub fn text(&self) -> Option<&str> {
        match self {
            DrawCommand::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Per-frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub fills: u32,
    pub strokes: u32,
    pub texts: u32,
    pub images: u32,
    /// Pixels written by rasterization.
    pub pixels: u64,
}

/// A saved block of pixels, clamped to the surface it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelRegion {
    pub rect: IntRect,
    pub pixels: PixelBuffer,
}

/// Text dimensions for a single line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineDimensions {
    pub width: f32,
    pub height: f32,
    /// Distance from the line top to the baseline.
    pub baseline: f32,
}

/// The drawing API.
pub trait RenderContext {
    // Frame and surface

    /// Start a frame. Resets the state stack, the current path and the log.
    fn begin_frame(&mut self);

    /// Finish a frame, releasing every paint pattern the context holds.
    fn end_frame(&mut self) -> FrameStats;

    /// Backing surface size in device pixels.
    fn size(&self) -> (u32, u32);

    /// Resize the backing surface; content is discarded.
    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()>;

    /// Fill the whole surface, ignoring clip and transform.
    fn clear(&mut self, color: Color);

    /// Push pending drawing to the target.
    fn flush(&mut self) {}

    /// Commands recorded since `begin_frame`, for contexts that record.
    fn recorded_commands(&self) -> &[DrawCommand] {
        &[]
    }

    // State

    fn state_stack(&self) -> &RenderStateStack;

    fn state_stack_mut(&mut self) -> &mut RenderStateStack;

    fn state(&self) -> &RenderState {
        self.state_stack().current()
    }

    fn push_state(&mut self) {
        self.state_stack_mut().save();
    }

    /// Restore the last pushed state. Returns `false` if the stack was empty.
    fn pop_state(&mut self) -> bool {
        self.state_stack_mut().restore()
    }

    fn state_depth(&self) -> usize {
        self.state_stack().depth()
    }

    /// Pop until `depth` states remain.
    fn restore_state_depth(&mut self, depth: usize) {
        self.state_stack_mut().restore_to_depth(depth);
    }

    // Transforms

    fn current_transform(&self) -> Transform2D {
        self.state().transform
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        if tx.is_finite() && ty.is_finite() {
            self.state_stack_mut().translate(tx, ty);
        }
    }

    /// Rotate by `angle` radians.
    fn rotate(&mut self, angle: f32) {
        if angle.is_finite() {
            self.state_stack_mut().rotate(angle);
        }
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        if sx.is_finite() && sy.is_finite() {
            self.state_stack_mut().scale(sx, sy);
        }
    }

    /// Replace the transform with `(a, b, c, d, e, f)`.
    fn set_transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        let t = Transform2D::from_affine(a, b, c, d, e, f);
        if t.is_finite() {
            self.state_stack_mut().set_transform(t);
        }
    }

    /// Post-concatenate `(a, b, c, d, e, f)` onto the transform.
    fn transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        let t = Transform2D::from_affine(a, b, c, d, e, f);
        if t.is_finite() {
            self.state_stack_mut().concat(&t);
        }
    }

    fn reset_transform(&mut self) {
        self.state_stack_mut().set_transform(Transform2D::IDENTITY);
    }

    // Clipping

    /// Replace the clip with a rectangle.
    fn set_clip_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let r = Rect::new(x, y, w, h);
        if r.is_finite() {
            self.state_stack_mut().set_clip_rect(r);
        }
    }

    /// Intersect the clip with a rectangle.
    fn clip_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let r = Rect::new(x, y, w, h);
        if r.is_finite() {
            self.state_stack_mut().clip_rect(r);
        }
    }

    /// Intersect the clip with the current path, then clear the path.
    fn clip_path(&mut self);

    fn clear_clip_rect(&mut self) {
        self.state_stack_mut().clear_clip();
    }

    /// Device-space clip bounds, `None` when unclipped.
    fn clip_bounds(&self) -> Option<Rect> {
        self.state_stack().clip_bounds()
    }

    // Path

    /// The current path, with its transform synced to the state.
    fn path_mut(&mut self) -> &mut Path;

    fn current_path(&self) -> &Path;

    fn clear_path(&mut self) {
        self.path_mut().clear();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.path_mut().move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path_mut().line_to(x, y);
    }

    fn rel_line_to(&mut self, dx: f32, dy: f32) {
        self.path_mut().rel_line_to(dx, dy);
    }

    fn quadratic_curve_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.path_mut().quadratic_curve_to(cx, cy, x, y);
    }

    fn bezier_curve_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        self.path_mut().bezier_curve_to(c1x, c1y, c2x, c2y, x, y);
    }

    fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32) {
        self.path_mut().arc(cx, cy, radius, start, end);
    }

    fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) {
        self.path_mut().arc_to(x1, y1, x2, y2, radius);
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.path_mut().rect(x, y, w, h);
    }

    fn rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32) {
        self.path_mut()
            .rounded_rect(Rect::new(x, y, w, h), CornerRadii::uniform(radius));
    }

    fn circle(&mut self, cx: f32, cy: f32, radius: f32) {
        self.path_mut().circle(cx, cy, radius);
    }

    fn ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        self.path_mut().ellipse(cx, cy, rx, ry);
    }

    fn close_path(&mut self) {
        self.path_mut().close();
    }

    /// Fill the current path with the fill paint, then clear it.
    fn fill_path(&mut self);

    /// Stroke the current path with the stroke paint, then clear it.
    fn stroke_path(&mut self);

    /// User-space bounds of the current path.
    fn path_extents(&self) -> Option<Rect> {
        let device = self.current_path().extents()?;
        let inv = self.current_transform().inverse()?;
        Some(inv.transform_rect(&device))
    }

    /// Fill a standalone path without touching the current path.
    fn fill_shape(&mut self, path: &Path);

    /// Stroke a standalone path without touching the current path.
    fn stroke_shape(&mut self, path: &Path);

    // Shapes

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let mut p = Path::with_transform(self.current_transform());
        p.move_to(x1, y1).line_to(x2, y2);
        self.stroke_shape(&p);
    }

    fn draw_rectangle(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let mut p = Path::with_transform(self.current_transform());
        p.rect(x, y, w, h);
        self.stroke_shape(&p);
    }

    fn fill_rectangle(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let mut p = Path::with_transform(self.current_transform());
        p.rect(x, y, w, h);
        self.fill_shape(&p);
    }

    fn draw_rounded_rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32) {
        let mut p = Path::with_transform(self.current_transform());
        p.rounded_rect(Rect::new(x, y, w, h), CornerRadii::uniform(radius));
        self.stroke_shape(&p);
    }

    fn fill_rounded_rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32) {
        let mut p = Path::with_transform(self.current_transform());
        p.rounded_rect(Rect::new(x, y, w, h), CornerRadii::uniform(radius));
        self.fill_shape(&p);
    }

    fn draw_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        self.draw_ellipse(cx, cy, radius, radius);
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        self.fill_ellipse(cx, cy, radius, radius);
    }

    fn draw_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        let mut p = Path::with_transform(self.current_transform());
        p.ellipse(cx, cy, rx, ry);
        self.stroke_shape(&p);
    }

    fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        let mut p = Path::with_transform(self.current_transform());
        p.ellipse(cx, cy, rx, ry);
        self.fill_shape(&p);
    }

    /// Stroke an open arc.
    fn draw_arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32) {
        let mut p = Path::with_transform(self.current_transform());
        p.arc(cx, cy, radius, start, end);
        self.stroke_shape(&p);
    }

    /// Fill a pie slice.
    fn fill_arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32) {
        let mut p = Path::with_transform(self.current_transform());
        p.move_to(cx, cy).arc(cx, cy, radius, start, end).close();
        self.fill_shape(&p);
    }

    fn draw_bezier(&mut self, start: Point, c1: Point, c2: Point, end: Point) {
        let mut p = Path::with_transform(self.current_transform());
        p.move_to(start.x, start.y)
            .bezier_curve_to(c1.x, c1.y, c2.x, c2.y, end.x, end.y);
        self.stroke_shape(&p);
    }

    fn draw_line_path(&mut self, points: &[Point], closed: bool) {
        let mut p = Path::with_transform(self.current_transform());
        p.polyline(points, closed);
        self.stroke_shape(&p);
    }

    fn fill_line_path(&mut self, points: &[Point]) {
        let mut p = Path::with_transform(self.current_transform());
        p.polyline(points, true);
        self.fill_shape(&p);
    }

    // Paint and stroke style

    fn set_fill_paint(&mut self, paint: Paint) {
        self.state_stack_mut().current_mut().fill_paint = paint;
    }

    fn set_stroke_paint(&mut self, paint: Paint) {
        self.state_stack_mut().current_mut().stroke_paint = paint;
    }

    fn set_text_paint(&mut self, paint: Paint) {
        self.state_stack_mut().current_mut().text_paint = paint;
    }

    fn set_fill_color(&mut self, color: Color) {
        self.set_fill_paint(Paint::Solid(color));
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.set_stroke_paint(Paint::Solid(color));
    }

    fn set_text_color(&mut self, color: Color) {
        self.set_text_paint(Paint::Solid(color));
    }

    /// Global alpha, clamped to 0..=1.
    fn set_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() {
            self.state_stack_mut().current_mut().alpha = alpha.clamp(0.0, 1.0);
        }
    }

    fn create_linear_gradient_pattern(
        &self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stops: &[GradientStop],
    ) -> PatternHandle {
        PatternHandle::new(Gradient::linear(Point::new(x1, y1), Point::new(x2, y2), stops))
    }

    #[allow(clippy::too_many_arguments)]
    fn create_radial_gradient_pattern(
        &self,
        cx1: f32,
        cy1: f32,
        r1: f32,
        cx2: f32,
        cy2: f32,
        r2: f32,
        stops: &[GradientStop],
    ) -> PatternHandle {
        PatternHandle::new(Gradient::radial(
            Point::new(cx1, cy1),
            r1,
            Point::new(cx2, cy2),
            r2,
            stops,
        ))
    }

    fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width >= 0.0 {
            self.state_stack_mut().current_mut().stroke.width = width;
        }
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state_stack_mut().current_mut().stroke.cap = cap;
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.state_stack_mut().current_mut().stroke.join = join;
    }

    fn set_miter_limit(&mut self, limit: f32) {
        if limit.is_finite() {
            self.state_stack_mut().current_mut().stroke.miter_limit = limit.max(1.0);
        }
    }

    /// Set or clear the dash pattern. Invalid patterns clear it.
    fn set_line_dash(&mut self, dash: Option<DashPattern>) {
        self.state_stack_mut().current_mut().dash = dash.filter(DashPattern::is_valid);
    }

    // Text

    fn text_shaper(&self) -> &dyn TextShaper;

    fn set_font_face(&mut self, family: &str, weight: FontWeight, slant: FontSlant) {
        self.state_stack_mut().current_mut().text_style.face = FontFace::new(family, weight, slant);
    }

    fn set_font_size(&mut self, size: f32) {
        if size.is_finite() && size > 0.0 {
            self.state_stack_mut().current_mut().text_style.size = size;
        }
    }

    fn set_font_weight(&mut self, weight: FontWeight) {
        self.state_stack_mut().current_mut().text_style.face.weight = weight;
    }

    fn set_font_slant(&mut self, slant: FontSlant) {
        self.state_stack_mut().current_mut().text_style.face.slant = slant;
    }

    fn set_text_style(&mut self, style: TextStyle) {
        self.state_stack_mut().current_mut().text_style = style;
    }

    fn set_text_alignment(&mut self, horizontal: TextAlignment, vertical: VerticalAlignment) {
        let style = &mut self.state_stack_mut().current_mut().text_style;
        style.alignment = horizontal;
        style.vertical_alignment = vertical;
    }

    fn set_text_is_markup(&mut self, markup: bool) {
        self.state_stack_mut().current_mut().text_is_markup = markup;
    }

    /// Parse `text` according to the markup flag.
    fn styled_text(&self, text: &str) -> StyledText {
        if self.state().text_is_markup {
            StyledText::parse(text)
        } else {
            StyledText::plain(text)
        }
    }

    /// Draw text with its box's top-left corner at `(x, y)`. Newlines break.
    fn draw_text(&mut self, text: &str, x: f32, y: f32);

    /// Draw text wrapped and aligned inside a rectangle, clipped to it.
    fn draw_text_in_rect(&mut self, text: &str, x: f32, y: f32, w: f32, h: f32);

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.draw_text(text, x, y);
    }

    /// Draw text using the stroke paint.
    fn stroke_text(&mut self, text: &str, x: f32, y: f32) {
        let paint = self.state().stroke_paint.clone();
        self.push_state();
        self.set_text_paint(paint);
        self.draw_text(text, x, y);
        self.pop_state();
    }

    /// Unwrapped size of `text`; `(0, 0)` when empty.
    fn measure_text(&self, text: &str) -> (f32, f32) {
        if text.is_empty() {
            return (0.0, 0.0);
        }
        let styled = self.styled_text(text);
        let layout = TextLayout::new(self.text_shaper(), &styled, &self.state().text_style, None);
        (layout.width(), layout.height())
    }

    /// Width, height and baseline of `text` as one line.
    fn text_line_dimensions(&self, text: &str) -> LineDimensions {
        let style = &self.state().text_style;
        let metrics = self.text_shaper().metrics(&style.font(), style.line_height);
        let (width, _) = self.measure_text(&text.replace('\n', " "));
        LineDimensions {
            width,
            height: metrics.line_height,
            baseline: metrics.ascent,
        }
    }

    /// Size of `text` wrapped at `max_width`, with height capped at
    /// `max_height`. Non-positive limits mean unlimited.
    fn text_dimensions(&self, text: &str, max_width: f32, max_height: f32) -> (f32, f32) {
        if text.is_empty() {
            return (0.0, 0.0);
        }
        let styled = self.styled_text(text);
        let wrap = (max_width > 0.0).then_some(max_width);
        let layout = TextLayout::new(self.text_shaper(), &styled, &self.state().text_style, wrap);
        let height = if max_height > 0.0 {
            layout.height().min(max_height)
        } else {
            layout.height()
        };
        (layout.width(), height)
    }

    /// Byte index into `text` nearest to `(x, y)` for text laid out in a
    /// `w` x `h` box. `None` for empty text or a point outside the box.
    fn text_index_for_xy(&self, text: &str, x: f32, y: f32, w: f32, h: f32) -> Option<usize> {
        if text.is_empty() || x < 0.0 || y < 0.0 || x > w || y > h {
            return None;
        }
        let styled = self.styled_text(text);
        let style = &self.state().text_style;
        let mut layout = TextLayout::new(self.text_shaper(), &styled, style, Some(w));
        layout.align(style, w, h);
        let index = layout.index_at(self.text_shaper(), &styled, style, x, y)?;
        // Map back to the source string when markup was stripped.
        if self.state().text_is_markup {
            Some(StyledText::source_index(text, index))
        } else {
            Some(index)
        }
    }

    // Images

    /// Draw `src` (or the whole image) of the image at `path` into `dest`.
    /// Returns `false` if the image could not be loaded.
    fn draw_image_region(&mut self, path: &FsPath, src: Option<Rect>, dest: Rect) -> bool;

    /// Draw at natural size with the top-left at `(x, y)`.
    fn draw_image(&mut self, path: &FsPath, x: f32, y: f32) -> bool {
        match image::image_dimensions(path) {
            Some((w, h)) => self.draw_image_region(path, None, Rect::new(x, y, w as f32, h as f32)),
            None => false,
        }
    }

    /// Draw scaled into a rectangle.
    fn draw_image_in_rect(&mut self, path: &FsPath, x: f32, y: f32, w: f32, h: f32) -> bool {
        self.draw_image_region(path, None, Rect::new(x, y, w, h))
    }

    fn image_dimensions(&self, path: &FsPath) -> Option<(u32, u32)> {
        image::image_dimensions(path)
    }

    fn is_image_format_supported(&self, path: &FsPath) -> bool {
        image::is_format_supported(path)
    }

    // Pixel regions

    /// Composite straight-alpha pixels with their top-left at `(x, y)`.
    fn paint_pixel_buffer(&mut self, x: f32, y: f32, pixels: &PixelBuffer);

    /// Copy a device-space region out of the surface, clamped to it.
    fn save_pixel_region(&self, rect: IntRect) -> RenderResult<PixelRegion>;

    /// Write a saved region back exactly.
    fn restore_pixel_region(&mut self, region: &PixelRegion);
}
