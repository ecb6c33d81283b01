//! CPU rasterizing render context.
//!
//! Paths are tessellated with lyon and the resulting triangles are sampled
//! at four points per pixel. Coverage from overlapping triangles of one path
//! is merged per sample, so shared edges never double-blend. Paints are
//! evaluated in user space at each pixel center.

use std::path::Path as FsPath;
use std::sync::Arc;

use ultracanvas_core::logging::targets;

use crate::context::{DrawCommand, FrameStats, PixelRegion, RenderContext};
use crate::error::RenderResult;
use crate::image::load_image;
use crate::paint::Paint;
use crate::path::{DEFAULT_TOLERANCE, Path, Tessellation, tessellate_fill, tessellate_stroke};
use crate::pixels::{PixelBuffer, Surface};
use crate::state::{ClipMask, RenderState, RenderStateStack};
use crate::text::{FixedAdvanceShaper, FontSpec, StyledText, TextLayout, TextShaper};
use crate::transform::Transform2D;
use crate::types::{Color, IntRect, Point, Rect};

/// Sample offsets within a pixel, one bit each.
const SAMPLES: [(f32, f32); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];

/// A render context drawing into an in-memory [`Surface`].
///
/// Every draw call is also recorded as a [`DrawCommand`] until the next
/// [`begin_frame`](RenderContext::begin_frame).
#[derive(Debug)]
pub struct SoftwareContext {
    surface: Surface,
    states: RenderStateStack,
    path: Path,
    shaper: Arc<dyn TextShaper>,
    commands: Vec<DrawCommand>,
    stats: FrameStats,
    in_frame: bool,
}

impl SoftwareContext {
    /// A context with deterministic text metrics.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        Self::with_shaper(width, height, Arc::new(FixedAdvanceShaper))
    }

    pub fn with_shaper(width: u32, height: u32, shaper: Arc<dyn TextShaper>) -> RenderResult<Self> {
        Ok(Self {
            surface: Surface::new(width, height)?,
            states: RenderStateStack::new(),
            path: Path::new(),
            shaper,
            commands: Vec::new(),
            stats: FrameStats::default(),
            in_frame: false,
        })
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    /// Whether a frame is open.
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Straight-alpha color of one device pixel.
    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        self.surface.pixel(x, y).map(Color::to_rgba8)
    }

    /// Pixels the current clip allows, as a device rectangle.
    fn drawable_region(&self, state: &RenderState) -> Option<IntRect> {
        let mut region = self.surface.bounds();
        if let Some(clip) = state.clip {
            region = region.intersect(&clip.round_out())?;
        }
        if let Some(mask) = &state.clip_mask {
            region = region.intersect(&mask.bounds())?;
        }
        Some(region)
    }

    /// Per-pixel sample masks for a tessellation, restricted to `region`.
    fn sample_masks(tess: &Tessellation, region: IntRect) -> Option<(IntRect, Vec<u8>)> {
        let mut min = Point::new(f32::INFINITY, f32::INFINITY);
        let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for v in &tess.vertices {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        let area = Rect::from_corners(min, max).round_out().intersect(&region)?;
        let mut masks = vec![0u8; area.width as usize * area.height as usize];

        for [a, b, c] in tess.triangles() {
            let twice_area = edge(a, b, c);
            if twice_area == 0.0 {
                continue;
            }
            let tri = Rect::from_corners(
                Point::new(a.x.min(b.x).min(c.x), a.y.min(b.y).min(c.y)),
                Point::new(a.x.max(b.x).max(c.x), a.y.max(b.y).max(c.y)),
            );
            let Some(bounds) = tri.round_out().intersect(&area) else {
                continue;
            };
            for py in bounds.y..bounds.bottom() {
                for px in bounds.x..bounds.right() {
                    let index = (py - area.y) as usize * area.width as usize + (px - area.x) as usize;
                    for (bit, (sx, sy)) in SAMPLES.iter().enumerate() {
                        let p = Point::new(px as f32 + sx, py as f32 + sy);
                        if inside(a, b, c, p, twice_area) {
                            masks[index] |= 1 << bit;
                        }
                    }
                }
            }
        }
        Some((area, masks))
    }

    /// Blend a tessellation with `paint`. Returns the pixels touched.
    fn fill_tessellation(&mut self, tess: &Tessellation, paint: &Paint) -> u64 {
        if tess.is_empty() {
            return 0;
        }
        let state = self.states.current().clone();
        let Some(region) = self.drawable_region(&state) else {
            return 0;
        };
        let Some((area, masks)) = Self::sample_masks(tess, region) else {
            return 0;
        };
        let inverse = state.transform.inverse();
        let mut touched = 0;
        for py in area.y..area.bottom() {
            for px in area.x..area.right() {
                let bits = masks[(py - area.y) as usize * area.width as usize + (px - area.x) as usize];
                if bits == 0 {
                    continue;
                }
                let coverage = bits.count_ones() as f32 / SAMPLES.len() as f32
                    * state.alpha
                    * state.clip_coverage(px, py);
                if coverage <= 0.0 {
                    continue;
                }
                let color = paint_color(paint, inverse.as_ref(), px, py);
                self.surface.blend(px, py, color, coverage);
                touched += 1;
            }
        }
        touched
    }

    fn fill_device_path(&mut self, path: &Path) {
        let paint = self.states.current().fill_paint.clone();
        let tess = tessellate_fill(path, DEFAULT_TOLERANCE);
        let pixels = self.fill_tessellation(&tess, &paint);
        self.stats.fills += 1;
        self.stats.pixels += pixels;
        if let Some(bounds) = path.extents() {
            self.commands.push(DrawCommand::FillPath {
                bounds,
                color: paint.approximate_color(),
                pattern: !paint.is_solid(),
            });
        }
    }

    fn stroke_device_path(&mut self, path: &Path) {
        let state = self.states.current();
        let paint = state.stroke_paint.clone();
        let scale = state.transform.average_scale();
        let width = state.stroke.width * scale;
        let stroke = state.stroke;
        let outline = match &state.dash {
            Some(dash) => path.dashed(dash, scale),
            None => path.clone(),
        };
        let tess = tessellate_stroke(&outline, &stroke, width, DEFAULT_TOLERANCE);
        let pixels = self.fill_tessellation(&tess, &paint);
        self.stats.strokes += 1;
        self.stats.pixels += pixels;
        if let Some(bounds) = path.extents() {
            self.commands.push(DrawCommand::StrokePath {
                bounds: bounds.inflate(width / 2.0),
                color: paint.approximate_color(),
                width,
            });
        }
    }

    /// Draw laid-out lines with the layout's origin at user `(x, y)`.
    fn draw_layout(&mut self, styled: &StyledText, layout: &TextLayout, x: f32, y: f32) {
        let state = self.states.current().clone();
        let style = &state.text_style;
        let inverse = state.transform.inverse();
        let metrics = self.shaper.metrics(&style.font(), style.line_height);
        let shaper = Arc::clone(&self.shaper);

        for line in layout.lines() {
            let mut pen = x + line.x;
            let top = y + line.top;
            for span in styled.spans_in(line.range.clone()) {
                let font = FontSpec::new(span.style.apply(&style.face), style.size);
                let run = &styled.text[span.range.clone()];
                let advance = shaper.advance(run, &font);
                shaper.rasterize(run, &font, style.line_height, &mut |gx, gy, coverage| {
                    let user = Rect::new(pen + gx as f32, top + gy as f32, 1.0, 1.0);
                    self.blend_user_rect(&state, inverse.as_ref(), user, coverage);
                });
                let thickness = (style.size / 14.0).max(1.0);
                if span.style.underline {
                    let uy = top + metrics.ascent + thickness;
                    self.fill_user_rect(&state, Rect::new(pen, uy, advance, thickness));
                }
                if span.style.strikethrough {
                    let sy = top + metrics.ascent - style.size * 0.3;
                    self.fill_user_rect(&state, Rect::new(pen, sy, advance, thickness));
                }
                pen += advance;
            }
        }
        self.stats.texts += 1;
    }

    /// Blend one glyph pixel given in user space.
    fn blend_user_rect(
        &mut self,
        state: &RenderState,
        inverse: Option<&Transform2D>,
        user: Rect,
        coverage: f32,
    ) {
        let device = state.transform.transform_rect(&user);
        let pixels = if state.transform.is_translation_only() {
            IntRect::new(device.left().floor() as i32, device.top().floor() as i32, 1, 1)
        } else {
            device.round_out()
        };
        for py in pixels.y..pixels.bottom() {
            for px in pixels.x..pixels.right() {
                let amount = coverage * state.alpha * state.clip_coverage(px, py);
                if amount > 0.0 {
                    let color = paint_color(&state.text_paint, inverse, px, py);
                    self.surface.blend(px, py, color, amount);
                    self.stats.pixels += 1;
                }
            }
        }
    }

    fn fill_user_rect(&mut self, state: &RenderState, rect: Rect) {
        let mut p = Path::with_transform(state.transform);
        p.rect(rect.left(), rect.top(), rect.width(), rect.height());
        let tess = tessellate_fill(&p, DEFAULT_TOLERANCE);
        self.stats.pixels += self.fill_tessellation(&tess, &state.text_paint);
    }

    fn device_origin(&self, x: f32, y: f32) -> Point {
        self.states.current().transform.transform_point(Point::new(x, y))
    }
}

/// Signed double area of `(a, b, p)`.
fn edge(a: Point, b: Point, p: Point) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn inside(a: Point, b: Point, c: Point, p: Point, orientation: f32) -> bool {
    let (w0, w1, w2) = (edge(b, c, p), edge(c, a, p), edge(a, b, p));
    if orientation > 0.0 {
        w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
    } else {
        w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
    }
}

fn paint_color(
    paint: &Paint,
    inverse: Option<&Transform2D>,
    px: i32,
    py: i32,
) -> Color {
    match (paint, inverse) {
        (Paint::Solid(color), _) => *color,
        (Paint::Pattern(_), Some(inv)) => {
            paint.color_at(inv.transform_point(Point::new(px as f32 + 0.5, py as f32 + 0.5)))
        }
        (Paint::Pattern(_), None) => paint.approximate_color(),
    }
}

impl RenderContext for SoftwareContext {
    fn begin_frame(&mut self) {
        self.commands.clear();
        self.states.reset();
        self.path.clear();
        self.stats = FrameStats::default();
        self.in_frame = true;
    }

    fn end_frame(&mut self) -> FrameStats {
        self.states.reset();
        self.path.clear();
        self.in_frame = false;
        tracing::trace!(
            target: targets::RENDER,
            fills = self.stats.fills,
            strokes = self.stats.strokes,
            texts = self.stats.texts,
            pixels = self.stats.pixels,
            "frame finished"
        );
        self.stats
    }

    fn size(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.surface.resize(width, height)
    }

    fn clear(&mut self, color: Color) {
        self.surface.clear(color);
        self.commands.push(DrawCommand::Clear(color));
    }

    fn recorded_commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    fn state_stack(&self) -> &RenderStateStack {
        &self.states
    }

    fn state_stack_mut(&mut self) -> &mut RenderStateStack {
        &mut self.states
    }

    fn clip_path(&mut self) {
        let path = std::mem::take(&mut self.path);
        let state = self.states.current().clone();
        let tess = tessellate_fill(&path, DEFAULT_TOLERANCE);
        let region = self.drawable_region(&state);
        let masks = region.and_then(|r| Self::sample_masks(&tess, r));

        let current = self.states.current_mut();
        let Some((area, bits)) = masks else {
            current.clip = Some(Rect::ZERO);
            current.clip_mask = None;
            return;
        };
        let mut mask = ClipMask::new(area);
        for py in area.y..area.bottom() {
            for px in area.x..area.right() {
                let b = bits[(py - area.y) as usize * area.width as usize + (px - area.x) as usize];
                mask.add(px, py, b.count_ones() as f32 / SAMPLES.len() as f32);
            }
        }
        if let Some(existing) = &current.clip_mask {
            mask.intersect(existing);
        }
        let bounds = area.to_rect();
        current.clip = Some(match current.clip {
            Some(clip) => clip.intersect(&bounds).unwrap_or(Rect::ZERO),
            None => bounds,
        });
        current.clip_mask = Some(Arc::new(mask));
    }

    fn path_mut(&mut self) -> &mut Path {
        let transform = self.states.current().transform;
        self.path.set_transform(transform);
        &mut self.path
    }

    fn current_path(&self) -> &Path {
        &self.path
    }

    fn fill_path(&mut self) {
        let path = std::mem::take(&mut self.path);
        self.fill_device_path(&path);
    }

    fn stroke_path(&mut self) {
        let path = std::mem::take(&mut self.path);
        self.stroke_device_path(&path);
    }

    fn fill_shape(&mut self, path: &Path) {
        self.fill_device_path(path);
    }

    fn stroke_shape(&mut self, path: &Path) {
        self.stroke_device_path(path);
    }

    fn text_shaper(&self) -> &dyn TextShaper {
        self.shaper.as_ref()
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32) {
        if text.is_empty() || !x.is_finite() || !y.is_finite() {
            return;
        }
        let styled = self.styled_text(text);
        let style = self.states.current().text_style.clone();
        let layout = TextLayout::new(self.shaper.as_ref(), &styled, &style, None);
        self.draw_layout(&styled, &layout, x, y);
        self.commands.push(DrawCommand::Text {
            text: styled.text.clone(),
            origin: self.device_origin(x, y),
            rect: None,
            style,
            color: self.states.current().text_paint.approximate_color(),
        });
    }

    fn draw_text_in_rect(&mut self, text: &str, x: f32, y: f32, w: f32, h: f32) {
        let rect = Rect::new(x, y, w, h);
        if text.is_empty() || !rect.is_finite() || rect.is_empty() {
            return;
        }
        let styled = self.styled_text(text);
        let style = self.states.current().text_style.clone();
        let mut layout = TextLayout::new(self.shaper.as_ref(), &styled, &style, Some(w));
        layout.align(&style, w, h);

        self.states.save();
        self.states.clip_rect(rect);
        self.draw_layout(&styled, &layout, x, y);
        self.states.restore();

        let transform = self.states.current().transform;
        self.commands.push(DrawCommand::Text {
            text: styled.text.clone(),
            origin: transform.transform_point(Point::new(x, y)),
            rect: Some(transform.transform_rect(&rect)),
            style,
            color: self.states.current().text_paint.approximate_color(),
        });
    }

    fn draw_image_region(&mut self, path: &FsPath, src: Option<Rect>, dest: Rect) -> bool {
        if !dest.is_finite() || dest.is_empty() {
            return false;
        }
        let image = match load_image(path) {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!(target: targets::RENDER, path = %path.display(), %err, "image not drawn");
                return false;
            }
        };
        let (iw, ih) = image.dimensions();
        let src = src
            .and_then(|s| s.intersect(&Rect::new(0.0, 0.0, iw as f32, ih as f32)))
            .unwrap_or(Rect::new(0.0, 0.0, iw as f32, ih as f32));

        let state = self.states.current().clone();
        let device = state.transform.transform_rect(&dest);
        let inverse = state.transform.inverse();
        if let (Some(region), Some(inv)) = (self.drawable_region(&state), inverse)
            && let Some(area) = device.round_out().intersect(&region)
        {
            for py in area.y..area.bottom() {
                for px in area.x..area.right() {
                    let user = inv.transform_point(Point::new(px as f32 + 0.5, py as f32 + 0.5));
                    if !dest.contains(user) {
                        continue;
                    }
                    let u = src.left() + (user.x - dest.left()) / dest.width() * src.width();
                    let v = src.top() + (user.y - dest.top()) / dest.height() * src.height();
                    let (sx, sy) = (u.floor() as u32, v.floor() as u32);
                    if sx >= iw || sy >= ih {
                        continue;
                    }
                    let [r, g, b, a] = image.get_pixel(sx, sy).0;
                    let coverage = state.alpha * state.clip_coverage(px, py);
                    self.surface.blend(px, py, Color::from_rgba8(r, g, b, a), coverage);
                    self.stats.pixels += 1;
                }
            }
        }
        self.stats.images += 1;
        self.commands.push(DrawCommand::Image {
            path: path.to_path_buf(),
            dest: device,
        });
        true
    }

    fn paint_pixel_buffer(&mut self, x: f32, y: f32, pixels: &PixelBuffer) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        let origin = self.device_origin(x, y);
        let (ox, oy) = (origin.x.round() as i32, origin.y.round() as i32);
        let state = self.states.current().clone();
        for row in 0..pixels.height() {
            for col in 0..pixels.width() {
                let Some([r, g, b, a]) = pixels.pixel(col, row) else {
                    continue;
                };
                let (px, py) = (ox + col as i32, oy + row as i32);
                let coverage = state.alpha * state.clip_coverage(px, py);
                self.surface.blend(px, py, Color::from_rgba8(r, g, b, a), coverage);
            }
        }
        self.commands.push(DrawCommand::PixelBuffer {
            rect: IntRect::new(ox, oy, pixels.width() as i32, pixels.height() as i32),
        });
    }

    fn save_pixel_region(&self, rect: IntRect) -> RenderResult<PixelRegion> {
        let (rect, pixels) = self.surface.read_region(rect)?;
        Ok(PixelRegion { rect, pixels })
    }

    fn restore_pixel_region(&mut self, region: &PixelRegion) {
        self.surface.write_region(region.rect.x, region.rect.y, &region.pixels);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{DashPattern, GradientStop};
    use crate::text::{FontWeight, TextAlignment, VerticalAlignment};

    fn ctx(w: u32, h: u32) -> SoftwareContext {
        let mut c = SoftwareContext::new(w, h).unwrap();
        c.begin_frame();
        c.clear(Color::WHITE);
        c
    }

    #[test]
    fn test_fill_rectangle_covers_pixels() {
        let mut c = ctx(20, 20);
        c.set_fill_color(Color::RED);
        c.fill_rectangle(5.0, 5.0, 10.0, 10.0);
        assert_eq!(c.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(c.pixel(2, 2), Some([255, 255, 255, 255]));
        // Shared triangle edges must not leave seams.
        assert_eq!(c.pixel(5, 14), Some([255, 0, 0, 255]));
        assert_eq!(c.pixel(14, 5), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_transform_applies_to_fill() {
        let mut c = ctx(20, 20);
        c.set_fill_color(Color::BLUE);
        c.translate(10.0, 10.0);
        c.fill_rectangle(0.0, 0.0, 5.0, 5.0);
        assert_eq!(c.pixel(12, 12), Some([0, 0, 255, 255]));
        assert_eq!(c.pixel(2, 2), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_clip_rect_limits_drawing() {
        let mut c = ctx(20, 20);
        c.set_fill_color(Color::BLACK);
        c.push_state();
        c.clip_rect(0.0, 0.0, 10.0, 20.0);
        c.fill_rectangle(0.0, 0.0, 20.0, 20.0);
        assert!(c.pop_state());
        assert_eq!(c.pixel(5, 5), Some([0, 0, 0, 255]));
        assert_eq!(c.pixel(15, 5), Some([255, 255, 255, 255]));
        assert!(c.clip_bounds().is_none());
    }

    #[test]
    fn test_clip_path_masks_circle() {
        let mut c = ctx(40, 40);
        c.circle(20.0, 20.0, 10.0);
        c.clip_path();
        assert!(c.current_path().is_empty());
        c.set_fill_color(Color::BLACK);
        c.fill_rectangle(0.0, 0.0, 40.0, 40.0);
        assert_eq!(c.pixel(20, 20), Some([0, 0, 0, 255]));
        // Corner of the bounding box lies outside the circle.
        assert_eq!(c.pixel(11, 11), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_stroke_scales_with_transform() {
        let mut c = ctx(40, 40);
        c.set_stroke_color(Color::BLACK);
        c.set_line_width(2.0);
        c.scale(2.0, 2.0);
        c.draw_line(0.0, 10.0, 20.0, 10.0);
        // 4px wide in device space, centered on y=20.
        assert_eq!(c.pixel(10, 18), Some([0, 0, 0, 255]));
        assert_eq!(c.pixel(10, 21), Some([0, 0, 0, 255]));
        assert_eq!(c.pixel(10, 23), Some([255, 255, 255, 255]));
        match &c.recorded_commands()[1] {
            DrawCommand::StrokePath { width, .. } => assert_eq!(*width, 4.0),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_dashed_stroke_leaves_gaps() {
        let mut c = ctx(40, 10);
        c.set_stroke_color(Color::BLACK);
        c.set_line_width(2.0);
        c.set_line_dash(Some(DashPattern::simple(5.0, 5.0)));
        c.draw_line(0.0, 5.0, 40.0, 5.0);
        assert_eq!(c.pixel(2, 5), Some([0, 0, 0, 255]));
        assert_eq!(c.pixel(7, 5), Some([255, 255, 255, 255]));
        assert_eq!(c.pixel(12, 5), Some([0, 0, 0, 255]));
    }

    fn untouched(c: &SoftwareContext) -> bool {
        let (w, h) = c.size();
        (0..h as i32).all(|y| (0..w as i32).all(|x| c.pixel(x, y) == Some([255, 255, 255, 255])))
    }

    #[test]
    fn test_dashed_stroke_under_zero_scale_draws_nothing() {
        let mut c = ctx(20, 20);
        c.set_stroke_color(Color::BLACK);
        c.set_line_dash(Some(DashPattern::simple(2.0, 2.0)));
        c.scale(0.0, 1.0);
        c.draw_line(0.0, 0.0, 0.0, 10.0);
        assert!(untouched(&c));
        assert_eq!(c.recorded_commands().len(), 2);
    }

    #[test]
    fn test_dashed_stroke_under_overflowing_scale_draws_nothing() {
        let mut c = ctx(20, 20);
        c.set_stroke_color(Color::BLACK);
        c.set_line_dash(Some(DashPattern::simple(2.0, 2.0)));
        c.scale(1.0e30, 1.0e30);
        c.scale(1.0e30, 1.0e30);
        c.draw_line(0.0, 0.0, 0.0, 10.0);
        assert!(untouched(&c));
        assert!(c.recorded_commands().len() <= 2);
    }

    #[test]
    fn test_nan_scale_leaves_dashes_intact() {
        let mut c = ctx(40, 10);
        c.set_stroke_color(Color::BLACK);
        c.set_line_width(2.0);
        c.set_line_dash(Some(DashPattern::simple(5.0, 5.0)));
        c.scale(f32::NAN, 1.0);
        c.scale(1.0, f32::INFINITY);
        c.draw_line(0.0, 5.0, 40.0, 5.0);
        assert_eq!(c.pixel(2, 5), Some([0, 0, 0, 255]));
        assert_eq!(c.pixel(7, 5), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_too_fine_dashes_on_long_line_stroke_solid() {
        let mut c = ctx(40, 10);
        c.set_stroke_color(Color::BLACK);
        c.set_line_width(2.0);
        c.set_line_dash(Some(DashPattern::simple(0.05, 0.05)));
        c.draw_line(0.0, 5.0, 2.0e7, 5.0);
        for x in [2, 7, 12, 37] {
            assert_eq!(c.pixel(x, 5), Some([0, 0, 0, 255]));
        }
        assert_eq!(c.recorded_commands().len(), 2);
    }

    #[test]
    fn test_global_alpha_blends() {
        let mut c = ctx(10, 10);
        c.set_alpha(0.5);
        c.set_fill_color(Color::BLACK);
        c.fill_rectangle(0.0, 0.0, 10.0, 10.0);
        let [r, _, _, a] = c.pixel(5, 5).unwrap();
        assert!((127..=128).contains(&r));
        assert_eq!(a, 255);
    }

    #[test]
    fn test_linear_gradient_varies_across_rect() {
        let mut c = ctx(100, 10);
        let pattern = c.create_linear_gradient_pattern(
            0.0,
            0.0,
            100.0,
            0.0,
            &[GradientStop::new(0.0, Color::BLACK), GradientStop::new(1.0, Color::WHITE)],
        );
        c.set_fill_paint(pattern.clone().into());
        c.fill_rectangle(0.0, 0.0, 100.0, 10.0);
        let left = c.pixel(1, 5).unwrap()[0];
        let right = c.pixel(98, 5).unwrap()[0];
        assert!(left < 10);
        assert!(right > 245);
        assert!(matches!(
            c.recorded_commands()[1],
            DrawCommand::FillPath { pattern: true, .. }
        ));
    }

    #[test]
    fn test_end_frame_releases_patterns() {
        let mut c = ctx(10, 10);
        let pattern = c.create_radial_gradient_pattern(
            5.0,
            5.0,
            0.0,
            5.0,
            5.0,
            5.0,
            &[GradientStop::new(0.0, Color::RED), GradientStop::new(1.0, Color::BLUE)],
        );
        c.push_state();
        c.set_fill_paint(pattern.clone().into());
        c.push_state();
        assert!(pattern.strong_count() > 1);
        c.end_frame();
        assert_eq!(pattern.strong_count(), 1);
    }

    #[test]
    fn test_draw_text_records_device_origin() {
        let mut c = ctx(100, 40);
        c.set_font_size(10.0);
        c.translate(5.0, 5.0);
        c.draw_text("Hi", 10.0, 3.0);
        let cmd = c.recorded_commands().last().unwrap();
        match cmd {
            DrawCommand::Text { text, origin, .. } => {
                assert_eq!(text, "Hi");
                assert_eq!(*origin, Point::new(15.0, 8.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
        // Box glyphs put ink inside the first glyph cell.
        assert_eq!(c.pixel(17, 12), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_markup_text_strips_tags() {
        let mut c = ctx(100, 20);
        c.set_text_is_markup(true);
        c.draw_text("<b>bold</b> text", 0.0, 0.0);
        assert_eq!(c.recorded_commands().last().unwrap().text(), Some("bold text"));
    }

    #[test]
    fn test_measure_text() {
        let mut c = ctx(10, 10);
        c.set_font_size(10.0);
        assert_eq!(c.measure_text(""), (0.0, 0.0));
        assert_eq!(c.measure_text("abc"), (18.0, 12.0));
        assert_eq!(c.measure_text("ab\ncdef"), (24.0, 24.0));
        c.set_font_weight(FontWeight::BOLD);
        assert_eq!(c.measure_text("abc").0, 18.0);
    }

    #[test]
    fn test_text_dimensions_wraps_and_caps() {
        let mut c = ctx(10, 10);
        c.set_font_size(10.0);
        assert_eq!(c.text_dimensions("hello world", 40.0, 0.0), (30.0, 24.0));
        assert_eq!(c.text_dimensions("hello world", 40.0, 15.0), (30.0, 15.0));
    }

    #[test]
    fn test_text_index_for_xy() {
        let mut c = ctx(10, 10);
        c.set_font_size(10.0);
        c.set_text_alignment(TextAlignment::Left, VerticalAlignment::Top);
        assert_eq!(c.text_index_for_xy("abcd", 0.0, 5.0, 100.0, 20.0), Some(0));
        assert_eq!(c.text_index_for_xy("abcd", 10.0, 5.0, 100.0, 20.0), Some(2));
        assert_eq!(c.text_index_for_xy("abcd", 90.0, 5.0, 100.0, 20.0), Some(4));
        assert_eq!(c.text_index_for_xy("", 0.0, 0.0, 100.0, 20.0), None);
        assert_eq!(c.text_index_for_xy("abcd", 200.0, 5.0, 100.0, 20.0), None);
    }

    #[test]
    fn test_text_in_rect_is_clipped() {
        let mut c = ctx(100, 40);
        c.set_font_size(10.0);
        c.draw_text_in_rect("wwwwwwwwwwwwwwwwwwww", 0.0, 0.0, 12.0, 12.0);
        // Nothing escapes the 12x12 box.
        for y in 0..40 {
            for x in 12..100 {
                assert_eq!(c.pixel(x, y), Some([255, 255, 255, 255]));
            }
        }
        assert_eq!(c.state_depth(), 0);
    }

    #[test]
    fn test_pixel_region_round_trip() {
        let mut c = ctx(20, 20);
        c.set_fill_color(Color::GREEN);
        c.fill_rectangle(0.0, 0.0, 10.0, 10.0);
        let saved = c.save_pixel_region(IntRect::new(0, 0, 10, 10)).unwrap();
        c.set_fill_color(Color::BLACK);
        c.fill_rectangle(0.0, 0.0, 20.0, 20.0);
        c.restore_pixel_region(&saved);
        assert_eq!(c.pixel(5, 5), Some([0, 255, 0, 255]));
        assert_eq!(c.pixel(15, 15), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_save_region_clamps() {
        let c = ctx(10, 10);
        let region = c.save_pixel_region(IntRect::new(-5, -5, 10, 10)).unwrap();
        assert_eq!(region.rect, IntRect::new(0, 0, 5, 5));
        assert!(c.save_pixel_region(IntRect::new(50, 50, 2, 2)).is_err());
    }

    #[test]
    fn test_paint_pixel_buffer() {
        let mut c = ctx(10, 10);
        let buf = PixelBuffer::from_rgba8(1, 1, vec![10, 20, 30, 255]).unwrap();
        c.paint_pixel_buffer(3.0, 4.0, &buf);
        assert_eq!(c.pixel(3, 4), Some([10, 20, 30, 255]));
    }

    #[test]
    fn test_missing_image_draws_nothing() {
        let mut c = ctx(10, 10);
        assert!(!c.draw_image(FsPath::new("/no/such/image.png"), 0.0, 0.0));
        assert!(!c.draw_image_in_rect(FsPath::new("/no/such/image.png"), 0.0, 0.0, 5.0, 5.0));
        assert_eq!(c.pixel(1, 1), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_cached_image_is_scaled() {
        let key = FsPath::new("in-memory/software-test.png");
        crate::image::ImageCache::global()
            .write()
            .insert(key, ::image::RgbaImage::from_pixel(2, 2, ::image::Rgba([0, 0, 255, 255])));
        let mut c = ctx(10, 10);
        assert!(c.draw_image_in_rect(key, 0.0, 0.0, 8.0, 8.0));
        assert_eq!(c.pixel(7, 7), Some([0, 0, 255, 255]));
        assert_eq!(c.pixel(9, 9), Some([255, 255, 255, 255]));
        crate::image::ImageCache::global().write().evict(key);
    }

    #[test]
    fn test_path_extents_in_user_space() {
        let mut c = ctx(10, 10);
        c.scale(2.0, 2.0);
        c.rect(1.0, 1.0, 2.0, 3.0);
        let ext = c.path_extents().unwrap();
        assert!((ext.left() - 1.0).abs() < 1e-4);
        assert!((ext.height() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_non_finite_input_is_ignored() {
        let mut c = ctx(10, 10);
        c.translate(f32::NAN, 0.0);
        assert!(c.current_transform().is_identity());
        c.move_to(f32::INFINITY, 0.0);
        assert!(c.current_path().is_empty());
    }
}
