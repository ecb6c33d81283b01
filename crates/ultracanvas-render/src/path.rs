//! The current-path model and lyon tessellation.
//!
//! A [`Path`] records segments in device space: every coordinate passed to a
//! builder method is mapped through the path's transform at the time of the
//! call, so later transform changes do not move segments already added. This
//! mirrors how a drawing context's current path behaves.

use lyon::math::point as lyon_point;
use lyon::path::iterator::PathIterator;
use lyon::path::{Path as LyonPath, PathEvent};
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, FillVertexConstructor,
    LineCap as LyonLineCap, LineJoin as LyonLineJoin, StrokeOptions, StrokeTessellator,
    StrokeVertex, StrokeVertexConstructor, VertexBuffers,
};

use ultracanvas_core::logging::targets;

use crate::paint::{DashPattern, LineCap, LineJoin, StrokeStyle};
use crate::transform::Transform2D;
use crate::types::{CornerRadii, Point, Rect};

/// Flattening tolerance in device pixels.
pub const DEFAULT_TOLERANCE: f32 = 0.1;

/// Upper bound on the pieces a dashed stroke is split into.
pub const MAX_DASH_SEGMENTS: usize = 100_000;

const TAU: f32 = std::f32::consts::TAU;
const FRAC_PI_2: f32 = std::f32::consts::FRAC_PI_2;

/// A single recorded path segment, in device space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { control: Point, end: Point },
    CubicTo { control1: Point, control2: Point, end: Point },
    Close,
}

impl PathCommand {
    /// Whether every point is finite. An overflowing transform can map
    /// finite input to infinity.
    pub fn is_finite(&self) -> bool {
        match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => finite(&[p.x, p.y]),
            PathCommand::QuadTo { control, end } => finite(&[control.x, control.y, end.x, end.y]),
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => finite(&[control1.x, control1.y, control2.x, control2.y, end.x, end.y]),
            PathCommand::Close => true,
        }
    }
}

/// A path under construction.
///
/// Builder methods silently ignore non-finite input.
#[derive(Debug, Clone, Default)]
pub struct Path {
    commands: Vec<PathCommand>,
    transform: Transform2D,
    current: Option<Point>,
    subpath_start: Option<Point>,
}

fn finite(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite())
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty path whose input is mapped through `transform`.
    pub fn with_transform(transform: Transform2D) -> Self {
        Self {
            transform,
            ..Self::default()
        }
    }

    /// Set the user-to-device transform applied to subsequent input.
    pub fn set_transform(&mut self, transform: Transform2D) {
        self.transform = transform;
    }

    pub fn transform(&self) -> &Transform2D {
        &self.transform
    }

    /// Remove all segments.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.current = None;
        self.subpath_start = None;
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Current point in device space.
    pub fn current_point(&self) -> Option<Point> {
        self.current
    }

    /// Current point mapped back to user space.
    pub fn current_user_point(&self) -> Option<Point> {
        let inv = self.transform.inverse()?;
        self.current.map(|p| inv.transform_point(p))
    }

    fn map(&self, x: f32, y: f32) -> Point {
        self.transform.transform_point(Point::new(x, y))
    }

    fn move_device(&mut self, p: Point) {
        self.commands.push(PathCommand::MoveTo(p));
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    fn line_device(&mut self, p: Point) {
        if self.current.is_none() {
            self.move_device(p);
            return;
        }
        self.commands.push(PathCommand::LineTo(p));
        self.current = Some(p);
    }

    /// Make sure a subpath is open, starting at `p` when there is none.
    fn ensure_subpath(&mut self, p: Point) {
        if self.current.is_none() {
            self.move_device(p);
        }
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        if finite(&[x, y]) {
            let p = self.map(x, y);
            self.move_device(p);
        }
        self
    }

    /// Line to a point. Without a current point this starts a subpath instead.
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        if finite(&[x, y]) {
            let p = self.map(x, y);
            self.line_device(p);
        }
        self
    }

    /// Line relative to the current point. Ignored without a current point.
    pub fn rel_line_to(&mut self, dx: f32, dy: f32) -> &mut Self {
        if let Some(cur) = self.current
            && finite(&[dx, dy])
        {
            let (vx, vy) = self.transform.transform_vector(dx, dy);
            self.line_device(Point::new(cur.x + vx, cur.y + vy));
        }
        self
    }

    pub fn quadratic_curve_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        if finite(&[cx, cy, x, y]) {
            let control = self.map(cx, cy);
            let end = self.map(x, y);
            self.ensure_subpath(control);
            self.commands.push(PathCommand::QuadTo { control, end });
            self.current = Some(end);
        }
        self
    }

    pub fn bezier_curve_to(
        &mut self,
        c1x: f32,
        c1y: f32,
        c2x: f32,
        c2y: f32,
        x: f32,
        y: f32,
    ) -> &mut Self {
        if finite(&[c1x, c1y, c2x, c2y, x, y]) {
            let control1 = self.map(c1x, c1y);
            let control2 = self.map(c2x, c2y);
            let end = self.map(x, y);
            self.ensure_subpath(control1);
            self.commands.push(PathCommand::CubicTo {
                control1,
                control2,
                end,
            });
            self.current = Some(end);
        }
        self
    }

    /// Append elliptical arc segments in user space, starting with a line from
    /// the current point to the arc's start.
    fn elliptic_arc(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, start: f32, sweep: f32) {
        let at = |a: f32| (cx + rx * a.cos(), cy + ry * a.sin());
        let (sx, sy) = at(start);
        let start_dev = self.map(sx, sy);
        if self.current != Some(start_dev) {
            self.line_device(start_dev);
        }
        if sweep == 0.0 || (rx == 0.0 && ry == 0.0) {
            return;
        }

        let segments = (sweep.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
        let step = sweep / segments as f32;
        let k = 4.0 / 3.0 * (step / 4.0).tan();
        let mut a0 = start;
        for _ in 0..segments {
            let a1 = a0 + step;
            let (p0x, p0y) = at(a0);
            let (p3x, p3y) = at(a1);
            let c1 = (p0x - k * rx * a0.sin(), p0y + k * ry * a0.cos());
            let c2 = (p3x + k * rx * a1.sin(), p3y - k * ry * a1.cos());
            let control1 = self.map(c1.0, c1.1);
            let control2 = self.map(c2.0, c2.1);
            let end = self.map(p3x, p3y);
            self.commands.push(PathCommand::CubicTo {
                control1,
                control2,
                end,
            });
            self.current = Some(end);
            a0 = a1;
        }
    }

    /// Circular arc around `(cx, cy)` from `start` to `end` radians, with
    /// increasing angle.
    pub fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32) -> &mut Self {
        if !finite(&[cx, cy, radius, start, end]) || radius < 0.0 {
            return self;
        }
        let mut sweep = end - start;
        if sweep < 0.0 {
            sweep = sweep.rem_euclid(TAU);
        }
        // Full turns collapse to a single circle.
        sweep = sweep.min(TAU);
        self.elliptic_arc(cx, cy, radius, radius, start, sweep);
        self
    }

    /// Arc tangent to the lines (current, p1) and (p1, p2).
    pub fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) -> &mut Self {
        if !finite(&[x1, y1, x2, y2, radius]) || radius < 0.0 {
            return self;
        }
        let Some(p0) = self.current_user_point() else {
            self.move_to(x1, y1);
            return self;
        };
        let (v1x, v1y) = (p0.x - x1, p0.y - y1);
        let (v2x, v2y) = (x2 - x1, y2 - y1);
        let len1 = v1x.hypot(v1y);
        let len2 = v2x.hypot(v2y);
        let cross = v1x * v2y - v1y * v2x;
        if radius == 0.0 || len1 < 1e-6 || len2 < 1e-6 || cross.abs() < 1e-6 {
            self.line_to(x1, y1);
            return self;
        }

        let (u1x, u1y) = (v1x / len1, v1y / len1);
        let (u2x, u2y) = (v2x / len2, v2y / len2);
        let angle = (u1x * u2x + u1y * u2y).clamp(-1.0, 1.0).acos();
        let tangent = radius / (angle / 2.0).tan();
        let (t1x, t1y) = (x1 + u1x * tangent, y1 + u1y * tangent);
        let (t2x, t2y) = (x1 + u2x * tangent, y1 + u2y * tangent);

        let (bx, by) = (u1x + u2x, u1y + u2y);
        let blen = bx.hypot(by);
        let center_dist = radius / (angle / 2.0).sin();
        let (cx, cy) = (x1 + bx / blen * center_dist, y1 + by / blen * center_dist);

        let a0 = (t1y - cy).atan2(t1x - cx);
        let a1 = (t2y - cy).atan2(t2x - cx);
        let mut sweep = a1 - a0;
        if sweep > std::f32::consts::PI {
            sweep -= TAU;
        } else if sweep < -std::f32::consts::PI {
            sweep += TAU;
        }
        self.elliptic_arc(cx, cy, radius, radius, a0, sweep);
        self
    }

    pub fn close(&mut self) -> &mut Self {
        if self.current.is_some() {
            self.commands.push(PathCommand::Close);
            self.current = self.subpath_start;
        }
        self
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) -> &mut Self {
        if finite(&[x, y, w, h]) {
            self.move_to(x, y)
                .line_to(x + w, y)
                .line_to(x + w, y + h)
                .line_to(x, y + h)
                .close();
        }
        self
    }

    pub fn rounded_rect(&mut self, rect: Rect, radii: CornerRadii) -> &mut Self {
        if !rect.is_finite() {
            return self;
        }
        let r = radii.clamped_to(&rect);
        if r.is_zero() {
            return self.rect(rect.left(), rect.top(), rect.width(), rect.height());
        }
        let (l, t, rt, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
        let pi = std::f32::consts::PI;

        self.move_to(l + r.top_left, t);
        self.corner(rt - r.top_right, t + r.top_right, r.top_right, -FRAC_PI_2);
        self.corner(rt - r.bottom_right, b - r.bottom_right, r.bottom_right, 0.0);
        self.corner(l + r.bottom_left, b - r.bottom_left, r.bottom_left, FRAC_PI_2);
        self.corner(l + r.top_left, t + r.top_left, r.top_left, pi);
        self.close()
    }

    fn corner(&mut self, cx: f32, cy: f32, r: f32, start: f32) {
        if r <= 0.0 {
            self.line_to(cx + r * start.cos(), cy + r * start.sin());
        } else {
            self.elliptic_arc(cx, cy, r, r, start, FRAC_PI_2);
        }
    }

    pub fn circle(&mut self, cx: f32, cy: f32, radius: f32) -> &mut Self {
        self.ellipse(cx, cy, radius, radius)
    }

    pub fn ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) -> &mut Self {
        if !finite(&[cx, cy, rx, ry]) || rx <= 0.0 || ry <= 0.0 {
            return self;
        }
        self.move_to(cx + rx, cy);
        self.elliptic_arc(cx, cy, rx, ry, 0.0, TAU);
        self.close()
    }

    /// Append a polyline, optionally closed.
    pub fn polyline(&mut self, points: &[Point], close: bool) -> &mut Self {
        let mut iter = points.iter().filter(|p| p.is_finite());
        if let Some(first) = iter.next() {
            self.move_to(first.x, first.y);
            for p in iter {
                self.line_to(p.x, p.y);
            }
            if close {
                self.close();
            }
        }
        self
    }

    /// Convert to a lyon path. A path with any non-finite point converts empty.
    pub fn to_lyon(&self) -> LyonPath {
        let mut builder = LyonPath::builder();
        if !self.commands.iter().all(PathCommand::is_finite) {
            return builder.build();
        }
        let mut open = false;
        let mut last = Point::ZERO;
        let mut start = Point::ZERO;

        let lp = |p: Point| lyon_point(p.x, p.y);
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => {
                    if open {
                        builder.end(false);
                    }
                    builder.begin(lp(p));
                    open = true;
                    last = p;
                    start = p;
                }
                PathCommand::LineTo(p) => {
                    if !open {
                        builder.begin(lp(last));
                        open = true;
                    }
                    builder.line_to(lp(p));
                    last = p;
                }
                PathCommand::QuadTo { control, end } => {
                    if !open {
                        builder.begin(lp(last));
                        open = true;
                    }
                    builder.quadratic_bezier_to(lp(control), lp(end));
                    last = end;
                }
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => {
                    if !open {
                        builder.begin(lp(last));
                        open = true;
                    }
                    builder.cubic_bezier_to(lp(control1), lp(control2), lp(end));
                    last = end;
                }
                PathCommand::Close => {
                    if open {
                        builder.end(true);
                        open = false;
                    }
                    last = start;
                }
            }
        }
        if open {
            builder.end(false);
        }
        builder.build()
    }

    /// Flatten into polylines, one per subpath, with a closed flag.
    pub fn flatten(&self, tolerance: f32) -> Vec<(Vec<Point>, bool)> {
        let lyon_path = self.to_lyon();
        let mut out = Vec::new();
        let mut current: Vec<Point> = Vec::new();
        for event in lyon_path.iter().flattened(tolerance) {
            match event {
                PathEvent::Begin { at } => {
                    current = vec![Point::new(at.x, at.y)];
                }
                PathEvent::Line { to, .. } => current.push(Point::new(to.x, to.y)),
                PathEvent::End { close, .. } => {
                    out.push((std::mem::take(&mut current), close));
                }
                // Flattening yields only lines.
                PathEvent::Quadratic { to, .. } | PathEvent::Cubic { to, .. } => {
                    current.push(Point::new(to.x, to.y));
                }
            }
        }
        out
    }

    /// Tight device-space bounds of the flattened path.
    pub fn extents(&self) -> Option<Rect> {
        let mut min = Point::new(f32::INFINITY, f32::INFINITY);
        let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        let mut any = false;
        for (points, _) in self.flatten(DEFAULT_TOLERANCE) {
            for p in points {
                any = true;
                min.x = min.x.min(p.x);
                min.y = min.y.min(p.y);
                max.x = max.x.max(p.x);
                max.y = max.y.max(p.y);
            }
        }
        any.then(|| Rect::from_corners(min, max))
    }

    /// Split into dash segments. Lengths are scaled by `scale` to device units.
    ///
    /// A pattern that collapses to nothing in device space yields an empty
    /// path. One that would need more than [`MAX_DASH_SEGMENTS`] pieces is
    /// stroked solid instead.
    pub fn dashed(&self, dash: &DashPattern, scale: f32) -> Path {
        let mut out = Path::new();
        if !dash.is_valid() {
            return self.clone();
        }
        let mut pattern: Vec<f32> = dash.pattern.iter().map(|v| v * scale).collect();
        if pattern.len() % 2 == 1 {
            pattern.extend_from_within(..);
        }
        let total: f32 = pattern.iter().sum();
        let start_offset = dash.offset * scale;
        if !total.is_finite() || total <= f32::EPSILON || !start_offset.is_finite() {
            return out;
        }

        let subpaths = self.flatten(DEFAULT_TOLERANCE);
        let length: f64 = subpaths
            .iter()
            .flat_map(|(points, _)| points.windows(2))
            .map(|seg| f64::from((seg[1].x - seg[0].x).hypot(seg[1].y - seg[0].y)))
            .sum();
        let pieces = length / f64::from(total) * pattern.len() as f64;
        if !pieces.is_finite() || pieces > MAX_DASH_SEGMENTS as f64 {
            tracing::debug!(target: targets::RENDER, pieces, "dash pattern too fine, stroking solid");
            return self.clone();
        }

        for (mut points, closed) in subpaths {
            if closed && let Some(first) = points.first().copied() {
                points.push(first);
            }
            // Every subpath restarts the pattern at the offset.
            let mut index = 0;
            let mut remaining = pattern[0];
            let mut offset = start_offset.rem_euclid(total);
            for _ in 0..pattern.len() {
                if offset <= 0.0 {
                    break;
                }
                if offset >= remaining {
                    offset -= remaining;
                    index = (index + 1) % pattern.len();
                    remaining = pattern[index];
                } else {
                    remaining -= offset;
                    offset = 0.0;
                }
            }

            let mut drawing = false;
            for seg in points.windows(2) {
                let (a, b) = (seg[0], seg[1]);
                let len = (b.x - a.x).hypot(b.y - a.y);
                if !len.is_finite() {
                    continue;
                }
                let mut pos = 0.0;
                while pos < len {
                    let on = index % 2 == 0;
                    let step = remaining.min(len - pos);
                    // Past f32 resolution for this segment.
                    if step > 0.0 && pos + step <= pos {
                        break;
                    }
                    let t0 = pos / len;
                    let t1 = (pos + step) / len;
                    let p0 = Point::new(a.x + (b.x - a.x) * t0, a.y + (b.y - a.y) * t0);
                    let p1 = Point::new(a.x + (b.x - a.x) * t1, a.y + (b.y - a.y) * t1);
                    if on {
                        if !drawing {
                            out.move_device(p0);
                            drawing = true;
                        }
                        out.commands.push(PathCommand::LineTo(p1));
                        out.current = Some(p1);
                    } else {
                        drawing = false;
                    }
                    pos += step;
                    remaining -= step;
                    if remaining <= 1e-6 {
                        index = (index + 1) % pattern.len();
                        remaining = pattern[index];
                        drawing = false;
                    }
                }
            }
        }
        out
    }
}

/// Triangles produced by tessellation, in device space.
#[derive(Debug, Clone, Default)]
pub struct Tessellation {
    pub vertices: Vec<Point>,
    pub indices: Vec<u32>,
}

impl Tessellation {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Point; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.vertices.get(tri[0] as usize)?,
                *self.vertices.get(tri[1] as usize)?,
                *self.vertices.get(tri[2] as usize)?,
            ])
        })
    }
}

struct FillCtor;

impl FillVertexConstructor<Point> for FillCtor {
    fn new_vertex(&mut self, vertex: FillVertex) -> Point {
        Point::new(vertex.position().x, vertex.position().y)
    }
}

struct StrokeCtor;

impl StrokeVertexConstructor<Point> for StrokeCtor {
    fn new_vertex(&mut self, vertex: StrokeVertex) -> Point {
        Point::new(vertex.position().x, vertex.position().y)
    }
}

fn lyon_cap(cap: LineCap) -> LyonLineCap {
    match cap {
        LineCap::Butt => LyonLineCap::Butt,
        LineCap::Round => LyonLineCap::Round,
        LineCap::Square => LyonLineCap::Square,
    }
}

fn lyon_join(join: LineJoin) -> LyonLineJoin {
    match join {
        LineJoin::Miter => LyonLineJoin::Miter,
        LineJoin::Round => LyonLineJoin::Round,
        LineJoin::Bevel => LyonLineJoin::Bevel,
    }
}

/// Tessellate the interior of a path (non-zero winding).
pub fn tessellate_fill(path: &Path, tolerance: f32) -> Tessellation {
    if path.is_empty() {
        return Tessellation::default();
    }
    let lyon_path = path.to_lyon();
    let mut buffers: VertexBuffers<Point, u32> = VertexBuffers::new();
    let options = FillOptions::non_zero().with_tolerance(tolerance);
    let result = FillTessellator::new().tessellate_path(
        &lyon_path,
        &options,
        &mut BuffersBuilder::new(&mut buffers, FillCtor),
    );
    if let Err(err) = result {
        tracing::debug!(target: targets::RENDER, ?err, "fill tessellation failed");
        return Tessellation::default();
    }
    Tessellation {
        vertices: buffers.vertices,
        indices: buffers.indices,
    }
}

/// Tessellate the outline of a path. `width` is in device units.
pub fn tessellate_stroke(path: &Path, style: &StrokeStyle, width: f32, tolerance: f32) -> Tessellation {
    if path.is_empty() || !(width > 0.0) {
        return Tessellation::default();
    }
    let lyon_path = path.to_lyon();
    let mut buffers: VertexBuffers<Point, u32> = VertexBuffers::new();
    let options = StrokeOptions::default()
        .with_line_width(width)
        .with_line_cap(lyon_cap(style.cap))
        .with_line_join(lyon_join(style.join))
        .with_miter_limit(style.miter_limit.max(1.0))
        .with_tolerance(tolerance);
    let result = StrokeTessellator::new().tessellate_path(
        &lyon_path,
        &options,
        &mut BuffersBuilder::new(&mut buffers, StrokeCtor),
    );
    if let Err(err) = result {
        tracing::debug!(target: targets::RENDER, ?err, "stroke tessellation failed");
        return Tessellation::default();
    }
    Tessellation {
        vertices: buffers.vertices,
        indices: buffers.indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path() {
        let path = Path::new();
        assert!(path.extents().is_none());
        assert!(tessellate_fill(&path, DEFAULT_TOLERANCE).is_empty());
    }

    #[test]
    fn test_line_to_without_current_point_starts_subpath() {
        let mut path = Path::new();
        path.line_to(5.0, 5.0);
        assert_eq!(path.commands(), &[PathCommand::MoveTo(Point::new(5.0, 5.0))]);
    }

    #[test]
    fn test_rel_line_to_requires_current_point() {
        let mut path = Path::new();
        path.rel_line_to(10.0, 0.0);
        assert!(path.is_empty());
        path.move_to(1.0, 1.0).rel_line_to(10.0, 0.0);
        assert_eq!(path.current_point(), Some(Point::new(11.0, 1.0)));
    }

    #[test]
    fn test_nan_is_ignored() {
        let mut path = Path::new();
        path.move_to(f32::NAN, 0.0).line_to(0.0, f32::INFINITY);
        assert!(path.is_empty());
    }

    #[test]
    fn test_rect_extents_and_tessellation() {
        let mut path = Path::new();
        path.rect(10.0, 20.0, 100.0, 50.0);
        assert_eq!(path.extents(), Some(Rect::new(10.0, 20.0, 100.0, 50.0)));
        let tess = tessellate_fill(&path, DEFAULT_TOLERANCE);
        assert_eq!(tess.triangles().count(), 2);
    }

    #[test]
    fn test_transform_applies_at_call_time() {
        let mut path = Path::with_transform(Transform2D::translate(100.0, 0.0));
        path.move_to(0.0, 0.0);
        path.set_transform(Transform2D::IDENTITY);
        path.line_to(10.0, 0.0);
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo(Point::new(100.0, 0.0)),
                PathCommand::LineTo(Point::new(10.0, 0.0)),
            ]
        );
    }

    #[test]
    fn test_circle_extents() {
        let mut path = Path::new();
        path.circle(50.0, 50.0, 25.0);
        let ext = path.extents().unwrap();
        assert!((ext.left() - 25.0).abs() < 0.5);
        assert!((ext.right() - 75.0).abs() < 0.5);
        assert!((ext.bottom() - 75.0).abs() < 0.5);
    }

    #[test]
    fn test_arc_to_rounds_corner() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).arc_to(10.0, 0.0, 10.0, 10.0, 5.0);
        let end = path.current_point().unwrap();
        assert!((end.x - 10.0).abs() < 1e-3);
        assert!((end.y - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_dashes_split_line() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).line_to(10.0, 0.0);
        let dashed = path.dashed(&DashPattern::simple(2.0, 3.0), 1.0);
        let moves = dashed
            .commands()
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_)))
            .count();
        assert_eq!(moves, 2);
    }

    #[test]
    fn test_dashes_collapse_under_degenerate_scale() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).line_to(0.0, 10.0);
        let dash = DashPattern::simple(2.0, 2.0);
        assert!(path.dashed(&dash, 0.0).is_empty());
        assert!(path.dashed(&dash, f32::INFINITY).is_empty());
        assert!(path.dashed(&dash, f32::NAN).is_empty());
    }

    #[test]
    fn test_too_fine_dashes_stroke_solid() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).line_to(1.0e7, 0.0);
        let dashed = path.dashed(&DashPattern::simple(0.05, 0.05), 1.0);
        assert_eq!(dashed.commands(), path.commands());
    }

    #[test]
    fn test_zero_length_dashes_make_dots() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).line_to(10.0, 0.0);
        let dashed = path.dashed(&DashPattern::simple(0.0, 2.0), 1.0);
        let dots: Vec<_> = dashed
            .commands()
            .iter()
            .filter_map(|c| match c {
                PathCommand::MoveTo(p) => Some(p.x),
                _ => None,
            })
            .collect();
        assert_eq!(dots, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_overflowing_transform_converts_empty() {
        let mut path = Path::with_transform(Transform2D::from_affine(f32::INFINITY, 0.0, 0.0, f32::INFINITY, 0.0, 0.0));
        path.move_to(1.0, 1.0).line_to(2.0, 2.0);
        assert!(!path.is_empty());
        assert!(path.extents().is_none());
        assert!(tessellate_stroke(&path, &StrokeStyle::new(1.0), 1.0, DEFAULT_TOLERANCE).is_empty());
    }

    #[test]
    fn test_stroke_tessellation() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).line_to(100.0, 0.0);
        let tess = tessellate_stroke(&path, &StrokeStyle::new(2.0), 2.0, DEFAULT_TOLERANCE);
        assert!(!tess.is_empty());
        assert!(tessellate_stroke(&path, &StrokeStyle::new(0.0), 0.0, DEFAULT_TOLERANCE).is_empty());
    }
}
