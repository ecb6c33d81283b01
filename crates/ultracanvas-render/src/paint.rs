//! Paint sources, gradient patterns and stroke styles.
//!
//! A [`Paint`] is either a solid [`Color`] or a [`PatternHandle`] returned by
//! one of the gradient factories. Pattern handles are reference counted and
//! owned by whoever created them. A render context clones the handle while it
//! is the active paint and releases every clone it holds when the frame ends.

use std::sync::Arc;

use crate::types::{Color, Point, Rect};

/// A color stop in a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient, 0.0 to 1.0.
    pub offset: f32,
    pub color: Color,
}

impl GradientStop {
    #[inline]
    pub const fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// A gradient definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Gradient {
    /// Linear gradient between two points.
    Linear {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
    },
    /// Two-point conical gradient between the circles `(c0, r0)` and `(c1, r1)`.
    Radial {
        c0: Point,
        r0: f32,
        c1: Point,
        r1: f32,
        stops: Vec<GradientStop>,
    },
}

impl Gradient {
    /// Create a linear gradient. Stops are sorted by offset and clamped to 0..=1.
    pub fn linear(start: Point, end: Point, stops: &[GradientStop]) -> Self {
        Self::Linear {
            start,
            end,
            stops: normalize_stops(stops),
        }
    }

    /// Create a two-point radial gradient.
    pub fn radial(c0: Point, r0: f32, c1: Point, r1: f32, stops: &[GradientStop]) -> Self {
        Self::Radial {
            c0,
            r0: r0.max(0.0),
            c1,
            r1: r1.max(0.0),
            stops: normalize_stops(stops),
        }
    }

    pub fn stops(&self) -> &[GradientStop] {
        match self {
            Self::Linear { stops, .. } | Self::Radial { stops, .. } => stops,
        }
    }

    /// Gradient parameter at a point in pattern space, padded to 0..=1.
    ///
    /// Returns `None` where a radial gradient is undefined.
    pub fn parameter_at(&self, p: Point) -> Option<f32> {
        match self {
            Self::Linear { start, end, .. } => {
                let dx = end.x - start.x;
                let dy = end.y - start.y;
                let len_sq = dx * dx + dy * dy;
                if len_sq <= f32::EPSILON {
                    return Some(0.0);
                }
                let t = ((p.x - start.x) * dx + (p.y - start.y) * dy) / len_sq;
                Some(t.clamp(0.0, 1.0))
            }
            Self::Radial { c0, r0, c1, r1, .. } => {
                let (cdx, cdy) = (c1.x - c0.x, c1.y - c0.y);
                let dr = r1 - r0;
                let (pdx, pdy) = (p.x - c0.x, p.y - c0.y);
                let a = cdx * cdx + cdy * cdy - dr * dr;
                let b = pdx * cdx + pdy * cdy + r0 * dr;
                let c = pdx * pdx + pdy * pdy - r0 * r0;

                let valid = |t: f32| r0 + t * dr >= 0.0;
                let t = if a.abs() < 1e-6 {
                    if b.abs() < 1e-6 {
                        return None;
                    }
                    let t = c / (2.0 * b);
                    valid(t).then_some(t)?
                } else {
                    let disc = b * b - a * c;
                    if disc < 0.0 {
                        return None;
                    }
                    let root = disc.sqrt();
                    let (t1, t2) = ((b + root) / a, (b - root) / a);
                    let (hi, lo) = if t1 > t2 { (t1, t2) } else { (t2, t1) };
                    if valid(hi) {
                        hi
                    } else if valid(lo) {
                        lo
                    } else {
                        return None;
                    }
                };
                Some(t.clamp(0.0, 1.0))
            }
        }
    }

    /// Evaluate the gradient color at a point in pattern space.
    pub fn color_at(&self, p: Point) -> Color {
        match self.parameter_at(p) {
            Some(t) => sample_stops(self.stops(), t),
            None => Color::TRANSPARENT,
        }
    }
}

fn normalize_stops(stops: &[GradientStop]) -> Vec<GradientStop> {
    let mut out: Vec<GradientStop> = stops
        .iter()
        .filter(|s| s.offset.is_finite())
        .map(|s| GradientStop::new(s.offset.clamp(0.0, 1.0), s.color))
        .collect();
    // Stable, so stops sharing an offset keep their hard edge.
    out.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    out
}

fn sample_stops(stops: &[GradientStop], t: f32) -> Color {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Color::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }
    if t >= last.offset {
        return last.color;
    }
    for pair in stops.windows(2) {
        let (s0, s1) = (pair[0], pair[1]);
        if t >= s0.offset && t <= s1.offset {
            let span = s1.offset - s0.offset;
            if span <= f32::EPSILON {
                return s1.color;
            }
            return s0.color.lerp(s1.color, (t - s0.offset) / span);
        }
    }
    last.color
}

/// A shared handle to a gradient pattern.
///
/// Cloning shares the gradient. Equality is identity.
#[derive(Debug, Clone)]
pub struct PatternHandle(Arc<Gradient>);

impl PatternHandle {
    pub fn new(gradient: Gradient) -> Self {
        Self(Arc::new(gradient))
    }

    pub fn gradient(&self) -> &Gradient {
        &self.0
    }

    /// Number of live handles to this pattern, including this one.
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl PartialEq for PatternHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A fill, stroke or text paint.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Pattern(PatternHandle),
}

impl Paint {
    #[inline]
    pub fn is_solid(&self) -> bool {
        matches!(self, Self::Solid(_))
    }

    #[inline]
    pub fn as_solid(&self) -> Option<Color> {
        match self {
            Self::Solid(c) => Some(*c),
            Self::Pattern(_) => None,
        }
    }

    /// Color at a point in pattern (user) space.
    pub fn color_at(&self, p: Point) -> Color {
        match self {
            Self::Solid(c) => *c,
            Self::Pattern(handle) => handle.gradient().color_at(p),
        }
    }

    /// A representative color, used where a pattern cannot be evaluated per pixel.
    pub fn approximate_color(&self) -> Color {
        match self {
            Self::Solid(c) => *c,
            Self::Pattern(handle) => {
                let stops = handle.gradient().stops();
                stops.first().map(|s| s.color).unwrap_or(Color::TRANSPARENT)
            }
        }
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

impl From<PatternHandle> for Paint {
    fn from(handle: PatternHandle) -> Self {
        Self::Pattern(handle)
    }
}

impl Default for Paint {
    fn default() -> Self {
        Self::Solid(Color::BLACK)
    }
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// On/off dash lengths plus a starting offset.
#[derive(Debug, Clone, PartialEq)]
pub struct DashPattern {
    pub pattern: Vec<f32>,
    pub offset: f32,
}

impl DashPattern {
    pub fn new(pattern: Vec<f32>, offset: f32) -> Self {
        Self { pattern, offset }
    }

    pub fn simple(on: f32, off: f32) -> Self {
        Self::new(vec![on, off], 0.0)
    }

    /// A usable pattern has only finite non-negative lengths and a positive total.
    pub fn is_valid(&self) -> bool {
        !self.pattern.is_empty()
            && self.pattern.iter().all(|v| v.is_finite() && *v >= 0.0)
            && self.total_length() > 0.0
            && self.offset.is_finite()
    }

    pub fn total_length(&self) -> f32 {
        let sum: f32 = self.pattern.iter().sum();
        // Odd-length patterns repeat with on/off swapped.
        if self.pattern.len() % 2 == 1 { sum * 2.0 } else { sum }
    }
}

/// Line parameters kept in the render state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
        }
    }
}

impl StrokeStyle {
    pub fn new(width: f32) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn with_miter_limit(mut self, limit: f32) -> Self {
        self.miter_limit = limit;
        self
    }
}

/// A simple drop shadow drawn beneath a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShadow {
    pub offset_x: f32,
    pub offset_y: f32,
    /// Soft edge width; approximated by layered translucent fills.
    pub blur: f32,
    pub color: Color,
}

impl BoxShadow {
    pub fn new(color: Color) -> Self {
        Self {
            offset_x: 2.0,
            offset_y: 2.0,
            blur: 3.0,
            color,
        }
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    pub fn with_blur(mut self, blur: f32) -> Self {
        self.blur = blur.max(0.0);
        self
    }

    /// Area covered by the shadow of `rect`.
    pub fn expanded_bounds(&self, rect: Rect) -> Rect {
        rect.offset(self.offset_x, self.offset_y).inflate(self.blur)
    }
}

impl Default for BoxShadow {
    fn default() -> Self {
        Self::new(Color::from_rgba8(0, 0, 0, 64))
    }
}
