//! Basic geometry and color types for rendering.
//!
//! Float types ([`Point`], [`Size`], [`Rect`]) are used by the drawing API.
//! Integer types ([`IntPoint`], [`IntRect`]) describe element bounds, event
//! coordinates and pixel regions.

use bytemuck::{Pod, Zeroable};

/// A point in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The origin point (0, 0).
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Whether both coordinates are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Convert to a glam Vec2.
    #[inline]
    pub fn to_vec2(self) -> glam::Vec2 {
        glam::Vec2::new(self.x, self.y)
    }

    /// Create from a glam Vec2.
    #[inline]
    pub fn from_vec2(v: glam::Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<glam::Vec2> for Point {
    fn from(v: glam::Vec2) -> Self {
        Self::from_vec2(v)
    }
}

impl From<IntPoint> for Point {
    fn from(p: IntPoint) -> Self {
        Self::new(p.x as f32, p.y as f32)
    }
}

/// A size in 2D space (width and height).
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Zero size.
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// Check if the size has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl From<(f32, f32)> for Size {
    fn from((width, height): (f32, f32)) -> Self {
        Self { width, height }
    }
}

/// A rectangle defined by origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    /// Create a new rectangle from origin and size.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point { x, y },
            size: Size { width, height },
        }
    }

    /// Create a rectangle from two corners (min and max points).
    #[inline]
    pub fn from_corners(min: Point, max: Point) -> Self {
        Self {
            origin: min,
            size: Size {
                width: max.x - min.x,
                height: max.y - min.y,
            },
        }
    }

    /// Empty rectangle at origin.
    pub const ZERO: Self = Self {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    #[inline]
    pub fn left(&self) -> f32 {
        self.origin.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.origin.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.height
    }

    /// Center point of the rectangle.
    #[inline]
    pub fn center(&self) -> Point {
        Point {
            x: self.origin.x + self.size.width / 2.0,
            y: self.origin.y + self.size.height / 2.0,
        }
    }

    #[inline]
    pub fn top_left(&self) -> Point {
        self.origin
    }

    #[inline]
    pub fn top_right(&self) -> Point {
        Point::new(self.right(), self.top())
    }

    #[inline]
    pub fn bottom_left(&self) -> Point {
        Point::new(self.left(), self.bottom())
    }

    #[inline]
    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    /// Check if the rectangle is empty (zero or negative size).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Whether all components are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.origin.is_finite() && self.size.width.is_finite() && self.size.height.is_finite()
    }

    /// Check if a point is inside the rectangle (right/bottom exclusive).
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// Compute the intersection of two rectangles.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if left < right && top < bottom {
            Some(Rect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    /// Compute the union (bounding box) of two rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Expand the rectangle by the given amount on all sides.
    #[inline]
    pub fn inflate(&self, amount: f32) -> Rect {
        Rect::new(
            self.origin.x - amount,
            self.origin.y - amount,
            self.size.width + amount * 2.0,
            self.size.height + amount * 2.0,
        )
    }

    /// Offset the rectangle by the given amount.
    #[inline]
    pub fn offset(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.origin.x + dx, self.origin.y + dy, self.size.width, self.size.height)
    }

    /// Smallest integer rectangle covering this one.
    pub fn round_out(&self) -> IntRect {
        let left = self.left().floor() as i32;
        let top = self.top().floor() as i32;
        let right = self.right().ceil() as i32;
        let bottom = self.bottom().ceil() as i32;
        IntRect::new(left, top, right - left, bottom - top)
    }
}

/// A rectangle with rounded corners.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoundedRect {
    /// The base rectangle.
    pub rect: Rect,
    /// Corner radii (top-left, top-right, bottom-right, bottom-left).
    pub radii: CornerRadii,
}

impl RoundedRect {
    /// Create a rounded rectangle with uniform corner radius.
    #[inline]
    pub fn new(rect: Rect, radius: f32) -> Self {
        Self {
            rect,
            radii: CornerRadii::uniform(radius),
        }
    }

    /// Check if all corners have zero radius.
    #[inline]
    pub fn is_rect(&self) -> bool {
        self.radii.is_zero()
    }
}

/// Corner radii for rounded rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct CornerRadii {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
    pub bottom_left: f32,
}

impl CornerRadii {
    /// Create corner radii with the same value for all corners.
    #[inline]
    pub const fn uniform(radius: f32) -> Self {
        Self {
            top_left: radius,
            top_right: radius,
            bottom_right: radius,
            bottom_left: radius,
        }
    }

    /// Zero radii (sharp corners).
    pub const ZERO: Self = Self::uniform(0.0);

    /// Check if all radii are zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.top_left == 0.0
            && self.top_right == 0.0
            && self.bottom_right == 0.0
            && self.bottom_left == 0.0
    }

    /// Scale radii down so adjacent corners never overlap inside `rect`.
    pub fn clamped_to(&self, rect: &Rect) -> Self {
        let limit = (rect.width().min(rect.height()) / 2.0).max(0.0);
        Self {
            top_left: self.top_left.clamp(0.0, limit),
            top_right: self.top_right.clamp(0.0, limit),
            bottom_right: self.bottom_right.clamp(0.0, limit),
            bottom_left: self.bottom_left.clamp(0.0, limit),
        }
    }
}

/// An integer point, used for window-local event coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IntPoint {
    pub x: i32,
    pub y: i32,
}

impl IntPoint {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Component-wise offset.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::ops::Add for IntPoint {
    type Output = IntPoint;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for IntPoint {
    type Output = IntPoint;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// An integer rectangle (x, y, width, height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IntRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl IntRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    #[inline]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub const fn origin(&self) -> IntPoint {
        IntPoint::new(self.x, self.y)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Right/bottom exclusive containment.
    #[inline]
    pub const fn contains(&self, p: IntPoint) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Compute the intersection of two rectangles.
    pub fn intersect(&self, other: &IntRect) -> Option<IntRect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left < right && top < bottom {
            Some(IntRect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    /// Translate by a point.
    #[inline]
    pub const fn translated(&self, by: IntPoint) -> IntRect {
        IntRect::new(self.x + by.x, self.y + by.y, self.width, self.height)
    }

    /// Convert to a float rectangle.
    #[inline]
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x as f32, self.y as f32, self.width as f32, self.height as f32)
    }
}

/// An RGBA color with premultiplied alpha.
///
/// The public constructors that take 8-bit components ([`from_rgba8`],
/// [`from_rgb8`], [`from_u32`], [`from_hex`]) accept straight (non-premultiplied)
/// values, matching the toolkit's API boundary. [`to_rgba8`] converts back.
///
/// [`from_rgba8`]: Self::from_rgba8
/// [`from_rgb8`]: Self::from_rgb8
/// [`from_u32`]: Self::from_u32
/// [`from_hex`]: Self::from_hex
/// [`to_rgba8`]: Self::to_rgba8
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Create a color from already premultiplied components (0.0-1.0).
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from non-premultiplied RGBA components.
    #[inline]
    pub fn from_rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: r * a,
            g: g * a,
            b: b * a,
            a,
        }
    }

    /// Create a color from straight 8-bit RGBA components.
    #[inline]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Create an opaque color from RGB components.
    #[inline]
    pub const fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create an opaque color from 8-bit RGB components.
    #[inline]
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Create a color from a 32-bit RGBA value (0xRRGGBBAA).
    #[inline]
    pub fn from_u32(rgba: u32) -> Self {
        Self::from_rgba8(
            ((rgba >> 24) & 0xFF) as u8,
            ((rgba >> 16) & 0xFF) as u8,
            ((rgba >> 8) & 0xFF) as u8,
            (rgba & 0xFF) as u8,
        )
    }

    /// Create a color from a hex string (e.g., "#FF0000" or "#FF0000FF").
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let len = hex.len();

        if (len != 6 && len != 8) || !hex.is_ascii() {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        let a = if len == 8 {
            u8::from_str_radix(&hex[6..8], 16).ok()?
        } else {
            255
        };

        Some(Self::from_rgba8(r, g, b, a))
    }

    /// Straight-alpha 8-bit components.
    pub fn to_rgba8(self) -> [u8; 4] {
        if self.a <= 0.0 {
            return [0, 0, 0, 0];
        }
        let unpremul = |c: f32| ((c / self.a).clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            unpremul(self.r),
            unpremul(self.g),
            unpremul(self.b),
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }

    /// Premultiplied 8-bit components, the staging surface format.
    pub fn to_premul_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Return a new color with modified alpha.
    #[inline]
    pub fn with_alpha(self, alpha: f32) -> Self {
        if self.a == 0.0 {
            return Self::new(0.0, 0.0, 0.0, alpha);
        }
        let factor = alpha / self.a;
        Self {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: alpha,
        }
    }

    /// Multiply every premultiplied component by `factor` (global alpha).
    #[inline]
    pub fn scale_alpha(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor, self.a * factor)
    }

    /// Linear interpolation between two colors.
    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Convert to an array [r, g, b, a].
    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::from_rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::from_rgb(1.0, 1.0, 1.0);
    pub const RED: Self = Self::from_rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::from_rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::from_rgb(0.0, 0.0, 1.0);
    pub const GRAY: Self = Self::from_rgb(0.5, 0.5, 0.5);
    pub const DARK_GRAY: Self = Self::from_rgb(0.25, 0.25, 0.25);
    pub const LIGHT_GRAY: Self = Self::from_rgb(0.75, 0.75, 0.75);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_geometry() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 70.0);
        assert_eq!(r.center(), Point::new(60.0, 45.0));
    }

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(!r.contains(Point::new(100.0, 100.0)));
        assert!(!r.contains(Point::new(-1.0, 50.0)));
    }

    #[test]
    fn test_rect_intersect() {
        let r1 = Rect::new(0.0, 0.0, 100.0, 100.0);
        let r2 = Rect::new(50.0, 50.0, 100.0, 100.0);
        assert_eq!(r1.intersect(&r2), Some(Rect::new(50.0, 50.0, 50.0, 50.0)));
        assert!(r1.intersect(&Rect::new(200.0, 200.0, 5.0, 5.0)).is_none());
    }

    #[test]
    fn test_round_out() {
        let r = Rect::new(0.5, 1.2, 10.0, 3.5);
        assert_eq!(r.round_out(), IntRect::new(0, 1, 11, 4));
    }

    #[test]
    fn test_int_rect() {
        let r = IntRect::new(10, 10, 200, 24);
        assert!(r.contains(IntPoint::new(50, 20)));
        assert!(!r.contains(IntPoint::new(210, 20)));
        assert_eq!(
            r.intersect(&IntRect::new(0, 0, 20, 20)),
            Some(IntRect::new(10, 10, 10, 10))
        );
        assert_eq!(r.translated(IntPoint::new(5, -5)).origin(), IntPoint::new(15, 5));
    }

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex("#FF0000").unwrap();
        assert_eq!(c, Color::RED);

        let c2 = Color::from_hex("#00FF0080").unwrap();
        assert!((c2.g - 0.5).abs() < 0.01);
        assert!((c2.a - 0.5).abs() < 0.01);
        assert!(Color::from_hex("#12345").is_none());
    }

    #[test]
    fn test_color_rgba8_boundary() {
        let c = Color::from_rgba8(200, 100, 50, 128);
        assert_eq!(c.to_rgba8(), [200, 100, 50, 128]);
        assert_eq!(Color::TRANSPARENT.to_rgba8(), [0, 0, 0, 0]);
    }

    #[test]
    fn test_color_lerp() {
        let gray = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert!((gray.r - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_corner_radii_clamp() {
        let radii = CornerRadii::uniform(40.0).clamped_to(&Rect::new(0.0, 0.0, 50.0, 20.0));
        assert_eq!(radii.top_left, 10.0);
    }
}
