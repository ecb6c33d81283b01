//! 2D affine transforms.

use crate::types::{Point, Rect};

/// A 2D affine transform.
///
/// The six coefficients follow the usual `(a, b, c, d, e, f)` convention:
///
/// ```text
/// x' = a * x + c * y + e
/// y' = b * x + d * y + f
/// ```
///
/// # Example
///
/// ```
/// use ultracanvas_render::{Point, Transform2D};
///
/// // `then` applies the right-hand transform first.
/// let t = Transform2D::scale(2.0).then(&Transform2D::translate(10.0, 0.0));
/// assert_eq!(t.transform_point(Point::new(5.0, 0.0)), Point::new(30.0, 0.0));
///
/// let back = t.inverse().unwrap().transform_point(Point::new(30.0, 0.0));
/// assert!((back.x - 5.0).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    m: [f32; 6],
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    /// Build a transform from its `(a, b, c, d, e, f)` coefficients.
    #[inline]
    pub const fn from_affine(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self {
            m: [a, b, c, d, e, f],
        }
    }

    #[inline]
    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self::from_affine(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    #[inline]
    pub const fn scale(s: f32) -> Self {
        Self::scale_xy(s, s)
    }

    #[inline]
    pub const fn scale_xy(sx: f32, sy: f32) -> Self {
        Self::from_affine(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `angle` radians (clockwise in a y-down space).
    #[inline]
    pub fn rotate(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::from_affine(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Compose: the result applies `other` first, then `self`.
    #[inline]
    pub fn then(&self, other: &Self) -> Self {
        let [a0, b0, c0, d0, e0, f0] = self.m;
        let [a1, b1, c1, d1, e1, f1] = other.m;
        Self::from_affine(
            a0 * a1 + c0 * b1,
            b0 * a1 + d0 * b1,
            a0 * c1 + c0 * d1,
            b0 * c1 + d0 * d1,
            a0 * e1 + c0 * f1 + e0,
            b0 * e1 + d0 * f1 + f0,
        )
    }

    #[inline]
    pub fn translated(&self, tx: f32, ty: f32) -> Self {
        self.then(&Self::translate(tx, ty))
    }

    #[inline]
    pub fn scaled_xy(&self, sx: f32, sy: f32) -> Self {
        self.then(&Self::scale_xy(sx, sy))
    }

    #[inline]
    pub fn rotated(&self, angle: f32) -> Self {
        self.then(&Self::rotate(angle))
    }

    #[inline]
    pub fn transform_point(&self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.m;
        Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Transform a direction, ignoring translation.
    #[inline]
    pub fn transform_vector(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, _, _] = self.m;
        (a * x + c * y, b * x + d * y)
    }

    #[inline]
    pub fn determinant(&self) -> f32 {
        self.m[0] * self.m[3] - self.m[1] * self.m[2]
    }

    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1e-10 {
            return None;
        }
        let [a, b, c, d, e, f] = self.m;
        let inv = 1.0 / det;
        Some(Self::from_affine(
            d * inv,
            -b * inv,
            -c * inv,
            a * inv,
            (c * f - d * e) * inv,
            (b * e - a * f) * inv,
        ))
    }

    /// Uniform scale factor used for stroke widths and tolerances.
    #[inline]
    pub fn average_scale(&self) -> f32 {
        self.determinant().abs().sqrt()
    }

    #[inline]
    pub fn translation(&self) -> (f32, f32) {
        (self.m[4], self.m[5])
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    #[inline]
    pub fn is_translation_only(&self) -> bool {
        self.m[..4] == [1.0, 0.0, 0.0, 1.0]
    }

    pub fn is_finite(&self) -> bool {
        self.m.iter().all(|v| v.is_finite())
    }

    /// The `(a, b, c, d, e, f)` coefficients.
    #[inline]
    pub fn as_array(&self) -> &[f32; 6] {
        &self.m
    }

    /// Axis-aligned bounds of a transformed rectangle.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            self.transform_point(rect.top_left()),
            self.transform_point(rect.top_right()),
            self.transform_point(rect.bottom_left()),
            self.transform_point(rect.bottom_right()),
        ];
        let (mut min, mut max) = (corners[0], corners[0]);
        for p in &corners[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Rect::from_corners(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let p = Transform2D::rotate(FRAC_PI_2).transform_point(Point::new(1.0, 0.0));
        assert!(close(p, Point::new(0.0, 1.0)));
    }

    #[test]
    fn test_translated_applies_in_user_space() {
        let t = Transform2D::scale(2.0).translated(5.0, 5.0);
        assert_eq!(t.transform_point(Point::ZERO), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_from_affine_matches_convention() {
        let t = Transform2D::from_affine(1.0, 0.0, 0.5, 1.0, 3.0, 4.0);
        assert_eq!(t.transform_point(Point::new(2.0, 2.0)), Point::new(6.0, 6.0));
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = Transform2D::translate(10.0, 20.0).scaled_xy(2.0, 3.0).rotated(0.3);
        let inv = t.inverse().unwrap();
        let p = Point::new(42.0, -7.0);
        assert!(close(inv.transform_point(t.transform_point(p)), p));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert!(Transform2D::scale(0.0).inverse().is_none());
    }

    #[test]
    fn test_transform_rect_bounds() {
        let r = Transform2D::translate(10.0, 10.0).transform_rect(&Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(r, Rect::new(10.0, 10.0, 100.0, 50.0));
    }
}
