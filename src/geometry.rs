//! Page-space geometry primitives.
//!
//! All coordinates use a top-left origin with `y` growing downwards, the
//! orientation the header/footer heuristics are expressed in. The document
//! layer converts from native PDF space (bottom-left origin) on the way in
//! and back on the way out.

use serde::Serialize;

/// A 2D point in page units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Shift the point by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle `(x0, y0)-(x1, y1)`.
///
/// Constructors normalize the corners so `x0 <= x1` and `y0 <= y1` always
/// holds. A rectangle with zero (or NaN) width or height is *empty*.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Rectangle of the given size with its origin at `(0, 0)`.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Rectangle of the given size centered on `center`.
    pub fn centered_at(center: Point, width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self::new(
            center.x - half_w,
            center.y - half_h,
            center.x + half_w,
            center.y + half_h,
        )
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Top-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.x0, self.y0)
    }

    /// True when the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Point at fractional position `(fx, fy)` inside the rectangle.
    ///
    /// `(0, 0)` is the origin, `(1, 1)` the bottom-right corner.
    pub fn point_at(&self, fx: f64, fy: f64) -> Point {
        Point::new(self.x0 + self.width() * fx, self.y0 + self.height() * fy)
    }

    /// Smallest rectangle covering both. Empty operands are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Grow each edge outwards by its own margin. Negative margins shrink.
    pub fn expand(&self, left: f64, top: f64, right: f64, bottom: f64) -> Rect {
        Rect::new(
            self.x0 - left,
            self.y0 - top,
            self.x1 + right,
            self.y1 + bottom,
        )
    }

    /// Shrink every edge inwards by `margin`.
    ///
    /// Unlike [`Rect::new`] this does not normalize: an inset larger than
    /// half the size yields `x0 > x1`, which callers use as clamp bounds.
    pub fn inset(&self, margin: f64) -> Rect {
        Rect {
            x0: self.x0 + margin,
            y0: self.y0 + margin,
            x1: self.x1 - margin,
            y1: self.y1 - margin,
        }
    }

    /// Clamp every edge into `bounds`.
    pub fn clamp_to(&self, bounds: &Rect) -> Rect {
        let cx = |v: f64| v.clamp(bounds.x0, bounds.x1);
        let cy = |v: f64| v.clamp(bounds.y0, bounds.y1);
        Rect::new(cx(self.x0), cy(self.y0), cx(self.x1), cy(self.y1))
    }

    /// Move the rectangle without resizing it.
    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }

    /// Inclusive point containment.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1
    }

    /// True when `other` lies completely inside this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }
}

/// Affine transformation matrix `[a b c d e f]` as used by PDF content streams.
///
/// Point transformation: `(x', y') = (a*x + c*y + e, b*x + d*y + f)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ctm {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Ctm {
    fn default() -> Self {
        Self::identity()
    }
}

impl Ctm {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.c * p.y + self.e,
            y: self.b * p.x + self.d * p.y + self.f,
        }
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn concat(&self, other: &Ctm) -> Ctm {
        Ctm {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Length of the transformed vertical unit vector.
    pub fn vertical_scale(&self) -> f64 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_corners() {
        let r = Rect::new(10.0, 20.0, 0.0, 5.0);
        assert_eq!(r, Rect::new(0.0, 5.0, 10.0, 20.0));
        assert_eq!(r.width(), 10.0);
        assert_eq!(r.height(), 15.0);
    }

    #[test]
    fn test_empty_rects() {
        assert!(Rect::new(0.0, 0.0, 0.0, 10.0).is_empty());
        assert!(Rect::new(0.0, 0.0, 10.0, 0.0).is_empty());
        assert!(Rect::new(f64::NAN, 0.0, 10.0, 10.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_union_ignores_empty() {
        let a = Rect::new(10.0, 10.0, 20.0, 20.0);
        let b = Rect::new(15.0, 5.0, 40.0, 18.0);
        assert_eq!(a.union(&b), Rect::new(10.0, 5.0, 40.0, 20.0));

        let empty = Rect::new(100.0, 100.0, 100.0, 100.0);
        assert_eq!(a.union(&empty), a);
        assert_eq!(empty.union(&a), a);
    }

    #[test]
    fn test_expand_and_clamp() {
        let page = Rect::from_size(600.0, 800.0);
        let r = Rect::new(480.0, 650.0, 560.0, 665.0).expand(60.0, 24.0, 132.0, 64.0);
        assert_eq!(r, Rect::new(420.0, 626.0, 692.0, 729.0));

        let clamped = r.clamp_to(&page);
        assert_eq!(clamped, Rect::new(420.0, 626.0, 600.0, 729.0));
    }

    #[test]
    fn test_inset_may_cross() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0).inset(6.0);
        assert!(r.x0 > r.x1);
        assert!(r.y0 > r.y1);
    }

    #[test]
    fn test_centered_and_translate() {
        let r = Rect::centered_at(Point::new(50.0, 40.0), 20.0, 10.0);
        assert_eq!(r, Rect::new(40.0, 35.0, 60.0, 45.0));
        let moved = r.translate(-5.0, 2.5);
        assert_eq!(moved, Rect::new(35.0, 37.5, 55.0, 47.5));
        assert_eq!(moved.width(), r.width());
    }

    #[test]
    fn test_contains() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 10.0)));
        assert!(!r.contains(Point::new(10.1, 5.0)));
        assert!(r.contains_rect(&Rect::new(1.0, 1.0, 9.0, 9.0)));
        assert!(!r.contains_rect(&Rect::new(1.0, 1.0, 11.0, 9.0)));
    }

    #[test]
    fn test_point_at() {
        let r = Rect::new(100.0, 200.0, 300.0, 400.0);
        assert_eq!(r.point_at(0.5, 0.25), Point::new(200.0, 250.0));
    }

    #[test]
    fn test_ctm_concat_and_transform() {
        let scale = Ctm::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Ctm::translation(10.0, 20.0);
        let combined = scale.concat(&shift);
        let p = combined.transform_point(Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(12.0, 22.0));
        assert_eq!(combined.vertical_scale(), 2.0);
    }
}
