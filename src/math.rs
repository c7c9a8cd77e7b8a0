//! Geometry primitives shared by the label entities and tools.
//!
//! Everything here operates in image-space coordinates (pixels, y down).

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::constants::ELLIPSE_CLOSEST_POINT_ITERATIONS;

// ============================================================================
// Points and vectors
// ============================================================================

/// A 2D point / vector in image space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ZERO: Point2 = Point2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Point2 { x, y }
    }

    pub fn dot(self, other: Point2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance_to(self, other: Point2) -> f64 {
        (other - self).length()
    }

    /// Perpendicular vector (rotated 90 degrees).
    pub fn perp(self) -> Point2 {
        Point2::new(-self.y, self.x)
    }

    /// Unit vector in the direction of `self`, or zero if degenerate.
    pub fn normalized(self) -> Point2 {
        let len = self.length();
        if len > 0.0 { self * (1.0 / len) } else { Point2::ZERO }
    }
}

impl Add for Point2 {
    type Output = Point2;
    fn add(self, rhs: Point2) -> Point2 {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Point2;
    fn sub(self, rhs: Point2) -> Point2 {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2 {
    type Output = Point2;
    fn mul(self, rhs: f64) -> Point2 {
        Point2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point2 {
    type Output = Point2;
    fn neg(self) -> Point2 {
        Point2::new(-self.x, -self.y)
    }
}

/// Arithmetic mean of a point set. Empty input yields the origin.
pub fn centroid_of(points: &[Point2]) -> Point2 {
    if points.is_empty() {
        return Point2::ZERO;
    }
    let sum = points.iter().fold(Point2::ZERO, |acc, &p| acc + p);
    sum * (1.0 / points.len() as f64)
}

// ============================================================================
// Axis-aligned boxes
// ============================================================================

/// An axis-aligned bounding box.
///
/// The empty box is represented by an inverted sentinel (`lower > upper`)
/// so that it is distinguishable from a real zero-area box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABox {
    pub lower: Point2,
    pub upper: Point2,
}

impl AABox {
    pub fn new(lower: Point2, upper: Point2) -> Self {
        AABox { lower, upper }
    }

    /// The inverted sentinel returned for empty inputs.
    pub fn empty() -> Self {
        AABox {
            lower: Point2::new(1.0, 1.0),
            upper: Point2::new(-1.0, -1.0),
        }
    }

    /// False for the inverted sentinel.
    pub fn is_valid(&self) -> bool {
        self.lower.x <= self.upper.x && self.lower.y <= self.upper.y
    }

    /// Smallest box containing every point. Empty input yields the sentinel.
    pub fn from_points(points: &[Point2]) -> Self {
        let mut iter = points.iter();
        let Some(&first) = iter.next() else {
            return AABox::empty();
        };
        let mut lower = first;
        let mut upper = first;
        for &p in iter {
            lower.x = lower.x.min(p.x);
            lower.y = lower.y.min(p.y);
            upper.x = upper.x.max(p.x);
            upper.y = upper.y.max(p.y);
        }
        AABox { lower, upper }
    }

    /// Union of a set of boxes, skipping invalid (sentinel) members.
    pub fn union_of(boxes: &[AABox]) -> Self {
        let mut result = AABox::empty();
        for b in boxes.iter().filter(|b| b.is_valid()) {
            result = if result.is_valid() { result.union(b) } else { *b };
        }
        result
    }

    pub fn union(&self, other: &AABox) -> AABox {
        AABox {
            lower: Point2::new(self.lower.x.min(other.lower.x), self.lower.y.min(other.lower.y)),
            upper: Point2::new(self.upper.x.max(other.upper.x), self.upper.y.max(other.upper.y)),
        }
    }

    pub fn contains_point(&self, p: Point2) -> bool {
        p.x >= self.lower.x && p.x <= self.upper.x && p.y >= self.lower.y && p.y <= self.upper.y
    }

    pub fn centre(&self) -> Point2 {
        (self.lower + self.upper) * 0.5
    }
}

// ============================================================================
// Polygon queries
// ============================================================================

/// Ray-casting point-in-polygon test for a single ring.
pub fn ring_contains_point(ring: &[Point2], p: Point2) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let t = (p.y - a.y) / (b.y - a.y);
            if p.x < a.x + t * (b.x - a.x) {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Even-odd containment over a list of rings: a point is inside if an odd
/// number of rings contain it, so one ring nested in another cuts a hole.
pub fn rings_contain_point(rings: &[Vec<Point2>], p: Point2) -> bool {
    let hits = rings.iter().filter(|r| ring_contains_point(r, p)).count();
    hits % 2 == 1
}

/// Distance from `p` to the closest point on segment `a`-`b`.
pub fn segment_distance(a: Point2, b: Point2, p: Point2) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq <= 0.0 {
        return p.distance_to(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_to(a + ab * t)
}

/// Minimum distance from `p` to the boundary of a closed ring.
pub fn ring_edge_distance(ring: &[Point2], p: Point2) -> f64 {
    let mut best = f64::INFINITY;
    if ring.is_empty() {
        return best;
    }
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        best = best.min(segment_distance(ring[j], ring[i], p));
        j = i;
    }
    best
}

// ============================================================================
// Oriented ellipses
// ============================================================================

/// Closest point on an axis-aligned ellipse boundary to `p`, in the frame
/// where the ellipse is centred at the origin with semi-axes `rx` (along x)
/// and `ry` (along y).
///
/// Iterative projection with a fixed iteration count; accurate enough for
/// hit testing.
pub fn ellipse_closest_point(rx: f64, ry: f64, p: Point2) -> Point2 {
    if rx <= 0.0 || ry <= 0.0 {
        return Point2::ZERO;
    }
    let px = p.x.abs();
    let py = p.y.abs();

    let mut tx = std::f64::consts::FRAC_1_SQRT_2;
    let mut ty = std::f64::consts::FRAC_1_SQRT_2;

    for _ in 0..ELLIPSE_CLOSEST_POINT_ITERATIONS {
        let x = rx * tx;
        let y = ry * ty;

        let ex = (rx * rx - ry * ry) * tx.powi(3) / rx;
        let ey = (ry * ry - rx * rx) * ty.powi(3) / ry;

        let qx = px - ex;
        let qy = py - ey;
        let q = (qx * qx + qy * qy).sqrt();
        let r = ((x - ex) * (x - ex) + (y - ey) * (y - ey)).sqrt();

        tx = ((qx * r / q + ex) / rx).clamp(0.0, 1.0);
        ty = ((qy * r / q + ey) / ry).clamp(0.0, 1.0);
        let t = (tx * tx + ty * ty).sqrt();
        tx /= t;
        ty /= t;
    }

    Point2::new((rx * tx).abs().copysign(p.x), (ry * ty).abs().copysign(p.y))
}

/// Oriented ellipse described by centre, semi-axis lengths and the rotation
/// of the first axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedEllipse {
    pub centre: Point2,
    pub radius1: f64,
    pub radius2: f64,
    pub orientation_rad: f64,
}

impl OrientedEllipse {
    /// Unit vectors along the two axes.
    fn axes(&self) -> (Point2, Point2) {
        let u = Point2::new(self.orientation_rad.cos(), self.orientation_rad.sin());
        (u, u.perp())
    }

    /// Transform `p` into the ellipse-local frame (centre at origin, axes
    /// aligned with x/y).
    fn to_local(&self, p: Point2) -> Point2 {
        let (u, v) = self.axes();
        let d = p - self.centre;
        Point2::new(d.dot(u), d.dot(v))
    }

    fn to_world(&self, p: Point2) -> Point2 {
        let (u, v) = self.axes();
        self.centre + u * p.x + v * p.y
    }

    pub fn contains_point(&self, p: Point2) -> bool {
        if self.radius1 <= 0.0 || self.radius2 <= 0.0 {
            return false;
        }
        let local = self.to_local(p);
        let nx = local.x / self.radius1;
        let ny = local.y / self.radius2;
        nx * nx + ny * ny <= 1.0
    }

    /// Closest point on the ellipse boundary to `p`, in world space.
    pub fn closest_boundary_point(&self, p: Point2) -> Point2 {
        let local = self.to_local(p);
        let on_boundary = ellipse_closest_point(self.radius1, self.radius2, local);
        self.to_world(on_boundary)
    }

    /// Distance from `p` to the ellipse: zero inside, otherwise the distance
    /// to the boundary.
    pub fn distance_to_point(&self, p: Point2) -> f64 {
        if self.contains_point(p) {
            0.0
        } else {
            p.distance_to(self.closest_boundary_point(p))
        }
    }

    /// World-space bounding box, computed from the rotated basis vectors:
    /// the half-extent along each world axis is the magnitude sum of the two
    /// scaled axis vectors projected onto that axis.
    pub fn bounding_box(&self) -> AABox {
        let (u, v) = self.axes();
        let a = u * self.radius1;
        let b = v * self.radius2;
        let ex = (a.x * a.x + b.x * b.x).sqrt();
        let ey = (a.y * a.y + b.y * b.y).sqrt();
        AABox::new(
            Point2::new(self.centre.x - ex, self.centre.y - ey),
            Point2::new(self.centre.x + ex, self.centre.y + ey),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn test_centroid() {
        assert_eq!(centroid_of(&[]), Point2::ZERO);
        let c = centroid_of(&square(0.0, 0.0, 10.0, 10.0));
        assert_eq!(c, Point2::new(5.0, 5.0));
    }

    #[test]
    fn test_aabox_from_points() {
        let b = AABox::from_points(&[Point2::new(3.0, -1.0), Point2::new(-2.0, 7.0)]);
        assert_eq!(b.lower, Point2::new(-2.0, -1.0));
        assert_eq!(b.upper, Point2::new(3.0, 7.0));
        assert!(!AABox::from_points(&[]).is_valid());
    }

    #[test]
    fn test_aabox_union_properties() {
        let a = AABox::from_points(&square(0.0, 0.0, 2.0, 2.0));
        let b = AABox::from_points(&square(5.0, 5.0, 8.0, 9.0));
        let c = AABox::from_points(&square(-3.0, 1.0, 1.0, 4.0));

        // Commutative
        assert_eq!(a.union(&b), b.union(&a));
        // Associative
        assert_eq!(a.union(&b).union(&c), a.union(&b.union(&c)));
        // Contains inputs
        let u = AABox::union_of(&[a, b, c]);
        for bx in [a, b, c] {
            assert!(u.contains_point(bx.lower));
            assert!(u.contains_point(bx.upper));
        }
        // Empty boxes are skipped
        assert_eq!(AABox::union_of(&[AABox::empty(), a]), a);
        assert!(!AABox::union_of(&[]).is_valid());
    }

    #[test]
    fn test_ring_contains_point() {
        let ring = square(0.0, 0.0, 10.0, 10.0);
        assert!(ring_contains_point(&ring, Point2::new(5.0, 5.0)));
        assert!(!ring_contains_point(&ring, Point2::new(15.0, 5.0)));
        assert!(!ring_contains_point(&ring, Point2::new(-0.1, 5.0)));
    }

    #[test]
    fn test_even_odd_hole() {
        let outer = square(0.0, 0.0, 10.0, 10.0);
        let hole = square(3.0, 3.0, 7.0, 7.0);
        let rings = vec![outer, hole];
        // Between outer and hole: inside
        assert!(rings_contain_point(&rings, Point2::new(1.0, 1.0)));
        // Within the hole: outside
        assert!(!rings_contain_point(&rings, Point2::new(5.0, 5.0)));
        // Outside everything
        assert!(!rings_contain_point(&rings, Point2::new(20.0, 20.0)));
    }

    #[test]
    fn test_ring_edge_distance() {
        let ring = square(0.0, 0.0, 10.0, 10.0);
        assert!((ring_edge_distance(&ring, Point2::new(5.0, -3.0)) - 3.0).abs() < 1e-9);
        assert!((ring_edge_distance(&ring, Point2::new(5.0, 2.0)) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_ellipse_contains() {
        let e = OrientedEllipse {
            centre: Point2::ZERO,
            radius1: 10.0,
            radius2: 5.0,
            orientation_rad: 0.0,
        };
        assert!(e.contains_point(Point2::new(9.0, 0.0)));
        assert!(e.contains_point(Point2::new(0.0, 4.9)));
        assert!(!e.contains_point(Point2::new(0.0, 6.0)));
        assert!(!e.contains_point(Point2::new(11.0, 0.0)));
    }

    #[test]
    fn test_ellipse_contains_rotated() {
        // Quarter turn: the long axis now lies along y
        let e = OrientedEllipse {
            centre: Point2::new(1.0, 2.0),
            radius1: 10.0,
            radius2: 5.0,
            orientation_rad: std::f64::consts::FRAC_PI_2,
        };
        assert!(e.contains_point(Point2::new(1.0, 11.0)));
        assert!(!e.contains_point(Point2::new(10.0, 2.0)));
    }

    #[test]
    fn test_ellipse_distance() {
        let e = OrientedEllipse {
            centre: Point2::ZERO,
            radius1: 10.0,
            radius2: 5.0,
            orientation_rad: 0.0,
        };
        // On the major axis the closest boundary point is (10, 0)
        let d = e.distance_to_point(Point2::new(20.0, 0.0));
        assert!((d - 10.0).abs() < 1e-6, "d = {d}");
        // Inside
        assert_eq!(e.distance_to_point(Point2::new(1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_ellipse_bounding_box() {
        let e = OrientedEllipse {
            centre: Point2::new(5.0, 5.0),
            radius1: 10.0,
            radius2: 4.0,
            orientation_rad: 0.0,
        };
        let b = e.bounding_box();
        assert!((b.lower.x - -5.0).abs() < 1e-9);
        assert!((b.upper.x - 15.0).abs() < 1e-9);
        assert!((b.lower.y - 1.0).abs() < 1e-9);

        let rot = OrientedEllipse {
            orientation_rad: std::f64::consts::FRAC_PI_2,
            ..e
        };
        let rb = rot.bounding_box();
        // Axes swap under a quarter turn
        assert!((rb.upper.x - 9.0).abs() < 1e-9);
        assert!((rb.upper.y - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_segment_distance_degenerate() {
        let a = Point2::new(2.0, 2.0);
        assert!((segment_distance(a, a, Point2::new(2.0, 5.0)) - 3.0).abs() < 1e-9);
    }
}
