//! Geometry utilities: points, bounds, distances, grid snapping.
//!
//! Pure functions over f32 scene coordinates. No scene state — the drag
//! engine and the overlay renderer both lean on these, so everything here
//! must be cheap and allocation-free.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A point (or offset) in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f32 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Length of this point treated as a vector from the origin.
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in this direction, or zero for a degenerate vector.
    pub fn normalized(&self) -> Point {
        let len = self.length();
        if len > 0.0 {
            Point::new(self.x / len, self.y / len)
        } else {
            Point::ZERO
        }
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Rotate around `center` by `angle` radians.
    pub fn rotated_around(&self, center: Point, angle: f32) -> Point {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Point::new(
            center.x + dx * cos - dy * sin,
            center.y + dx * sin + dy * cos,
        )
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned bounding box in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest bounds covering both corner points, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (b.x - a.x).abs(), (b.y - a.y).abs())
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.max_x() && p.y >= self.y && p.y <= self.max_y()
    }

    /// Grow (or shrink, for negative `pad`) on all four sides.
    pub fn inflated(&self, pad: f32) -> Bounds {
        Bounds::new(
            self.x - pad,
            self.y - pad,
            (self.width + pad * 2.0).max(0.0),
            (self.height + pad * 2.0).max(0.0),
        )
    }

    pub fn union(&self, other: Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Bounds::new(x, y, max_x - x, max_y - y)
    }

    pub fn intersects(&self, other: Bounds) -> bool {
        self.x < other.max_x()
            && self.max_x() > other.x
            && self.y < other.max_y()
            && self.max_y() > other.y
    }
}

/// Union of a sequence of bounds. `None` when the sequence is empty.
pub fn common_bounds(mut iter: impl Iterator<Item = Bounds>) -> Option<Bounds> {
    let first = iter.next()?;
    Some(iter.fold(first, |acc, b| acc.union(b)))
}

/// Snap a scalar to the nearest grid line. `None` grid means "grid off".
pub fn grid_snap(value: f32, grid: Option<f32>) -> f32 {
    match grid {
        Some(size) if size > 0.0 => (value / size).round() * size,
        _ => value,
    }
}

/// Snap both axes of a point to the grid.
pub fn grid_snap_point(p: Point, grid: Option<f32>) -> Point {
    Point::new(grid_snap(p.x, grid), grid_snap(p.y, grid))
}

/// Total length of a polyline (sum of consecutive segment lengths).
/// Degenerate (zero-length) segments contribute nothing.
pub fn polyline_length(points: &[Point]) -> f32 {
    points
        .windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bounds_union_covers_both() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(20.0, -5.0, 5.0, 5.0);
        let u = a.union(b);
        assert_eq!(u, Bounds::new(0.0, -5.0, 25.0, 15.0));
    }

    #[test]
    fn common_bounds_empty_is_none() {
        assert_eq!(common_bounds(std::iter::empty()), None);
    }

    #[test]
    fn grid_snap_rounds_to_nearest() {
        assert_eq!(grid_snap(14.0, Some(10.0)), 10.0);
        assert_eq!(grid_snap(15.0, Some(10.0)), 20.0);
        assert_eq!(grid_snap(-4.0, Some(10.0)), -0.0);
        // Grid off: value passes through
        assert_eq!(grid_snap(14.0, None), 14.0);
    }

    #[test]
    fn rotation_quarter_turn() {
        let p = Point::new(1.0, 0.0);
        let r = p.rotated_around(Point::ZERO, std::f32::consts::FRAC_PI_2);
        assert!(r.x.abs() < 1e-6);
        assert!((r.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn polyline_length_sums_segments() {
        let pts = [
            Point::ZERO,
            Point::new(3.0, 4.0),
            Point::new(3.0, 4.0), // zero-length segment is a no-op
            Point::new(6.0, 8.0),
        ];
        assert!((polyline_length(&pts) - 10.0).abs() < 1e-6);
    }
}
