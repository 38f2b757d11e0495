//! Axis-aligned ("elbow") routing for auto-routed arrows.
//!
//! Produces an orthogonal polyline between two endpoints. Each bound
//! endpoint exits its owner's box perpendicular to the nearest side and
//! clears it by the configured gap before turning. Interior waypoints are
//! derived — the editor treats them as route output, not user points —
//! except that a fixed interior segment keeps its cross-axis coordinate
//! across re-routes.

use ib_core::geometry::{Bounds, Point};

/// Exit direction from a bound endpoint's owner box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Heading::Left | Heading::Right)
    }

    fn vector(self) -> Point {
        match self {
            Heading::Up => Point::new(0.0, -1.0),
            Heading::Down => Point::new(0.0, 1.0),
            Heading::Left => Point::new(-1.0, 0.0),
            Heading::Right => Point::new(1.0, 0.0),
        }
    }
}

/// Inputs to one routing pass, in scene coordinates.
#[derive(Debug, Clone)]
pub struct ElbowRoute<'a> {
    pub start: Point,
    pub end: Point,
    /// Owner box of the bound start endpoint, if bound.
    pub start_bounds: Option<Bounds>,
    /// Owner box of the bound end endpoint, if bound.
    pub end_bounds: Option<Bounds>,
    /// Clearance kept between the path and each owner boundary.
    pub clearance: f32,
    /// Interior segment indices pinned to their previous coordinate.
    pub fixed_segments: &'a [usize],
    /// The previous routed points (for pinned coordinates). May be empty.
    pub previous: &'a [Point],
}

/// Which side of its owner box an endpoint sits on, preferring the axis
/// where the point is proportionally closest to the boundary. Unbound
/// endpoints head toward their opposite point.
pub fn heading_for(bounds: Option<Bounds>, point: Point, toward: Point) -> Heading {
    let delta = match bounds {
        Some(b) => {
            let c = b.center();
            Point::new(
                (point.x - c.x) / (b.width / 2.0).max(f32::EPSILON),
                (point.y - c.y) / (b.height / 2.0).max(f32::EPSILON),
            )
        }
        None => toward - point,
    };
    if delta.x.abs() >= delta.y.abs() {
        if delta.x >= 0.0 { Heading::Right } else { Heading::Left }
    } else if delta.y >= 0.0 {
        Heading::Down
    } else {
        Heading::Up
    }
}

/// Compute the routed global point list. Always starts at `route.start`
/// and ends at `route.end`; interior points are axis-aligned waypoints.
/// A degenerate span (same point) collapses to the minimal 2-point path.
pub fn route_elbow(route: &ElbowRoute<'_>) -> Vec<Point> {
    let ElbowRoute { start, end, .. } = *route;
    if (end - start).length() < f32::EPSILON {
        return vec![start, end];
    }

    let start_heading = heading_for(route.start_bounds, start, end);
    let end_heading = heading_for(route.end_bounds, end, start);

    // Step each bound endpoint out of its owner box by the clearance.
    let exit = step_out(start, start_heading, route.start_bounds, route.clearance);
    let entry = step_out(end, end_heading, route.end_bounds, route.clearance);

    let mut points = vec![start];
    if exit != start {
        points.push(exit);
    }

    match (start_heading.is_horizontal(), end_heading.is_horizontal()) {
        (true, true) => {
            // Both exits horizontal: route through a shared vertical segment.
            let mid_x = pinned_coordinate(route, true).unwrap_or((exit.x + entry.x) / 2.0);
            points.push(Point::new(mid_x, exit.y));
            points.push(Point::new(mid_x, entry.y));
        }
        (false, false) => {
            let mid_y = pinned_coordinate(route, false).unwrap_or((exit.y + entry.y) / 2.0);
            points.push(Point::new(exit.x, mid_y));
            points.push(Point::new(entry.x, mid_y));
        }
        (true, false) => {
            // One bend: horizontal run, then vertical into the entry.
            points.push(Point::new(entry.x, exit.y));
        }
        (false, true) => {
            points.push(Point::new(exit.x, entry.y));
        }
    }

    if entry != end {
        points.push(entry);
    }
    points.push(end);
    dedup_collinear(points)
}

/// Move `point` out of `bounds` along `heading` until it clears the
/// inflated box. Unbound endpoints stay put.
fn step_out(point: Point, heading: Heading, bounds: Option<Bounds>, clearance: f32) -> Point {
    let Some(b) = bounds else {
        return point;
    };
    let inflated = b.inflated(clearance);
    let v = heading.vector();
    let target = match heading {
        Heading::Up => inflated.y,
        Heading::Down => inflated.max_y(),
        Heading::Left => inflated.x,
        Heading::Right => inflated.max_x(),
    };
    let distance = match heading {
        Heading::Up | Heading::Down => (target - point.y).abs(),
        Heading::Left | Heading::Right => (target - point.x).abs(),
    };
    Point::new(point.x + v.x * distance, point.y + v.y * distance)
}

/// Coordinate of the first fixed interior segment from the previous route:
/// x of a vertical segment (`want_vertical`) or y of a horizontal one.
fn pinned_coordinate(route: &ElbowRoute<'_>, want_vertical: bool) -> Option<f32> {
    for &index in route.fixed_segments {
        let (Some(a), Some(b)) = (route.previous.get(index), route.previous.get(index + 1)) else {
            continue;
        };
        let vertical = (a.x - b.x).abs() < f32::EPSILON;
        if vertical == want_vertical {
            return Some(if vertical { a.x } else { a.y });
        }
    }
    None
}

/// Drop repeated points and merge collinear runs so every remaining
/// segment is a real bend.
fn dedup_collinear(points: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_some_and(|last| (*last - p).length() < f32::EPSILON) {
            continue;
        }
        if out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let collinear = ((a.x - b.x).abs() < f32::EPSILON && (b.x - p.x).abs() < f32::EPSILON)
                || ((a.y - b.y).abs() < f32::EPSILON && (b.y - p.y).abs() < f32::EPSILON);
            if collinear {
                out.pop();
            }
        }
        out.push(p);
    }
    if out.len() < 2 {
        let only = out.first().copied().unwrap_or(Point::ZERO);
        out = vec![only, only];
    }
    out
}
