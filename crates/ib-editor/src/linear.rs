//! Point-level editing state for linear elements (lines and arrows).
//!
//! Hover and selection are keyed by point index. Elbow-routed arrows are
//! special: only the first and last points are real, independently
//! draggable points — interior points are derived route waypoints, shown
//! as segment-midpoint affordances that are either "fixed" (pinned during
//! re-routing) or "free".
//!
//! State machine: none → point hovered → point(s) selected → dragging →
//! point(s) selected. Selection persists when the gesture ends; drag state
//! clears.

use ib_core::geometry::{Bounds, Point};
use ib_core::id::ElementId;
use ib_core::model::{Element, Routing};
use ib_core::scene::{ElementUpdate, MutateOptions, Scene};
use smallvec::SmallVec;

/// Handle diameter in screen pixels; scene-space size divides by zoom.
pub const POINT_HANDLE_SIZE: f32 = 10.0;

/// Segments shorter than this on screen get no midpoint affordance.
const MIN_SEGMENT_HANDLE_LENGTH: f32 = 4.0 * POINT_HANDLE_SIZE;

/// A segment-midpoint affordance of an elbow arrow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentMidpoint {
    /// Index of the segment (between points `index` and `index + 1`).
    pub index: usize,
    pub position: Point,
    /// Fixed segments are excluded from re-routing.
    pub fixed: bool,
}

/// Per-element point editing state.
#[derive(Debug, Clone)]
pub struct LinearEditor {
    pub element_id: ElementId,
    /// Full point-edit mode (double-clicked in), as opposed to the reduced
    /// handle set shown when the element is merely the sole selection.
    pub editing: bool,
    pub hovered_point: Option<usize>,
    pub selected_points: SmallVec<[usize; 4]>,
    /// Hovered segment-midpoint affordance, in scene coordinates.
    pub hovered_midpoint: Option<Point>,
    dragging: bool,
}

impl LinearEditor {
    pub fn new(element_id: ElementId) -> Self {
        Self {
            element_id,
            editing: false,
            hovered_point: None,
            selected_points: SmallVec::new(),
            hovered_midpoint: None,
            dragging: false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_point_selected(&self, index: usize) -> bool {
        self.selected_points.contains(&index)
    }

    /// Index of the point under the pointer, if within the zoom-scaled
    /// handle radius. Elbow arrows expose only their terminal points.
    pub fn point_at(element: &Element, pointer: Point, zoom: f32) -> Option<usize> {
        let body = element.linear()?;
        let radius = POINT_HANDLE_SIZE / zoom.max(f32::EPSILON);
        let points = element.points_global();
        let mut best: Option<(usize, f32)> = None;
        for (idx, p) in points.iter().enumerate() {
            if body.is_elbow() && idx != 0 && idx + 1 != points.len() {
                continue;
            }
            let d = p.distance(pointer);
            if d <= radius && best.is_none_or(|(_, bd)| d < bd) {
                best = Some((idx, d));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Update hover state from the pointer position.
    pub fn hover_at(&mut self, element: &Element, pointer: Point, zoom: f32) {
        self.hovered_point = Self::point_at(element, pointer, zoom);
        self.hovered_midpoint = segment_midpoints(element, zoom)
            .into_iter()
            .find(|mp| mp.position.distance(pointer) <= POINT_HANDLE_SIZE / zoom.max(f32::EPSILON))
            .map(|mp| mp.position);
    }

    /// Select the point under the pointer. Non-additive selection replaces
    /// the current set. Returns true if a point was hit.
    pub fn select_at(&mut self, element: &Element, pointer: Point, zoom: f32, additive: bool) -> bool {
        match Self::point_at(element, pointer, zoom) {
            Some(idx) => {
                if additive {
                    if let Some(pos) = self.selected_points.iter().position(|i| *i == idx) {
                        self.selected_points.remove(pos);
                    } else {
                        self.selected_points.push(idx);
                    }
                } else if !self.selected_points.contains(&idx) {
                    self.selected_points.clear();
                    self.selected_points.push(idx);
                }
                true
            }
            None => {
                if !additive {
                    self.selected_points.clear();
                }
                false
            }
        }
    }

    pub fn begin_drag(&mut self) {
        if !self.selected_points.is_empty() {
            self.dragging = true;
        }
    }

    /// Interaction end: selection persists, drag state clears.
    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Move the selected points by `delta` through the store. Elbow arrows
    /// only ever move their terminal points; interior indices are ignored.
    pub fn drag_selected(&self, scene: &mut Scene, delta: Point) {
        if !self.dragging || self.selected_points.is_empty() {
            return;
        }
        let Some(element) = scene.get(self.element_id) else {
            return;
        };
        let Some(body) = element.linear() else {
            return;
        };
        let last = body.points.len().saturating_sub(1);
        let origin = element.origin();
        let mut moved = false;
        let mut global: Vec<Point> = body.points.iter().map(|p| origin + *p).collect();
        for &idx in &self.selected_points {
            if idx >= global.len() {
                continue;
            }
            if body.is_elbow() && idx != 0 && idx != last {
                continue;
            }
            global[idx] = global[idx] + delta;
            moved = true;
        }
        if moved {
            let update = update_from_points(&global);
            scene.mutate(self.element_id, update, MutateOptions::default());
        }
    }
}

/// Midpoint affordances for an elbow arrow's segments. Segments shorter
/// than the zoom-scaled minimum are skipped so handles don't crowd when
/// zoomed far out.
pub fn segment_midpoints(element: &Element, zoom: f32) -> Vec<SegmentMidpoint> {
    let Some(body) = element.linear() else {
        return Vec::new();
    };
    let Routing::Elbow { fixed_segments } = &body.routing else {
        return Vec::new();
    };
    let points = element.points_global();
    points
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| !is_segment_too_short(pair[0], pair[1], zoom))
        .map(|(index, pair)| SegmentMidpoint {
            index,
            position: pair[0].midpoint(pair[1]),
            fixed: fixed_segments.contains(&index),
        })
        .collect()
}

/// True when a segment is too short at the current zoom to deserve a
/// midpoint handle.
pub fn is_segment_too_short(a: Point, b: Point, zoom: f32) -> bool {
    a.distance(b) * zoom < MIN_SEGMENT_HANDLE_LENGTH
}

/// Build the store update for a replacement global point list, restoring
/// the local-origin invariant (`points[0] == (0, 0)`) and refreshing the
/// element box to the point bbox.
pub fn update_from_points(global_points: &[Point]) -> ElementUpdate {
    let origin = global_points.first().copied().unwrap_or(Point::ZERO);
    let local: Vec<Point> = global_points.iter().map(|p| *p - origin).collect();
    let bbox = local
        .iter()
        .fold(Bounds::default(), |acc, p| {
            acc.union(Bounds::new(p.x, p.y, 0.0, 0.0))
        });
    ElementUpdate {
        x: Some(origin.x),
        y: Some(origin.y),
        width: Some(bbox.width),
        height: Some(bbox.height),
        points: Some(local),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ib_core::model::{ElementKind, LinearBody};

    fn line(id: &str, points: Vec<Point>, elbow: bool) -> Element {
        let mut body = LinearBody {
            points,
            routing: if elbow {
                Routing::Elbow {
                    fixed_segments: vec![1],
                }
            } else {
                Routing::Straight
            },
            start_binding: None,
            end_binding: None,
        };
        if body.points.is_empty() {
            body.points.push(Point::ZERO);
        }
        let bbox = body
            .points
            .iter()
            .fold(Bounds::default(), |acc, p| {
                acc.union(Bounds::new(p.x, p.y, 0.0, 0.0))
            });
        Element::new(
            ElementId::intern(id),
            ElementKind::Line(body),
            0.0,
            0.0,
            bbox.width,
            bbox.height,
        )
    }

    #[test]
    fn hover_then_select_then_drag_clears_to_selected() {
        let el = line(
            "l1",
            vec![Point::ZERO, Point::new(100.0, 0.0), Point::new(100.0, 80.0)],
            false,
        );
        let mut editor = LinearEditor::new(el.id);

        editor.hover_at(&el, Point::new(99.0, 1.0), 1.0);
        assert_eq!(editor.hovered_point, Some(1));

        assert!(editor.select_at(&el, Point::new(99.0, 1.0), 1.0, false));
        assert_eq!(editor.selected_points.as_slice(), &[1]);

        editor.begin_drag();
        assert!(editor.is_dragging());
        editor.end_drag();
        assert!(!editor.is_dragging());
        // Selection survives the gesture
        assert_eq!(editor.selected_points.as_slice(), &[1]);
    }

    #[test]
    fn elbow_interior_points_are_not_hit() {
        let el = line(
            "elbow",
            vec![
                Point::ZERO,
                Point::new(50.0, 0.0),
                Point::new(50.0, 100.0),
                Point::new(120.0, 100.0),
            ],
            true,
        );
        // Interior waypoint at (50, 0) is not individually addressable
        assert_eq!(LinearEditor::point_at(&el, Point::new(50.0, 0.0), 1.0), None);
        // Terminals are
        assert_eq!(LinearEditor::point_at(&el, Point::new(0.0, 1.0), 1.0), Some(0));
        assert_eq!(
            LinearEditor::point_at(&el, Point::new(119.0, 100.0), 1.0),
            Some(3)
        );
    }

    #[test]
    fn short_segments_get_no_midpoint_handle() {
        let el = line(
            "elbow2",
            vec![
                Point::ZERO,
                Point::new(200.0, 0.0),
                Point::new(200.0, 8.0),
                Point::new(400.0, 8.0),
            ],
            true,
        );
        let mids = segment_midpoints(&el, 1.0);
        // The 8-unit middle segment is below the handle threshold
        let indices: Vec<usize> = mids.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 2]);
        // Zoomed far out, the long segments drop out too
        assert!(segment_midpoints(&el, 0.05).is_empty());
    }

    #[test]
    fn fixed_segment_flag_follows_membership() {
        let el = line(
            "elbow3",
            vec![
                Point::ZERO,
                Point::new(200.0, 0.0),
                Point::new(200.0, 150.0),
                Point::new(400.0, 150.0),
            ],
            true,
        );
        let mids = segment_midpoints(&el, 1.0);
        let by_index: Vec<(usize, bool)> = mids.iter().map(|m| (m.index, m.fixed)).collect();
        assert_eq!(by_index, vec![(0, false), (1, true), (2, false)]);
    }

    #[test]
    fn update_from_points_restores_origin_invariant() {
        let update = update_from_points(&[Point::new(10.0, 20.0), Point::new(40.0, 60.0)]);
        assert_eq!(update.x, Some(10.0));
        assert_eq!(update.y, Some(20.0));
        assert_eq!(
            update.points,
            Some(vec![Point::ZERO, Point::new(30.0, 40.0)])
        );
        assert_eq!(update.width, Some(30.0));
        assert_eq!(update.height, Some(40.0));
    }
}
