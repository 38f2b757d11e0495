//! Binding resolution: re-deriving dependent geometry after an owner moves.
//!
//! Three binding shapes exist:
//! - endpoint bindings (arrow/line ends tracking a bindable shape's
//!   boundary),
//! - container bindings (text embedded in a shape, recomputed from the
//!   container's box),
//! - anchored annotations (leader lines pinned to a point on an owner,
//!   tracking a target element's center).
//!
//! The resolver mutates only dependents, never the moved element, and is
//! idempotent: anchors are derived from owner geometry and stable
//! reference points, so a second pass with an unchanged owner is a no-op.

use crate::linear::update_from_points;
use crate::route::{ElbowRoute, route_elbow};
use ib_core::geometry::Point;
use ib_core::id::ElementId;
use ib_core::model::{AuxData, BoundKind, Element, ElementKind, Routing};
use ib_core::scene::{ElementUpdate, MutateOptions, Scene};
use std::collections::HashSet;

/// Clearance kept between a bound endpoint's path and its owner boundary.
pub const FIXED_BINDING_DISTANCE: f32 = 5.0;

/// The capture gap: pixel radius around a bindable boundary within which a
/// dragged endpoint binds on release. Scales with the element but stays
/// within a fixed screen-pixel band.
pub fn max_binding_gap(element: &Element, zoom: f32) -> f32 {
    let smaller = element.width.min(element.height);
    (smaller * 0.25).clamp(16.0, 32.0) / zoom.max(f32::EPSILON)
}

/// Point on `owner`'s boundary along the ray from its center toward
/// `toward`, pushed out by `gap`. Rotation-aware: the ray is evaluated in
/// the owner's local frame.
pub fn boundary_anchor(owner: &Element, toward: Point, gap: f32) -> Point {
    let center = owner.center();
    let local_toward = toward.rotated_around(center, -owner.angle);
    let dir = (local_toward - center).normalized();
    if dir == Point::ZERO {
        return center;
    }

    let a = owner.width / 2.0 + gap;
    let b = owner.height / 2.0 + gap;
    let t = match owner.kind {
        ElementKind::Ellipse => {
            let denom = ((dir.x / a.max(f32::EPSILON)).powi(2)
                + (dir.y / b.max(f32::EPSILON)).powi(2))
            .sqrt();
            1.0 / denom.max(f32::EPSILON)
        }
        ElementKind::Diamond => {
            let denom = dir.x.abs() / a.max(f32::EPSILON) + dir.y.abs() / b.max(f32::EPSILON);
            1.0 / denom.max(f32::EPSILON)
        }
        ElementKind::Rectangle
        | ElementKind::Frame
        | ElementKind::Text(_)
        | ElementKind::Image(_) => {
            let tx = if dir.x.abs() > 0.0 { a / dir.x.abs() } else { f32::INFINITY };
            let ty = if dir.y.abs() > 0.0 { b / dir.y.abs() } else { f32::INFINITY };
            tx.min(ty)
        }
        // Linear elements are not bindable; fall back to the center.
        ElementKind::Line(_) | ElementKind::Arrow(_) => 0.0,
    };

    let local = Point::new(center.x + dir.x * t, center.y + dir.y * t);
    local.rotated_around(center, owner.angle)
}

/// Re-derive every element bound to `moved_id` after its geometry changed.
/// Dependents present in `simultaneously_updated` are being moved by the
/// same gesture and are skipped to avoid double displacement.
pub fn update_bound_elements(
    moved_id: ElementId,
    scene: &mut Scene,
    simultaneously_updated: &HashSet<ElementId>,
) {
    let Some(moved) = scene.get(moved_id) else {
        return;
    };
    let dependents: Vec<_> = moved.bound_elements.iter().copied().collect();
    for dep in dependents {
        match dep.kind {
            BoundKind::Text => refresh_bound_text(moved_id, scene),
            BoundKind::Arrow => {
                if simultaneously_updated.contains(&dep.id) {
                    continue;
                }
                resolve_linear_binding(dep.id, scene);
            }
        }
    }
}

/// Recompute a linear element's bound endpoints from its owners' current
/// geometry. Straight lines move only the bound endpoints; elbow arrows
/// re-run the router so the path still clears the owners.
pub fn resolve_linear_binding(linear_id: ElementId, scene: &mut Scene) {
    let Some(element) = scene.get(linear_id) else {
        return;
    };
    let Some(body) = element.linear() else {
        return;
    };
    if body.points.len() < 2 {
        return;
    }

    let origin = element.origin();
    let global: Vec<Point> = body.points.iter().map(|p| origin + *p).collect();
    let last = global.len() - 1;

    let start_owner = body
        .start_binding
        .and_then(|b| scene.get(b.element_id).map(|o| (o, b.gap)));
    let end_owner = body
        .end_binding
        .and_then(|b| scene.get(b.element_id).map(|o| (o, b.gap)));

    // Anchor rays need stable reference points or resolution would drift:
    // a 2-point span with both ends bound aims each anchor at the other
    // owner's center; otherwise the adjacent point is already stable.
    let both_bound_segment = global.len() == 2 && start_owner.is_some() && end_owner.is_some();

    let start_anchor = start_owner.map(|(owner, gap)| {
        let toward = if both_bound_segment {
            end_owner.map(|(o, _)| o.center()).unwrap_or(global[last])
        } else {
            global[1]
        };
        boundary_anchor(owner, toward, gap)
    });
    let end_anchor = end_owner.map(|(owner, gap)| {
        let toward = if both_bound_segment {
            start_owner.map(|(o, _)| o.center()).unwrap_or(global[0])
        } else {
            global[last - 1]
        };
        boundary_anchor(owner, toward, gap)
    });

    let update = match &body.routing {
        Routing::Elbow { fixed_segments } => {
            let start = start_anchor.unwrap_or(global[0]);
            let end = end_anchor.unwrap_or(global[last]);
            let routed = route_elbow(&ElbowRoute {
                start,
                end,
                start_bounds: start_owner.map(|(o, _)| o.bounds()),
                end_bounds: end_owner.map(|(o, _)| o.bounds()),
                clearance: FIXED_BINDING_DISTANCE,
                fixed_segments,
                previous: &global,
            });
            update_from_points(&routed)
        }
        Routing::Straight => {
            let mut next = global.clone();
            if let Some(anchor) = start_anchor {
                next[0] = anchor;
            }
            if let Some(anchor) = end_anchor {
                next[last] = anchor;
            }
            if next == global {
                return;
            }
            update_from_points(&next)
        }
    };

    scene.mutate(linear_id, update, MutateOptions::default());
}

/// Recompute a container's embedded text position from the container box.
pub fn refresh_bound_text(container_id: ElementId, scene: &mut Scene) {
    let Some(container) = scene.get(container_id) else {
        return;
    };
    let center = container.center();
    let Some(text) = scene.bound_text_of(container_id) else {
        return;
    };
    let (text_id, w, h) = (text.id, text.width, text.height);
    scene.mutate(
        text_id,
        ElementUpdate::position(Point::new(center.x - w / 2.0, center.y - h / 2.0)),
        MutateOptions::default(),
    );
}

/// Recompute an anchored-annotation line from its stored anchor and its
/// target's current center.
pub fn refresh_annotation(line_id: ElementId, scene: &mut Scene) {
    let Some(line) = scene.get(line_id) else {
        return;
    };
    let Some(AuxData::AnchoredAnnotation {
        target_id, anchor, ..
    }) = line.aux.clone()
    else {
        return;
    };
    let Some(target) = scene.get(target_id) else {
        return;
    };
    let update = update_from_points(&[anchor, target.center()]);
    scene.mutate(line_id, update, MutateOptions::default());
}

/// Recompute every annotation proportionally pinned to `parent` from the
/// relative anchor fraction stored at bind time — not the absolute offset,
/// so the anchor stays glued to the same spot on a moved or resized parent.
pub fn refresh_annotations_for_parent(parent_id: ElementId, scene: &mut Scene) {
    let Some(parent) = scene.get(parent_id) else {
        return;
    };
    let parent_bounds = parent.bounds();
    let annotations: Vec<(ElementId, AuxData)> = scene
        .annotations_owned_by(parent_id)
        .filter_map(|e| e.aux.clone().map(|aux| (e.id, aux)))
        .collect();

    for (line_id, aux) in annotations {
        let AuxData::AnchoredAnnotation {
            target_id,
            owner_id,
            anchor,
            anchor_fraction,
        } = aux
        else {
            continue;
        };
        let new_anchor = match anchor_fraction {
            Some(f) => Point::new(
                parent_bounds.x + f.x * parent_bounds.width,
                parent_bounds.y + f.y * parent_bounds.height,
            ),
            None => anchor,
        };
        let Some(target) = scene.get(target_id) else {
            continue;
        };
        let mut update = update_from_points(&[new_anchor, target.center()]);
        update.aux = Some(AuxData::AnchoredAnnotation {
            target_id,
            owner_id,
            anchor: new_anchor,
            anchor_fraction,
        });
        scene.mutate(line_id, update, MutateOptions::default());
    }
}
