//! The drag engine: pointer-driven move of a selection, and sizing of a
//! freshly created element from its anchor point.
//!
//! Every position is computed from the immutable start-of-gesture snapshot
//! plus the current total offset — never from the live element plus a
//! delta — so repeated pointer-move events cannot compound error. The
//! engine mutates the store, then cascades through the binding resolver
//! with the full set of simultaneously moved ids so dependents being
//! dragged in the same gesture are not displaced twice.

use crate::binding::{
    refresh_annotation, refresh_annotations_for_parent, update_bound_elements,
};
use ib_core::geometry::{Point, common_bounds, grid_snap_point};
use ib_core::id::ElementId;
use ib_core::model::{Element, ElementKind, TextBody};
use ib_core::scene::{ElementUpdate, MutateOptions, Scene};
use std::collections::{HashMap, HashSet};

/// Horizontal drag distance (screen pixels) beyond which a new text
/// element keeps manual wrapping after release.
pub const TEXT_AUTOWRAP_THRESHOLD: f32 = 36.0;

/// Element geometry captured once at pointer down, read-only for the rest
/// of the gesture. Supplied by the calling tool layer.
#[derive(Debug, Clone, Default)]
pub struct GestureSnapshot {
    originals: HashMap<ElementId, Element>,
}

impl GestureSnapshot {
    /// Snapshot specific elements.
    pub fn capture<I: IntoIterator<Item = ElementId>>(scene: &Scene, ids: I) -> Self {
        let originals = ids
            .into_iter()
            .filter_map(|id| scene.get(id).cloned().map(|e| (id, e)))
            .collect();
        Self { originals }
    }

    /// Snapshot the whole scene (the common pointer-down choice).
    pub fn capture_all(scene: &Scene) -> Self {
        Self {
            originals: scene.iter().map(|e| (e.id, e.clone())).collect(),
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.originals.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.originals.contains_key(&id)
    }
}

/// Move the selection by the pointer offset, carrying every dependent
/// along and re-resolving bindings. Precondition violations abort the
/// whole call with zero mutations — partial application is forbidden.
pub fn drag_selection(
    snapshot: &GestureSnapshot,
    selection: &[ElementId],
    scene: &mut Scene,
    pointer_offset: Point,
    snap_offset: Point,
    grid: Option<f32>,
) {
    let selected: Vec<&Element> = selection.iter().filter_map(|id| scene.get(*id)).collect();

    // A lone elbow arrow with a binding is repositioned only by its
    // owners' geometry, never dragged directly.
    if selected.len() == 1
        && selected[0].is_elbow_arrow()
        && selected[0]
            .linear()
            .is_some_and(|b| b.start_binding.is_some() || b.end_binding.is_some())
    {
        return;
    }

    // An elbow arrow bound at both ends moves only when both owners are
    // part of the same selection.
    let selected: Vec<&Element> = selected
        .into_iter()
        .filter(|el| {
            if !el.is_elbow_arrow() {
                return true;
            }
            match el.linear() {
                Some(body) => match (body.start_binding, body.end_binding) {
                    (Some(start), Some(end)) => {
                        selection.contains(&start.element_id)
                            && selection.contains(&end.element_id)
                    }
                    _ => true,
                },
                None => true,
            }
        })
        .collect();

    // Expand to the effective update set: bound text, frame children, and
    // composite children (their anchored annotations are recomputed
    // separately, not translated).
    let mut effective: Vec<ElementId> = Vec::new();
    let mut effective_set: HashSet<ElementId> = HashSet::new();
    for el in &selected {
        if effective_set.insert(el.id) {
            effective.push(el.id);
        }
    }
    for el in &selected {
        if el.is_arrow() {
            continue;
        }
        if let Some(text) = scene.bound_text_of(el.id)
            && effective_set.insert(text.id)
        {
            effective.push(text.id);
        }
    }
    let frames: Vec<ElementId> = selected.iter().filter(|e| e.is_frame()).map(|e| e.id).collect();
    for frame in frames {
        let children: Vec<ElementId> = scene.children_of_frame(frame).map(|e| e.id).collect();
        for child in children {
            if effective_set.insert(child) {
                effective.push(child);
            }
        }
    }
    let parents: Vec<ElementId> = selected
        .iter()
        .filter(|e| e.is_composite_parent())
        .map(|e| e.id)
        .collect();
    for parent in &parents {
        let children: Vec<ElementId> = scene
            .composite_children(*parent)
            .filter(|e| !e.is_anchored_annotation())
            .map(|e| e.id)
            .collect();
        for child in children {
            if effective_set.insert(child) {
                effective.push(child);
            }
        }
    }

    if effective.is_empty() {
        return;
    }

    // A member without a snapshot entry (e.g. a duplicate created
    // mid-drag) would move from undefined geometry — hard abort.
    if effective.iter().any(|id| !snapshot.contains(*id)) {
        log::trace!("drag aborted: snapshot missing an effective-set entry");
        return;
    }

    let Some(orig_bounds) =
        common_bounds(effective.iter().filter_map(|id| snapshot.get(*id)).map(|e| e.bounds()))
    else {
        return;
    };
    let offset = adjusted_offset(orig_bounds.origin(), pointer_offset, snap_offset, grid);

    // Per-element facts gathered before mutation starts.
    struct DragItem {
        id: ElementId,
        is_arrow: bool,
        is_composite_parent: bool,
        text_container: Option<ElementId>,
    }
    let items: Vec<DragItem> = effective
        .iter()
        .filter_map(|id| scene.get(*id))
        .map(|el| DragItem {
            id: el.id,
            is_arrow: el.is_arrow(),
            is_composite_parent: el.is_composite_parent(),
            text_container: el.text().and_then(|t| t.container_id),
        })
        .collect();

    let options = MutateOptions {
        synchronized_drag: true,
    };
    for item in &items {
        let Some(original) = snapshot.get(item.id) else {
            continue; // verified above
        };
        scene.mutate(
            item.id,
            ElementUpdate::position(original.origin() + offset),
            options,
        );

        if !item.is_arrow {
            update_bound_elements(item.id, scene, &effective_set);
        }
        if item.is_composite_parent {
            refresh_annotations_for_parent(item.id, scene);
        }

        // A moved annotation target drags its leader's free end along.
        let leaders: Vec<ElementId> = scene.annotations_targeting(item.id).map(|e| e.id).collect();
        for leader in leaders {
            refresh_annotation(leader, scene);
        }
        // Text embedded in an annotated container moves the container's
        // leaders the same way.
        if let Some(container) = item.text_container {
            let leaders: Vec<ElementId> =
                scene.annotations_targeting(container).map(|e| e.id).collect();
            for leader in leaders {
                refresh_annotation(leader, scene);
            }
        }
    }
}

/// The single offset shared by the whole effective set. An axis with an
/// explicit snap target uses it verbatim; an axis with a zero snap offset
/// falls back to grid snapping, so one axis can snap to the grid while the
/// other follows an external snap line.
fn adjusted_offset(origin: Point, pointer_offset: Point, snap_offset: Point, grid: Option<f32>) -> Point {
    let mut target = origin + pointer_offset + snap_offset;
    if snap_offset.x == 0.0 || snap_offset.y == 0.0 {
        let gridded = grid_snap_point(origin + pointer_offset, grid);
        if snap_offset.x == 0.0 {
            target.x = gridded.x;
        }
        if snap_offset.y == 0.0 {
            target.y = gridded.y;
        }
    }
    target - origin
}

/// Options for sizing a freshly created element from its anchor point.
#[derive(Debug, Clone, Copy)]
pub struct SizeNewElement {
    /// Anchor placed at pointer down.
    pub origin: Point,
    /// Current pointer position.
    pub current: Point,
    /// Constrain to a fixed aspect ratio.
    pub maintain_aspect: bool,
    /// Mirror around the anchor (size doubles).
    pub from_center: bool,
    /// Reference ratio for aspect-locked sizing (images use their initial
    /// dimensions); `None` derives a square from the dominant axis.
    pub width_aspect_ratio: Option<f32>,
    pub zoom: f32,
}

/// Size a new element from the vector `current - origin`. A computed size
/// of exactly zero on either axis leaves the element unmutated. Returns
/// whether a mutation was applied.
pub fn size_new_element(scene: &mut Scene, id: ElementId, params: &SizeNewElement) -> bool {
    let Some(element) = scene.get(id) else {
        return false;
    };
    let SizeNewElement {
        origin, current, ..
    } = *params;

    let mut width = (current.x - origin.x).abs();
    let mut height = (current.y - origin.y).abs();

    if params.maintain_aspect {
        if let Some(ratio) = params.width_aspect_ratio.filter(|r| *r > 0.0) {
            height = width / ratio;
        } else if (current.y - origin.y).abs() > (current.x - origin.x).abs() {
            // The cursor sticks to whichever edge moved farther.
            width = height;
        } else {
            height = width;
        }
    }

    let mut new_x = if current.x < origin.x { origin.x - width } else { origin.x };
    let mut new_y = if current.y < origin.y { origin.y - height } else { origin.y };

    if params.from_center {
        width += width;
        height += height;
        new_x = origin.x - width / 2.0;
        new_y = origin.y - height / 2.0;
    }

    let mut update = ElementUpdate::default();
    match &element.kind {
        ElementKind::Text(body) => {
            height = body.intrinsic_height();
            width = width.max(min_text_width(body));
            if (current.x - origin.x).abs() > TEXT_AUTOWRAP_THRESHOLD / params.zoom.max(f32::EPSILON)
            {
                // Dragged deliberately wide: keep manual wrapping after release.
                update.auto_resize = Some(false);
            }
            new_y = origin.y;
            if params.from_center {
                new_x = origin.x - width / 2.0;
            }
        }
        ElementKind::Image(_) => {
            update.initial_size = Some((width, height));
        }
        _ => {}
    }

    if width == 0.0 || height == 0.0 {
        return false;
    }

    update = update
        .with_position(Point::new(new_x, new_y))
        .with_size(width, height);
    scene.mutate(id, update, MutateOptions::default())
}

/// Minimum width a text element can be dragged to, from rough font
/// metrics (one glyph advance at the current size).
fn min_text_width(body: &TextBody) -> f32 {
    body.font_size * 0.6
}

#[cfg(test)]
mod tests {
    use super::*;
    use ib_core::model::{Element, ElementKind, ImageBody};

    fn scene_with(elements: Vec<Element>) -> Scene {
        let mut scene = Scene::new();
        for el in elements {
            scene.insert(el);
        }
        scene
    }

    #[test]
    fn zero_area_sizing_leaves_element_unmutated() {
        let id = ElementId::intern("new_rect");
        let mut scene = scene_with(vec![Element::new(
            id,
            ElementKind::Rectangle,
            10.0,
            10.0,
            0.0,
            0.0,
        )]);
        let mutated = size_new_element(
            &mut scene,
            id,
            &SizeNewElement {
                origin: Point::new(10.0, 10.0),
                current: Point::new(10.0, 80.0), // zero width
                maintain_aspect: false,
                from_center: false,
                width_aspect_ratio: None,
                zoom: 1.0,
            },
        );
        assert!(!mutated);
        let el = scene.get(id).unwrap();
        assert_eq!((el.x, el.y, el.width, el.height, el.version), (10.0, 10.0, 0.0, 0.0, 0));
    }

    #[test]
    fn aspect_lock_follows_dominant_axis() {
        let id = ElementId::intern("square");
        let mut scene = scene_with(vec![Element::new(
            id,
            ElementKind::Rectangle,
            0.0,
            0.0,
            0.0,
            0.0,
        )]);
        size_new_element(
            &mut scene,
            id,
            &SizeNewElement {
                origin: Point::ZERO,
                current: Point::new(40.0, 100.0),
                maintain_aspect: true,
                from_center: false,
                width_aspect_ratio: None,
                zoom: 1.0,
            },
        );
        let el = scene.get(id).unwrap();
        assert_eq!((el.width, el.height), (100.0, 100.0));
    }

    #[test]
    fn center_sizing_mirrors_around_origin() {
        let id = ElementId::intern("mirrored");
        let mut scene = scene_with(vec![Element::new(
            id,
            ElementKind::Rectangle,
            0.0,
            0.0,
            0.0,
            0.0,
        )]);
        size_new_element(
            &mut scene,
            id,
            &SizeNewElement {
                origin: Point::new(100.0, 100.0),
                current: Point::new(130.0, 120.0),
                maintain_aspect: false,
                from_center: true,
                width_aspect_ratio: None,
                zoom: 1.0,
            },
        );
        let el = scene.get(id).unwrap();
        assert_eq!((el.width, el.height), (60.0, 40.0));
        assert_eq!((el.x, el.y), (70.0, 80.0));
    }

    #[test]
    fn image_sizing_records_initial_dimensions() {
        let id = ElementId::intern("img");
        let mut scene = scene_with(vec![Element::new(
            id,
            ElementKind::Image(ImageBody::default()),
            0.0,
            0.0,
            0.0,
            0.0,
        )]);
        size_new_element(
            &mut scene,
            id,
            &SizeNewElement {
                origin: Point::ZERO,
                current: Point::new(80.0, 60.0),
                maintain_aspect: false,
                from_center: false,
                width_aspect_ratio: None,
                zoom: 1.0,
            },
        );
        let el = scene.get(id).unwrap();
        let body = el.image().unwrap();
        assert_eq!((body.initial_width, body.initial_height), (80.0, 60.0));
    }

    #[test]
    fn wide_text_drag_disables_auto_resize() {
        let id = ElementId::intern("wide_text");
        let mut scene = scene_with(vec![Element::new(
            id,
            ElementKind::Text(TextBody::default()),
            0.0,
            0.0,
            0.0,
            25.0,
        )]);
        size_new_element(
            &mut scene,
            id,
            &SizeNewElement {
                origin: Point::ZERO,
                current: Point::new(200.0, 10.0),
                maintain_aspect: false,
                from_center: false,
                width_aspect_ratio: None,
                zoom: 1.0,
            },
        );
        let el = scene.get(id).unwrap();
        let body = el.text().unwrap();
        assert!(!body.auto_resize);
        assert_eq!(el.height, body.intrinsic_height());

        // A narrow drag at high zoom also crosses the screen-space threshold
        let id2 = ElementId::intern("narrow_text");
        scene.insert(Element::new(
            id2,
            ElementKind::Text(TextBody::default()),
            0.0,
            0.0,
            0.0,
            25.0,
        ));
        size_new_element(
            &mut scene,
            id2,
            &SizeNewElement {
                origin: Point::ZERO,
                current: Point::new(20.0, 0.0),
                maintain_aspect: false,
                from_center: false,
                width_aspect_ratio: None,
                zoom: 4.0,
            },
        );
        assert!(!scene.get(id2).unwrap().text().unwrap().auto_resize);
    }
}
