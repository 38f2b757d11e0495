//! The scene store: the single shared mutable resource of the editor core.
//!
//! Owns the z-ordered element collection. Every geometry change funnels
//! through [`Scene::mutate`] — the one mutation entry point — which bumps
//! the element version and records the id as dirty so external caches
//! (rasterized shape fills, persistence, collaboration) can invalidate.
//! Everything else reads the scene through `get`/`iter`.

use crate::geometry::Point;
use crate::id::ElementId;
use crate::model::{AuxData, Element, ElementKind, PointBinding};
use std::collections::HashMap;

/// Partial attribute update applied by [`Scene::mutate`].
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementUpdate {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub angle: Option<f32>,
    /// Replacement local point list for linear elements.
    pub points: Option<Vec<Point>>,
    /// Text: manual-wrap flag.
    pub auto_resize: Option<bool>,
    /// Image: record the reference dimensions taken at first sizing.
    pub initial_size: Option<(f32, f32)>,
    /// Replace the auxiliary role payload.
    pub aux: Option<AuxData>,
    /// Outer `Some` = set or clear the binding.
    pub start_binding: Option<Option<PointBinding>>,
    pub end_binding: Option<Option<PointBinding>>,
}

impl ElementUpdate {
    pub fn position(p: Point) -> Self {
        Self {
            x: Some(p.x),
            y: Some(p.y),
            ..Default::default()
        }
    }

    pub fn size(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn with_position(mut self, p: Point) -> Self {
        self.x = Some(p.x);
        self.y = Some(p.y);
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = Some(points);
        self
    }
}

/// Options forwarded to downstream mutation consumers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutateOptions {
    /// Part of a multi-element synchronized drag: caching/undo collaborators
    /// treat the burst as one logical change.
    pub synchronized_drag: bool,
}

/// Z-ordered element collection with id-indexed lookup.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    order: Vec<ElementId>,
    elements: HashMap<ElementId, Element>,
    dirty: Vec<ElementId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element at the top of the z-order. Element creation is the
    /// calling tool layer's job; the store only registers the result.
    pub fn insert(&mut self, element: Element) {
        let id = element.id;
        if self.elements.insert(id, element).is_none() {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id).filter(|e| !e.is_deleted)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    /// Non-deleted elements in z-order (back to front).
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.order
            .iter()
            .filter_map(|id| self.elements.get(id))
            .filter(|e| !e.is_deleted)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// The single mutation entry point. Applies `update`, bumps the
    /// element's version, and marks it dirty. Returns false for an unknown
    /// or deleted id (no-op).
    pub fn mutate(&mut self, id: ElementId, update: ElementUpdate, options: MutateOptions) -> bool {
        let Some(element) = self.elements.get_mut(&id).filter(|e| !e.is_deleted) else {
            return false;
        };

        if let Some(x) = update.x {
            element.x = x;
        }
        if let Some(y) = update.y {
            element.y = y;
        }
        if let Some(width) = update.width {
            element.width = width.max(0.0);
        }
        if let Some(height) = update.height {
            element.height = height.max(0.0);
        }
        if let Some(angle) = update.angle {
            element.angle = angle;
        }
        if let Some(points) = update.points {
            debug_assert!(
                points.first().is_some_and(|p| *p == Point::ZERO),
                "linear point lists are normalized to a zero local origin"
            );
            if let Some(body) = element.linear_mut() {
                body.points = points;
            }
        }
        if let Some(auto_resize) = update.auto_resize
            && let ElementKind::Text(body) = &mut element.kind
        {
            body.auto_resize = auto_resize;
        }
        if let Some((w, h)) = update.initial_size
            && let ElementKind::Image(body) = &mut element.kind
        {
            body.initial_width = w;
            body.initial_height = h;
        }
        if let Some(aux) = update.aux {
            element.aux = Some(aux);
        }
        if let Some(binding) = update.start_binding
            && let Some(body) = element.linear_mut()
        {
            body.start_binding = binding;
        }
        if let Some(binding) = update.end_binding
            && let Some(body) = element.linear_mut()
        {
            body.end_binding = binding;
        }

        element.version += 1;
        log::trace!(
            "mutate {:?} v{} (synchronized_drag={})",
            id,
            element.version,
            options.synchronized_drag
        );
        if !self.dirty.contains(&id) {
            self.dirty.push(id);
        }
        true
    }

    /// Drain the ids mutated since the last call, in first-mutation order.
    /// Consumed by external cache-invalidation collaborators per frame.
    pub fn take_dirty(&mut self) -> Vec<ElementId> {
        std::mem::take(&mut self.dirty)
    }

    // ─── Relationship queries ────────────────────────────────────────────

    /// The text element embedded in `container_id`, if any.
    pub fn bound_text_of(&self, container_id: ElementId) -> Option<&Element> {
        let container = self.get(container_id)?;
        container.bound_text_id().and_then(|id| self.get(id))
    }

    /// Non-deleted elements whose `frame_id` matches `frame`.
    pub fn children_of_frame(&self, frame: ElementId) -> impl Iterator<Item = &Element> {
        self.iter().filter(move |e| e.frame_id == Some(frame))
    }

    /// Dependent members of a composite import parent.
    pub fn composite_children(&self, parent: ElementId) -> impl Iterator<Item = &Element> {
        self.iter().filter(move |e| {
            matches!(e.aux, Some(AuxData::CompositeChild { parent_id }) if parent_id == parent)
        })
    }

    /// Anchored-annotation lines whose free end tracks `target`.
    pub fn annotations_targeting(&self, target: ElementId) -> impl Iterator<Item = &Element> {
        self.iter().filter(move |e| {
            matches!(e.aux, Some(AuxData::AnchoredAnnotation { target_id, .. }) if target_id == target)
        })
    }

    /// Anchored-annotation lines proportionally pinned to `owner`.
    pub fn annotations_owned_by(&self, owner: ElementId) -> impl Iterator<Item = &Element> {
        self.iter().filter(move |e| {
            matches!(e.aux, Some(AuxData::AnchoredAnnotation { owner_id, .. }) if owner_id == Some(owner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundElement, BoundKind, TextBody};
    use pretty_assertions::assert_eq;

    fn rect(id: &str, x: f32, y: f32) -> Element {
        Element::new(ElementId::intern(id), ElementKind::Rectangle, x, y, 100.0, 50.0)
    }

    #[test]
    fn mutate_bumps_version_and_marks_dirty() {
        let mut scene = Scene::new();
        scene.insert(rect("a", 0.0, 0.0));
        let id = ElementId::intern("a");

        assert!(scene.mutate(id, ElementUpdate::position(Point::new(5.0, 5.0)), MutateOptions::default()));
        let el = scene.get(id).unwrap();
        assert_eq!(el.version, 1);
        assert_eq!((el.x, el.y), (5.0, 5.0));
        assert_eq!(scene.take_dirty(), vec![id]);
        assert_eq!(scene.take_dirty(), Vec::new());
    }

    #[test]
    fn mutate_unknown_id_is_noop() {
        let mut scene = Scene::new();
        assert!(!scene.mutate(
            ElementId::intern("ghost"),
            ElementUpdate::position(Point::ZERO),
            MutateOptions::default(),
        ));
        assert!(scene.take_dirty().is_empty());
    }

    #[test]
    fn negative_size_is_clamped() {
        let mut scene = Scene::new();
        scene.insert(rect("a", 0.0, 0.0));
        let id = ElementId::intern("a");
        scene.mutate(id, ElementUpdate::size(-10.0, 20.0), MutateOptions::default());
        let el = scene.get(id).unwrap();
        assert_eq!((el.width, el.height), (0.0, 20.0));
    }

    #[test]
    fn deleted_elements_are_invisible() {
        let mut scene = Scene::new();
        let mut el = rect("gone", 0.0, 0.0);
        el.is_deleted = true;
        scene.insert(el);
        assert_eq!(scene.get(ElementId::intern("gone")), None);
        assert_eq!(scene.len(), 0);
    }

    #[test]
    fn bound_text_lookup() {
        let mut scene = Scene::new();
        let mut container = rect("box", 0.0, 0.0);
        let text_id = ElementId::intern("label");
        container.bound_elements.push(BoundElement {
            id: text_id,
            kind: BoundKind::Text,
        });
        scene.insert(container);
        let mut text = Element::new(
            text_id,
            ElementKind::Text(TextBody {
                container_id: Some(ElementId::intern("box")),
                ..Default::default()
            }),
            10.0,
            10.0,
            80.0,
            25.0,
        );
        text.frame_id = None;
        scene.insert(text);

        let found = scene.bound_text_of(ElementId::intern("box")).unwrap();
        assert_eq!(found.id, text_id);
    }

    #[test]
    fn frame_children_query() {
        let mut scene = Scene::new();
        let frame_id = ElementId::intern("frame");
        scene.insert(Element::new(frame_id, ElementKind::Frame, 0.0, 0.0, 400.0, 300.0));
        let mut child = rect("inner", 10.0, 10.0);
        child.frame_id = Some(frame_id);
        scene.insert(child);
        scene.insert(rect("outside", 500.0, 0.0));

        let children: Vec<_> = scene.children_of_frame(frame_id).map(|e| e.id).collect();
        assert_eq!(children, vec![ElementId::intern("inner")]);
    }
}
