//! Integration tests: binding resolution (ib-editor).
//!
//! Verifies that dependent elements (bound arrows, embedded text, anchored
//! annotations) are re-derived — not translated — when their owners move,
//! and that resolution is idempotent.

use ib_core::geometry::Point;
use ib_core::id::ElementId;
use ib_core::model::{
    AuxData, BoundElement, BoundKind, Element, ElementKind, LinearBody, PointBinding, TextBody,
};
use ib_core::scene::{ElementUpdate, MutateOptions, Scene};
use ib_editor::binding::{
    refresh_annotations_for_parent, resolve_linear_binding, update_bound_elements,
};
use ib_editor::drag::{GestureSnapshot, drag_selection};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn rect(id: &str, x: f32, y: f32, w: f32, h: f32) -> Element {
    Element::new(ElementId::intern(id), ElementKind::Rectangle, x, y, w, h)
}

/// Two shapes with a straight arrow bound between their boundaries.
fn arrow_between(scene: &mut Scene, a: &str, b: &str, arrow: &str, gap: f32) -> ElementId {
    let arrow_id = ElementId::intern(arrow);
    for owner in [a, b] {
        let owner_id = ElementId::intern(owner);
        if let Some(el) = scene.get(owner_id) {
            let mut el = el.clone();
            el.bound_elements.push(BoundElement {
                id: arrow_id,
                kind: BoundKind::Arrow,
            });
            scene.insert(el);
        }
    }
    let mut body = LinearBody::segment(Point::new(100.0, 0.0));
    body.start_binding = Some(PointBinding {
        element_id: ElementId::intern(a),
        gap,
    });
    body.end_binding = Some(PointBinding {
        element_id: ElementId::intern(b),
        gap,
    });
    scene.insert(Element::new(
        arrow_id,
        ElementKind::Arrow(body),
        120.0,
        50.0,
        100.0,
        0.0,
    ));
    // Settle the arrow onto the owners' boundaries.
    resolve_linear_binding(arrow_id, scene);
    arrow_id
}

// ─── Idempotency ────────────────────────────────────────────────────────

#[test]
fn resolving_twice_changes_nothing_the_second_time() {
    let mut scene = Scene::new();
    scene.insert(rect("a", 0.0, 0.0, 100.0, 100.0));
    scene.insert(rect("b", 300.0, 0.0, 100.0, 100.0));
    let arrow_id = arrow_between(&mut scene, "a", "b", "link", 5.0);
    let a_id = ElementId::intern("a");

    // Move the owner directly through the store.
    scene.mutate(
        a_id,
        ElementUpdate::position(Point::new(20.0, 40.0)),
        MutateOptions::default(),
    );

    let no_set = HashSet::new();
    update_bound_elements(a_id, &mut scene, &no_set);
    let after_first = scene.get(arrow_id).unwrap().clone();

    update_bound_elements(a_id, &mut scene, &no_set);
    let after_second = scene.get(arrow_id).unwrap().clone();

    // Byte-identical dependent state apart from the version counter.
    assert_eq!(after_first.points_global(), after_second.points_global());
    assert_eq!(after_first.origin(), after_second.origin());
    assert_eq!(
        (after_first.width, after_first.height),
        (after_second.width, after_second.height)
    );
}

// ─── End-to-end: drag two shapes, arrow follows ─────────────────────────

#[test]
fn dragging_both_owners_rederives_the_unselected_arrow() {
    let mut scene = Scene::new();
    scene.insert(rect("a", 0.0, 0.0, 100.0, 100.0));
    scene.insert(rect("b", 300.0, 0.0, 100.0, 100.0));
    let arrow_id = arrow_between(&mut scene, "a", "b", "link2", 5.0);
    let a_id = ElementId::intern("a");
    let b_id = ElementId::intern("b");

    let snapshot = GestureSnapshot::capture_all(&scene);
    drag_selection(
        &snapshot,
        &[a_id, b_id],
        &mut scene,
        Point::new(20.0, -5.0),
        Point::ZERO,
        None,
    );

    // Both owners moved by exactly the offset.
    assert_eq!(scene.get(a_id).unwrap().origin(), Point::new(20.0, -5.0));
    assert_eq!(scene.get(b_id).unwrap().origin(), Point::new(320.0, -5.0));

    // The arrow's endpoints were re-resolved to the new boundaries (owner
    // centers are at y = 45 now; the gap keeps 5 units of clearance).
    let points = scene.get(arrow_id).unwrap().points_global();
    assert_eq!(points.len(), 2);
    assert!((points[0].x - 125.0).abs() < 1e-3, "start {:?}", points[0]);
    assert!((points[0].y - 45.0).abs() < 1e-3);
    assert!((points[1].x - 315.0).abs() < 1e-3, "end {:?}", points[1]);
    assert!((points[1].y - 45.0).abs() < 1e-3);
}

#[test]
fn arrow_in_selection_is_not_double_displaced() {
    let mut scene = Scene::new();
    scene.insert(rect("a", 0.0, 0.0, 100.0, 100.0));
    scene.insert(rect("b", 300.0, 0.0, 100.0, 100.0));
    let arrow_id = arrow_between(&mut scene, "a", "b", "link3", 5.0);
    let a_id = ElementId::intern("a");
    let b_id = ElementId::intern("b");

    let settled = scene.get(arrow_id).unwrap().points_global();
    let snapshot = GestureSnapshot::capture_all(&scene);
    drag_selection(
        &snapshot,
        &[a_id, b_id, arrow_id],
        &mut scene,
        Point::new(40.0, 10.0),
        Point::ZERO,
        None,
    );

    // Everything moved as a unit: the arrow is exactly the settled shape
    // translated by the offset, not translated-then-re-resolved twice.
    let expected: Vec<Point> = settled
        .iter()
        .map(|p| *p + Point::new(40.0, 10.0))
        .collect();
    let actual = scene.get(arrow_id).unwrap().points_global();
    for (e, a) in expected.iter().zip(&actual) {
        assert!((e.x - a.x).abs() < 1e-3 && (e.y - a.y).abs() < 1e-3, "{e:?} vs {a:?}");
    }
}

// ─── Container-bound text ───────────────────────────────────────────────

#[test]
fn bound_text_recenters_in_moved_container() {
    let mut scene = Scene::new();
    let container_id = ElementId::intern("card");
    let text_id = ElementId::intern("card_label");

    let mut container = rect("card", 0.0, 0.0, 200.0, 100.0);
    container.bound_elements.push(BoundElement {
        id: text_id,
        kind: BoundKind::Text,
    });
    scene.insert(container);
    scene.insert(Element::new(
        text_id,
        ElementKind::Text(TextBody {
            container_id: Some(container_id),
            ..Default::default()
        }),
        60.0,
        37.5,
        80.0,
        25.0,
    ));

    let snapshot = GestureSnapshot::capture_all(&scene);
    drag_selection(
        &snapshot,
        &[container_id],
        &mut scene,
        Point::new(30.0, 60.0),
        Point::ZERO,
        None,
    );

    let container_after = scene.get(container_id).unwrap();
    let text_after = scene.get(text_id).unwrap();
    assert_eq!(container_after.origin(), Point::new(30.0, 60.0));
    // Text is recomputed from the container box, centered.
    assert_eq!(text_after.center(), container_after.center());
}

// ─── Anchored annotations ───────────────────────────────────────────────

#[test]
fn proportional_anchor_survives_owner_resize() {
    let mut scene = Scene::new();
    let parent_id = ElementId::intern("sheet");
    let mut parent = rect("sheet", 0.0, 0.0, 100.0, 100.0);
    parent.aux = Some(AuxData::CompositeParent);
    scene.insert(parent);

    let target_id = ElementId::intern("tag");
    scene.insert(rect("tag", 300.0, 300.0, 20.0, 20.0));

    let leader_id = ElementId::intern("tag_leader");
    let mut leader = Element::new(
        leader_id,
        ElementKind::Line(LinearBody::segment(Point::new(260.0, 260.0))),
        50.0,
        50.0,
        260.0,
        260.0,
    );
    leader.aux = Some(AuxData::AnchoredAnnotation {
        target_id,
        owner_id: Some(parent_id),
        anchor: Point::new(50.0, 50.0),
        anchor_fraction: Some(Point::new(0.5, 0.5)),
    });
    scene.insert(leader);

    // Resize the owner from 100x100 to 200x50.
    scene.mutate(
        parent_id,
        ElementUpdate::size(200.0, 50.0),
        MutateOptions::default(),
    );
    refresh_annotations_for_parent(parent_id, &mut scene);

    // The anchor tracked the proportional position — the new center, not
    // the old absolute offset.
    let leader_after = scene.get(leader_id).unwrap();
    assert_eq!(leader_after.origin(), Point::new(100.0, 25.0));
    let Some(AuxData::AnchoredAnnotation { anchor, .. }) = leader_after.aux.clone() else {
        panic!("annotation role lost");
    };
    assert_eq!(anchor, Point::new(100.0, 25.0));
    // Free end still points at the target's center.
    assert_eq!(leader_after.points_global()[1], Point::new(310.0, 310.0));
}

#[test]
fn moving_annotation_target_updates_leader_free_end() {
    let mut scene = Scene::new();
    let target_id = ElementId::intern("note_box");
    scene.insert(rect("note_box", 200.0, 200.0, 40.0, 20.0));

    let leader_id = ElementId::intern("note_leader");
    let mut leader = Element::new(
        leader_id,
        ElementKind::Line(LinearBody::segment(Point::new(170.0, 160.0))),
        50.0,
        50.0,
        170.0,
        160.0,
    );
    leader.aux = Some(AuxData::AnchoredAnnotation {
        target_id,
        owner_id: None,
        anchor: Point::new(50.0, 50.0),
        anchor_fraction: None,
    });
    scene.insert(leader);

    let snapshot = GestureSnapshot::capture_all(&scene);
    drag_selection(
        &snapshot,
        &[target_id],
        &mut scene,
        Point::new(-20.0, 10.0),
        Point::ZERO,
        None,
    );

    let leader_after = scene.get(leader_id).unwrap();
    // The pinned end stayed put; the free end tracks the moved target.
    assert_eq!(leader_after.origin(), Point::new(50.0, 50.0));
    assert_eq!(leader_after.points_global()[1], Point::new(200.0, 220.0));
}
