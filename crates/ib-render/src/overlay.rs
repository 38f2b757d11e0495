//! The interactive overlay: selection chrome drawn on top of the rendered
//! scene every frame.
//!
//! Pure function of (scene, editor state, render config) → Vello drawing
//! commands. Draw steps run in a fixed order (later steps occlude earlier
//! ones) and each step is contained: a failing step is logged and skipped,
//! never aborting the rest of the frame's overlay. Every stroke width,
//! handle size, padding, and dash pattern divides by the zoom factor so
//! chrome keeps a constant screen size.
//!
//! Transform discipline: every step derives its own `Affine` from the
//! viewport (scene-space steps compose zoom∘scroll, screen-space steps use
//! the identity), so no step can leak transform state into the next.

use crate::handles::{
    HandleKind, OmitHandles, PointerDevice, TRANSFORM_HANDLE_SPACING, TransformHandle,
    omit_for_device, transform_handles,
};
use crate::measure::measurement_label;
use crate::scrollbar::{ScrollBars, scrollbars};
use ib_core::geometry::{Bounds, Point, common_bounds};
use ib_core::model::{Color, Element, ElementKind};
use ib_core::scene::Scene;
use ib_editor::binding::max_binding_gap;
use ib_editor::linear::{LinearEditor, POINT_HANDLE_SIZE, segment_midpoints};
use ib_editor::state::{BindingEnd, EditorState, SuggestedBinding};
use kurbo::{Affine, BezPath, Circle, Line, Rect, Stroke};
use peniko::Fill;
use vello::Scene as Surface;

// ─── Overlay palette ─────────────────────────────────────────────────────

const POINT_STROKE: Color = Color::rgb(0.37, 0.35, 0.85);
const POINT_FILL: Color = Color::rgba(1.0, 1.0, 1.0, 0.9);
const POINT_SELECTED_FILL: Color = Color::rgba(0.53, 0.51, 0.89, 0.9);
const POINT_PHANTOM_FILL: Color = Color::rgba(0.69, 0.59, 0.99, 0.7);
const POINT_HOVER_FILL: Color = Color::rgba(0.41, 0.4, 0.86, 0.4);
const BINDING_HIGHLIGHT: Color = Color::rgba(0.0, 0.0, 0.0, 0.05);
const FRAME_HIGHLIGHT: Color = Color::rgb(0.0, 0.46, 1.0);
const GROUP_BOX: Color = Color::rgb(0.0, 0.0, 0.0);
const MEASURE_LEADER: Color = Color::rgba(0.0, 0.0, 0.0, 0.4);
const MEASURE_CARD_FILL: Color = Color::rgba(1.0, 1.0, 1.0, 0.9);
const MEASURE_CARD_BORDER: Color = Color::rgba(0.0, 0.0, 0.0, 0.3);
const SEARCH_MATCH: Color = Color::rgba(1.0, 0.89, 0.0, 0.4);
const SEARCH_MATCH_FOCUSED: Color = Color::rgba(1.0, 0.49, 0.0, 0.4);
const SNAP_GUIDE: Color = Color::rgb(1.0, 0.42, 0.42);
const SCROLLBAR_FILL: Color = Color::rgba(0.0, 0.0, 0.0, 0.3);

// ─── Configuration & outcome ─────────────────────────────────────────────

/// Per-frame render configuration from the hosting layer.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub selection_color: Color,
    /// Viewport size in screen pixels.
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub device: PointerDevice,
    pub render_scrollbars: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            selection_color: Color::rgb(0.41, 0.4, 0.86),
            viewport_width: 800.0,
            viewport_height: 600.0,
            device: PointerDevice::Mouse,
            render_scrollbars: true,
        }
    }
}

/// What the overlay produced this frame, mirrored back to the caller.
#[derive(Debug, Clone, Default)]
pub struct OverlayOutcome {
    pub scrollbars: Option<ScrollBars>,
    pub at_least_one_visible: bool,
}

/// Paint the full interactive overlay for one frame. Call at most once per
/// animation tick (see the frame throttle); reads the live scene passed in
/// for this frame, never a cached copy.
pub fn paint_overlay(
    surface: &mut Surface,
    scene: &Scene,
    state: &EditorState,
    config: &RenderConfig,
) -> OverlayOutcome {
    let mut painter = OverlayPainter {
        surface,
        scene,
        state,
        config,
        zoom: state.zoom.value.max(f32::EPSILON),
    };

    contained("linear-edit-handles", painter.linear_edit_handles());
    contained("selection-rect", painter.selection_rect());
    contained("text-edit-outline", painter.text_edit_outline());
    contained("binding-highlights", painter.binding_highlights());
    contained("frame-highlight", painter.frame_highlight());
    contained("element-box-highlight", painter.element_box_highlight());
    contained("measurement-labels", painter.measurement_labels());
    contained("linear-point-chrome", painter.linear_point_chrome());
    contained("selection-borders", painter.selection_borders());
    contained("transform-handles", painter.transform_handle_chrome());
    contained("crop-handles", painter.crop_handles());
    contained("search-matches", painter.search_matches());
    contained("snap-guides", painter.snap_guides());
    contained("remote-cursors", painter.remote_cursors());

    let scrollbars = config.render_scrollbars.then(|| painter.scrollbar_thumbs());

    OverlayOutcome {
        scrollbars,
        at_least_one_visible: !scene.is_empty(),
    }
}

/// A failing step must not take the rest of the overlay down with it.
fn contained(step: &str, result: Result<(), String>) {
    if let Err(err) = result {
        log::warn!("overlay step '{step}' failed: {err}");
    }
}

// ─── Painter ─────────────────────────────────────────────────────────────

struct OverlayPainter<'a> {
    surface: &'a mut Surface,
    scene: &'a Scene,
    state: &'a EditorState,
    config: &'a RenderConfig,
    zoom: f32,
}

impl OverlayPainter<'_> {
    /// Scene-space drawing transform: zoom then scroll.
    fn view(&self) -> Affine {
        Affine::scale(self.zoom as f64)
            * Affine::translate((self.state.scroll.x as f64, self.state.scroll.y as f64))
    }

    /// Scene-space transform with an element rotation composed in.
    fn view_rotated(&self, angle: f32, center: Point) -> Affine {
        self.view() * Affine::rotate_about(angle as f64, kpoint(center))
    }

    fn screen(&self, p: Point) -> Point {
        Point::new(
            (p.x + self.state.scroll.x) * self.zoom,
            (p.y + self.state.scroll.y) * self.zoom,
        )
    }

    fn thin_stroke(&self) -> Stroke {
        Stroke::new((1.0 / self.zoom) as f64)
    }

    // ─── Step 1: point handles while in full point-edit mode ────────────

    fn linear_edit_handles(&mut self) -> Result<(), String> {
        let Some(editor) = &self.state.linear_editor else {
            return Ok(());
        };
        if !editor.editing {
            return Ok(());
        }
        self.point_handles_for(editor)
    }

    // ─── Step 2: in-progress selection rectangle ────────────────────────

    fn selection_rect(&mut self) -> Result<(), String> {
        if self.state.is_cropping {
            return Ok(());
        }
        let Some(rect) = self.state.selection_rect else {
            return Ok(());
        };
        let view = self.view();
        let shape = krect(rect);
        self.surface.fill(
            Fill::NonZero,
            view,
            color(self.config.selection_color.with_alpha(0.1)),
            None,
            &shape,
        );
        self.surface.stroke(
            &self.thin_stroke(),
            view,
            color(self.config.selection_color),
            None,
            &shape,
        );
        Ok(())
    }

    // ─── Step 3: outline around fixed-size text under edit ──────────────

    fn text_edit_outline(&mut self) -> Result<(), String> {
        let Some(id) = self.state.editing_text else {
            return Ok(());
        };
        let Some(element) = self.scene.get(id) else {
            return Ok(());
        };
        let ElementKind::Text(body) = &element.kind else {
            return Err(format!("editing_text {id} is not a text element"));
        };
        if body.auto_resize {
            return Ok(());
        }
        let padding = (TRANSFORM_HANDLE_SPACING * 2.0) / self.zoom;
        let shape = krect(element.bounds().inflated(padding));
        self.surface.stroke(
            &self.thin_stroke(),
            self.view_rotated(element.angle, element.center()),
            color(self.config.selection_color),
            None,
            &shape,
        );
        Ok(())
    }

    // ─── Step 4: binding-candidate highlights ───────────────────────────

    fn binding_highlights(&mut self) -> Result<(), String> {
        if !self.state.binding_enabled {
            return Ok(());
        }
        for suggestion in &self.state.suggested_bindings {
            match *suggestion {
                SuggestedBinding::Shape(id) => {
                    let Some(element) = self.scene.get(id) else {
                        continue;
                    };
                    self.bindable_highlight(element);
                }
                SuggestedBinding::Point { linear_id, end } => {
                    let Some(element) = self.scene.get(linear_id) else {
                        continue;
                    };
                    let points = element.points_global();
                    if points.len() < 2 {
                        continue;
                    }
                    let gap = max_binding_gap(element, self.zoom);
                    let view = self.view();
                    let first = points[0];
                    let last = points[points.len() - 1];
                    let ends = match end {
                        BindingEnd::Start => vec![first],
                        BindingEnd::End => vec![last],
                        BindingEnd::Both => vec![first, last],
                    };
                    for p in ends {
                        self.surface.fill(
                            Fill::NonZero,
                            view,
                            color(BINDING_HIGHLIGHT),
                            None,
                            &Circle::new(kpoint(p), gap as f64),
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Translucent wash over a bindable shape, padded by the capture gap so
    /// the highlight reads as a halo rather than covering the body.
    fn bindable_highlight(&mut self, element: &Element) {
        let gap = max_binding_gap(element, self.zoom);
        let transform = self.view_rotated(element.angle, element.center());
        let outer = element.bounds().inflated(gap);
        match element.kind {
            ElementKind::Ellipse => {
                let stroke = Stroke::new(gap as f64);
                let b = element.bounds().inflated(gap / 2.0);
                let shape = kurbo::Ellipse::new(
                    kpoint(b.center()),
                    (b.width as f64 / 2.0, b.height as f64 / 2.0),
                    0.0,
                );
                self.surface
                    .stroke(&stroke, transform, color(BINDING_HIGHLIGHT), None, &shape);
            }
            ElementKind::Diamond => {
                let c = outer.center();
                let mut path = BezPath::new();
                path.move_to((c.x as f64, outer.y as f64));
                path.line_to((outer.max_x() as f64, c.y as f64));
                path.line_to((c.x as f64, outer.max_y() as f64));
                path.line_to((outer.x as f64, c.y as f64));
                path.close_path();
                self.surface
                    .fill(Fill::NonZero, transform, color(BINDING_HIGHLIGHT), None, &path);
            }
            _ => {
                self.surface.fill(
                    Fill::NonZero,
                    transform,
                    color(BINDING_HIGHLIGHT),
                    None,
                    &krect(outer),
                );
            }
        }
    }

    // ─── Step 5: frame drop target + ad hoc element-box highlight ───────

    fn frame_highlight(&mut self) -> Result<(), String> {
        let Some(id) = self.state.frame_highlight else {
            return Ok(());
        };
        let Some(frame) = self.scene.get(id) else {
            return Ok(());
        };
        if !frame.is_frame() {
            return Err(format!("frame_highlight {id} is not a frame"));
        }
        let radius = (8.0 / self.zoom) as f64;
        let shape = krect(frame.bounds()).to_rounded_rect(radius);
        let stroke = Stroke::new((2.0 / self.zoom) as f64);
        self.surface.stroke(
            &stroke,
            self.view_rotated(frame.angle, frame.center()),
            color(FRAME_HIGHLIGHT),
            None,
            &shape,
        );
        Ok(())
    }

    fn element_box_highlight(&mut self) -> Result<(), String> {
        if self.state.highlighted_elements.is_empty() {
            return Ok(());
        }
        let bounds = common_bounds(
            self.state
                .highlighted_elements
                .iter()
                .filter_map(|id| self.scene.get(*id))
                .map(|e| e.bounds()),
        );
        let Some(bounds) = bounds else {
            return Ok(());
        };
        self.surface.stroke(
            &self.thin_stroke(),
            self.view(),
            color(FRAME_HIGHLIGHT),
            None,
            &krect(bounds),
        );
        Ok(())
    }

    // ─── Step 6: measurement annotations ────────────────────────────────

    fn measurement_labels(&mut self) -> Result<(), String> {
        let view = self.view();
        for element in self.scene.iter().filter(|e| e.is_measurement()) {
            let Some(label) =
                measurement_label(element, &self.state.calibration, self.state.selected_unit)
            else {
                continue;
            };

            let leader = Line::new(kpoint(label.leader_start), kpoint(label.leader_end));
            let dashed = Stroke::new(1.0).with_dashes(0.0, [2.0, 2.0]);
            self.surface
                .stroke(&dashed, view, color(MEASURE_LEADER), None, &leader);

            let card = krect(label.card);
            self.surface
                .fill(Fill::NonZero, view, color(MEASURE_CARD_FILL), None, &card);
            self.surface
                .stroke(&Stroke::new(1.0), view, color(MEASURE_CARD_BORDER), None, &card);
            // Glyph shaping needs the scene renderer's font context; the
            // card and leader carry the layout, the text rides on top.
            log::trace!("measure label {:?} at {:?}", label.text, label.card);
        }
        Ok(())
    }

    // ─── Step 7: point chrome for the active/solely-selected linear ─────

    fn linear_point_chrome(&mut self) -> Result<(), String> {
        let Some(editor) = &self.state.linear_editor else {
            return Ok(());
        };
        let Some(element) = self.scene.get(editor.element_id) else {
            return Ok(());
        };
        if element.linear().is_none() {
            return Err(format!("linear editor bound to non-linear {}", element.id));
        }

        // Hovered midpoint affordance takes precedence over point hover.
        if let Some(mid) = editor.hovered_midpoint {
            self.highlight_point(mid);
        } else if let Some(idx) = editor.hovered_point {
            let last = element.linear().map(|b| b.points.len() - 1).unwrap_or(0);
            let hover_allowed = if element.is_elbow_arrow() {
                idx == 0 || idx == last
            } else {
                true
            };
            if hover_allowed && !editor.is_point_selected(idx) {
                let points = element.points_global();
                if let Some(p) = points.get(idx) {
                    self.highlight_point(*p);
                }
            }
        }

        // The reduced handle set when the element is solely selected.
        if !editor.editing
            && self.state.selected.len() == 1
            && self.state.selected[0] == editor.element_id
            && !element.locked
        {
            self.point_handles_for(editor)?;
        }
        Ok(())
    }

    fn highlight_point(&mut self, p: Point) {
        let radius = (POINT_HANDLE_SIZE / self.zoom) as f64;
        self.surface.fill(
            Fill::NonZero,
            self.view(),
            color(POINT_HOVER_FILL),
            None,
            &Circle::new(kpoint(p), radius),
        );
    }

    /// Shared point-handle painter: terminal/user points as solid handles,
    /// elbow segment midpoints as phantom (fixed ones solid).
    fn point_handles_for(&mut self, editor: &LinearEditor) -> Result<(), String> {
        let Some(element) = self.scene.get(editor.element_id) else {
            return Ok(());
        };
        let Some(body) = element.linear() else {
            return Err(format!("point handles for non-linear {}", element.id));
        };
        let view = self.view();
        let radius = if editor.editing {
            POINT_HANDLE_SIZE / self.zoom
        } else {
            POINT_HANDLE_SIZE / 2.0 / self.zoom
        };

        let points = element.points_global();
        let last = points.len().saturating_sub(1);
        let is_elbow = body.is_elbow();
        for (idx, p) in points.iter().enumerate() {
            if is_elbow && idx != 0 && idx != last {
                continue;
            }
            let fill = if editor.is_point_selected(idx) {
                POINT_SELECTED_FILL
            } else {
                POINT_FILL
            };
            let shape = Circle::new(kpoint(*p), radius as f64);
            self.surface.fill(Fill::NonZero, view, color(fill), None, &shape);
            self.surface
                .stroke(&self.thin_stroke(), view, color(POINT_STROKE), None, &shape);
        }

        for midpoint in segment_midpoints(element, self.zoom) {
            let fill = if midpoint.fixed { POINT_FILL } else { POINT_PHANTOM_FILL };
            let shape = Circle::new(kpoint(midpoint.position), (radius / 2.0).max(2.0 / self.zoom) as f64);
            self.surface.fill(Fill::NonZero, view, color(fill), None, &shape);
            if midpoint.fixed {
                self.surface
                    .stroke(&self.thin_stroke(), view, color(POINT_STROKE), None, &shape);
            }
        }
        Ok(())
    }

    // ─── Steps 8–9: selection borders and group boxes ───────────────────

    fn selection_borders(&mut self) -> Result<(), String> {
        if self.state.linear_editor.as_ref().is_some_and(|e| e.editing) {
            return Ok(());
        }
        if !self.should_show_bounding_box() {
            return Ok(());
        }

        let single_linear_selected = self.state.selected.len() == 1
            && self
                .scene
                .get(self.state.selected[0])
                .is_some_and(|e| e.is_linear());

        for element in self.scene.iter() {
            // A bound elbow arrow shows its endpoints, not a border.
            if single_linear_selected
                && element.is_elbow_arrow()
                && element
                    .linear()
                    .is_some_and(|b| b.start_binding.is_some() || b.end_binding.is_some())
            {
                continue;
            }

            let mut colors: Vec<Color> = Vec::new();
            if self.state.is_selected(element.id)
                && !self.state.is_selected_via_group(&element.group_ids)
            {
                colors.push(self.config.selection_color);
            }
            let mut dashed = false;
            for collaborator in &self.state.collaborators {
                if collaborator.selected.contains(&element.id) {
                    colors.push(collaborator.color);
                    dashed = true;
                }
            }
            if colors.is_empty() {
                continue;
            }

            let padding = if element.is_image() || self.state.cropping_element == Some(element.id)
            {
                0.0
            } else {
                (TRANSFORM_HANDLE_SPACING * 2.0) / self.zoom
            };
            self.stroke_border(
                element.bounds().inflated(padding),
                element.angle,
                element.center(),
                &colors,
                dashed,
            );
        }

        // Group bounding boxes: fully-selected groups plus the group being
        // edited in isolation.
        let mut group_ids: Vec<_> = self.state.selected_group_ids.clone();
        if let Some(editing) = self.state.editing_group
            && !group_ids.contains(&editing)
        {
            group_ids.push(editing);
        }
        for group in group_ids {
            let members = common_bounds(
                self.scene
                    .iter()
                    .filter(|e| e.group_ids.contains(&group))
                    .map(|e| e.bounds()),
            );
            if let Some(bounds) = members {
                self.stroke_border(bounds, 0.0, bounds.center(), &[GROUP_BOX], true);
            }
        }
        Ok(())
    }

    /// One border rectangle per selecting party, dash offset incremented
    /// per party so overlapping selections stay distinguishable.
    fn stroke_border(
        &mut self,
        bounds: Bounds,
        angle: f32,
        center: Point,
        colors: &[Color],
        dashed: bool,
    ) {
        let transform = self.view_rotated(angle, center);
        let shape = krect(bounds);
        let dash_on = (8.0 / self.zoom) as f64;
        let dash_gap = (4.0 / self.zoom) as f64;
        let count = colors.len();
        for (index, c) in colors.iter().enumerate() {
            let mut stroke = self.thin_stroke();
            if dashed {
                let cycle_gap = dash_gap + (dash_on + dash_gap) * (count as f64 - 1.0);
                stroke = stroke
                    .with_dashes((dash_on + dash_gap) * index as f64, [dash_on, cycle_gap]);
            }
            self.surface.stroke(&stroke, transform, color(*c), None, &shape);
        }
    }

    /// A single two-point linear element shows point handles instead of a
    /// bounding box. Everything else (including remote-only selections)
    /// gets borders.
    fn should_show_bounding_box(&self) -> bool {
        if self.state.selected.len() != 1 {
            return true;
        }
        match self.scene.get(self.state.selected[0]) {
            Some(element) => match element.linear() {
                Some(body) => body.points.len() > 2,
                None => true,
            },
            None => false,
        }
    }

    // ─── Step 10: transform handles ─────────────────────────────────────

    fn transform_handle_chrome(&mut self) -> Result<(), String> {
        if self.state.linear_editor.as_ref().is_some_and(|e| e.editing) {
            return Ok(());
        }
        let selected: Vec<&Element> = self
            .state
            .selected
            .iter()
            .filter_map(|id| self.scene.get(*id))
            .collect();
        match selected.len() {
            0 => Ok(()),
            1 => {
                let element = selected[0];
                if element.locked
                    || !self.should_show_bounding_box()
                    || self.state.editing_text == Some(element.id)
                    || self.state.cropping_element.is_some()
                {
                    return Ok(());
                }
                let handles = transform_handles(
                    element.bounds(),
                    self.zoom,
                    omit_for_device(self.config.device),
                );
                self.draw_handles(&handles, element.angle, element.center());
                Ok(())
            }
            _ => {
                if self.state.is_rotating {
                    return Ok(());
                }
                let Some(bounds) = common_bounds(selected.iter().map(|e| e.bounds())) else {
                    return Ok(());
                };
                let padding = (TRANSFORM_HANDLE_SPACING * 2.0) / self.zoom;
                let boxed = bounds.inflated(padding);
                let dash = (2.0 / self.zoom) as f64;
                let stroke = self.thin_stroke().with_dashes(0.0, [dash]);
                self.surface.stroke(
                    &stroke,
                    self.view(),
                    color(self.config.selection_color),
                    None,
                    &krect(boxed),
                );

                if selected.iter().all(|e| e.locked) {
                    return Ok(());
                }
                let mut omit = omit_for_device(self.config.device);
                if selected.iter().any(|e| e.is_frame()) {
                    omit = OmitHandles {
                        rotation: true,
                        ..omit
                    };
                }
                let handles = transform_handles(bounds, self.zoom, omit);
                self.draw_handles(&handles, 0.0, bounds.center());
                Ok(())
            }
        }
    }

    fn draw_handles(&mut self, handles: &[TransformHandle], angle: f32, center: Point) {
        let transform = self.view_rotated(angle, center);
        let white = color(Color::rgb(1.0, 1.0, 1.0));
        for handle in handles {
            if handle.kind == HandleKind::Rotation {
                let shape = Circle::new(
                    kpoint(handle.bounds.center()),
                    (handle.bounds.width / 2.0) as f64,
                );
                self.surface.fill(Fill::NonZero, transform, white, None, &shape);
                self.surface.stroke(
                    &self.thin_stroke(),
                    transform,
                    color(self.config.selection_color),
                    None,
                    &shape,
                );
            } else {
                let radius = (2.0 / self.zoom) as f64;
                let shape = krect(handle.bounds).to_rounded_rect(radius);
                self.surface.fill(Fill::NonZero, transform, white, None, &shape);
                self.surface.stroke(
                    &self.thin_stroke(),
                    transform,
                    color(self.config.selection_color),
                    None,
                    &shape,
                );
            }
        }
    }

    // ─── Step 11: crop-mode corner guides ───────────────────────────────

    fn crop_handles(&mut self) -> Result<(), String> {
        let Some(id) = self.state.cropping_element else {
            return Ok(());
        };
        if self.state.is_cropping {
            return Ok(());
        }
        let Some(element) = self.scene.get(id) else {
            return Ok(());
        };
        if !element.is_image() {
            return Err(format!("cropping element {id} is not an image"));
        }

        let line_width = 3.0 / self.zoom;
        let line_length = (20.0 / self.zoom)
            .min(element.width / 2.0)
            .min(element.height / 2.0);
        let stroke = Stroke::new(line_width as f64);
        let transform = self.view_rotated(element.angle, element.center());
        let b = element.bounds().inflated(line_width);

        // One L per corner: a horizontal and a vertical tick.
        let corners = [
            (b.x, b.y, 1.0, 1.0),
            (b.max_x(), b.y, -1.0, 1.0),
            (b.x, b.max_y(), 1.0, -1.0),
            (b.max_x(), b.max_y(), -1.0, -1.0),
        ];
        for (x, y, sx, sy) in corners {
            let horizontal = Line::new(
                (x as f64, y as f64),
                ((x + sx * line_length) as f64, y as f64),
            );
            let vertical = Line::new(
                (x as f64, y as f64),
                (x as f64, (y + sy * line_length) as f64),
            );
            self.surface.stroke(
                &stroke,
                transform,
                color(self.config.selection_color),
                None,
                &horizontal,
            );
            self.surface.stroke(
                &stroke,
                transform,
                color(self.config.selection_color),
                None,
                &vertical,
            );
        }
        Ok(())
    }

    // ─── Step 12: search-match highlights ───────────────────────────────

    fn search_matches(&mut self) -> Result<(), String> {
        for m in &self.state.search_matches {
            let Some(element) = self.scene.get(m.element_id) else {
                continue;
            };
            let fill = if m.focused { SEARCH_MATCH_FOCUSED } else { SEARCH_MATCH };
            let transform = self.view_rotated(element.angle, element.center());
            for region in &m.regions {
                // Regions are element-local; clip each fill to its region.
                let shape = krect(Bounds::new(
                    element.x + region.x,
                    element.y + region.y,
                    region.width.min(element.width - region.x).max(0.0),
                    region.height.min(element.height - region.y).max(0.0),
                ));
                self.surface.fill(Fill::NonZero, transform, color(fill), None, &shape);
            }
        }
        Ok(())
    }

    // ─── Step 13: snapping guide lines ──────────────────────────────────

    fn snap_guides(&mut self) -> Result<(), String> {
        let view = self.view();
        for guide in &self.state.snap_guides {
            let shape = Line::new(kpoint(guide.from), kpoint(guide.to));
            self.surface
                .stroke(&self.thin_stroke(), view, color(SNAP_GUIDE), None, &shape);
        }
        Ok(())
    }

    // ─── Step 14: remote collaborator cursors (screen space) ────────────

    fn remote_cursors(&mut self) -> Result<(), String> {
        for collaborator in &self.state.collaborators {
            let Some(cursor) = collaborator.cursor else {
                continue;
            };
            let p = self.screen(cursor);
            let mut pointer = BezPath::new();
            pointer.move_to(kpoint(p));
            pointer.line_to((p.x as f64 + 4.0, p.y as f64 + 12.0));
            pointer.line_to((p.x as f64 + 7.0, p.y as f64 + 7.0));
            pointer.line_to((p.x as f64 + 12.0, p.y as f64 + 4.0));
            pointer.close_path();
            // Cursors live outside the scrolled scene: identity transform.
            self.surface.fill(
                Fill::NonZero,
                Affine::IDENTITY,
                color(collaborator.color),
                None,
                &pointer,
            );
            log::trace!("cursor for {:?} at {p:?}", collaborator.username);
        }
        Ok(())
    }

    // ─── Step 15: scrollbars (screen space, last) ───────────────────────

    fn scrollbar_thumbs(&mut self) -> ScrollBars {
        let content = common_bounds(self.scene.iter().map(|e| e.bounds())).unwrap_or_default();
        let bars = scrollbars(
            content,
            self.config.viewport_width,
            self.config.viewport_height,
            self.state.scroll,
            self.zoom,
        );
        for thumb in [bars.horizontal, bars.vertical].into_iter().flatten() {
            let radius = (SCROLLBAR_RADIUS) as f64;
            let shape = krect(thumb).to_rounded_rect(radius);
            self.surface
                .fill(Fill::NonZero, Affine::IDENTITY, color(SCROLLBAR_FILL), None, &shape);
        }
        bars
    }
}

const SCROLLBAR_RADIUS: f32 = 3.0;

// ─── Conversions ─────────────────────────────────────────────────────────

fn kpoint(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

fn krect(b: Bounds) -> Rect {
    Rect::new(
        b.x as f64,
        b.y as f64,
        (b.x + b.width) as f64,
        (b.y + b.height) as f64,
    )
}

fn color(c: Color) -> peniko::Color {
    peniko::Color::from_rgba8(
        (c.r.clamp(0.0, 1.0) * 255.0).round() as u8,
        (c.g.clamp(0.0, 1.0) * 255.0).round() as u8,
        (c.b.clamp(0.0, 1.0) * 255.0).round() as u8,
        (c.a.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}
