//! Core element model for Inkboard scenes.
//!
//! A scene is a flat, z-ordered collection of [`Element`]s. Containment is
//! expressed by data, not by a graph: frame membership via `frame_id`,
//! group membership via an ordered `group_ids` list (outermost last), and
//! binding relationships via [`PointBinding`]/[`BoundElement`] pairs plus
//! the [`AuxData`] tagged union for specialized element roles.
//!
//! Invariants:
//! - `width, height >= 0` for every element.
//! - A linear element has at least one point and `points[0]` is always the
//!   local origin; `(x, y)` is that origin in scene coordinates.
//! - Bindings are symmetric: a linear element holding a `PointBinding` to
//!   an owner appears in that owner's `bound_elements`.

use crate::geometry::{Bounds, Point};
use crate::id::{ElementId, GroupId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
///
/// Used for collaborator-assigned selection colors and overlay chrome;
/// shape fills are the scene renderer's concern, not this core's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// This color with its alpha replaced.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgba(
                byte(0)? as f32 / 255.0,
                byte(2)? as f32 / 255.0,
                byte(4)? as f32 / 255.0,
                1.0,
            )),
            8 => Some(Self::rgba(
                byte(0)? as f32 / 255.0,
                byte(2)? as f32 / 255.0,
                byte(4)? as f32 / 255.0,
                byte(6)? as f32 / 255.0,
            )),
            _ => None,
        }
    }
}

// ─── Bindings ────────────────────────────────────────────────────────────

/// An endpoint binding: this end of a linear element tracks the boundary of
/// `element_id`. The tracked point is the intersection of the owner's
/// boundary with the ray from the owner's center toward the linear
/// element's adjacent point, pushed outward by `gap`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointBinding {
    pub element_id: ElementId,
    /// Clearance between the owner's boundary and the bound endpoint.
    pub gap: f32,
}

/// Which kind of dependent an owner's reverse index entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundKind {
    /// A linear element with an endpoint bound to the owner.
    Arrow,
    /// A text element embedded in the owner (container binding).
    Text,
}

/// Reverse index entry on a bindable element: "this element depends on me".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundElement {
    pub id: ElementId,
    pub kind: BoundKind,
}

// ─── Linear elements ─────────────────────────────────────────────────────

/// Path routing mode for linear elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Routing {
    /// Points are exactly where the user placed them.
    Straight,
    /// Axis-aligned auto-routing; interior points are derived waypoints.
    /// `fixed_segments` lists interior segment indices excluded from
    /// re-routing (a segment keeps its cross-axis coordinate).
    Elbow { fixed_segments: Vec<usize> },
}

impl Routing {
    pub fn is_elbow(&self) -> bool {
        matches!(self, Routing::Elbow { .. })
    }
}

/// Geometry payload shared by lines and arrows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearBody {
    /// Local points; `points[0]` is always `(0, 0)`.
    pub points: Vec<Point>,
    pub routing: Routing,
    pub start_binding: Option<PointBinding>,
    pub end_binding: Option<PointBinding>,
}

impl LinearBody {
    /// A straight two-point segment from the local origin to `end`.
    pub fn segment(end: Point) -> Self {
        Self {
            points: vec![Point::ZERO, end],
            routing: Routing::Straight,
            start_binding: None,
            end_binding: None,
        }
    }

    pub fn is_elbow(&self) -> bool {
        self.routing.is_elbow()
    }

    /// Binding for a terminal point index (0 or last), if any.
    pub fn binding_at(&self, index: usize) -> Option<&PointBinding> {
        if index == 0 {
            self.start_binding.as_ref()
        } else if index + 1 == self.points.len() {
            self.end_binding.as_ref()
        } else {
            None
        }
    }
}

// ─── Text / image payloads ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBody {
    /// Container this text is embedded in (container binding), if any.
    pub container_id: Option<ElementId>,
    pub font_size: f32,
    /// Line height as a multiple of font size.
    pub line_height: f32,
    /// When false the user fixed the width manually and text wraps to it.
    pub auto_resize: bool,
}

impl Default for TextBody {
    fn default() -> Self {
        Self {
            container_id: None,
            font_size: 20.0,
            line_height: 1.25,
            auto_resize: true,
        }
    }
}

impl TextBody {
    /// Intrinsic single-line height in scene units.
    pub fn intrinsic_height(&self) -> f32 {
        self.font_size * self.line_height
    }
}

/// Crop rectangle in image-local units (applied before the element box).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageBody {
    /// Dimensions recorded when the image was first sized; later
    /// aspect-locked resizes derive their reference ratio from these, not
    /// from the live (already mutated) width/height.
    pub initial_width: f32,
    pub initial_height: f32,
    pub crop: Option<Crop>,
}

// ─── Auxiliary element roles ─────────────────────────────────────────────

/// Specialized roles carried by ordinary elements. One discriminant per
/// specialization so role dispatch is exhaustive at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AuxData {
    /// A line acting as a distance-measurement ruler. When owned by a
    /// reference image, that image's calibration ratio applies.
    Measurement { owner_image: Option<ElementId> },

    /// A leader line pinned at `anchor` and tracking `target_id`'s center.
    /// When `owner_id` is set the anchor rides at `anchor_fraction` of the
    /// owner's box and is recomputed proportionally when the owner moves
    /// or resizes.
    AnchoredAnnotation {
        target_id: ElementId,
        owner_id: Option<ElementId>,
        anchor: Point,
        anchor_fraction: Option<Point>,
    },

    /// Root of a multi-part import whose children move as a unit with it.
    CompositeParent,

    /// Dependent member of a composite import.
    CompositeChild { parent_id: ElementId },
}

// ─── Elements ────────────────────────────────────────────────────────────

/// The closed set of element kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    Rectangle,
    Ellipse,
    Diamond,
    /// Visible container; elements inside reference it via `frame_id`.
    Frame,
    Text(TextBody),
    Image(ImageBody),
    Line(LinearBody),
    Arrow(LinearBody),
}

/// A single scene element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    /// Bumped by every store mutation; lets external caches detect change.
    pub version: u64,

    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Rotation in radians around the element center.
    pub angle: f32,

    pub kind: ElementKind,

    /// Group membership, outermost group last.
    pub group_ids: SmallVec<[GroupId; 2]>,
    /// Owning frame, if the element lives inside one.
    pub frame_id: Option<ElementId>,
    /// Reverse index of elements whose geometry depends on this one.
    pub bound_elements: SmallVec<[BoundElement; 2]>,

    pub locked: bool,
    pub is_deleted: bool,

    /// Specialized role, if any.
    pub aux: Option<AuxData>,
}

impl Element {
    pub fn new(id: ElementId, kind: ElementKind, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            version: 0,
            x,
            y,
            width,
            height,
            angle: 0.0,
            kind,
            group_ids: SmallVec::new(),
            frame_id: None,
            bound_elements: SmallVec::new(),
            locked: false,
            is_deleted: false,
            aux: None,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_frame(&self) -> bool {
        matches!(self.kind, ElementKind::Frame)
    }

    pub fn is_arrow(&self) -> bool {
        matches!(self.kind, ElementKind::Arrow(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_))
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, ElementKind::Image(_))
    }

    /// Linear geometry payload for lines and arrows.
    pub fn linear(&self) -> Option<&LinearBody> {
        match &self.kind {
            ElementKind::Line(body) | ElementKind::Arrow(body) => Some(body),
            _ => None,
        }
    }

    pub fn linear_mut(&mut self) -> Option<&mut LinearBody> {
        match &mut self.kind {
            ElementKind::Line(body) | ElementKind::Arrow(body) => Some(body),
            _ => None,
        }
    }

    pub fn is_linear(&self) -> bool {
        self.linear().is_some()
    }

    pub fn is_elbow_arrow(&self) -> bool {
        matches!(&self.kind, ElementKind::Arrow(body) if body.is_elbow())
    }

    /// Can other elements bind endpoints to this one?
    pub fn is_bindable(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::Rectangle
                | ElementKind::Ellipse
                | ElementKind::Diamond
                | ElementKind::Frame
                | ElementKind::Text(_)
                | ElementKind::Image(_)
        )
    }

    pub fn text(&self) -> Option<&TextBody> {
        match &self.kind {
            ElementKind::Text(body) => Some(body),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&ImageBody> {
        match &self.kind {
            ElementKind::Image(body) => Some(body),
            _ => None,
        }
    }

    /// Id of the text element embedded in this container, if any.
    pub fn bound_text_id(&self) -> Option<ElementId> {
        self.bound_elements
            .iter()
            .find(|b| b.kind == BoundKind::Text)
            .map(|b| b.id)
    }

    /// A linear element's points in scene coordinates (rotation applied
    /// around the element center).
    pub fn points_global(&self) -> Vec<Point> {
        let origin = self.origin();
        let center = self.center();
        match self.linear() {
            Some(body) => body
                .points
                .iter()
                .map(|p| (origin + *p).rotated_around(center, self.angle))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn is_composite_parent(&self) -> bool {
        matches!(self.aux, Some(AuxData::CompositeParent))
    }

    pub fn is_measurement(&self) -> bool {
        matches!(self.aux, Some(AuxData::Measurement { .. }))
    }

    pub fn is_anchored_annotation(&self) -> bool {
        matches!(self.aux, Some(AuxData::AnchoredAnnotation { .. }))
    }
}
