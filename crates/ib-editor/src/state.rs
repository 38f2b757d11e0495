//! Read-mostly selection/editor UI state.
//!
//! Produced by the input-handling layers and consumed by both the drag
//! engine (zoom-dependent thresholds, grid) and the overlay renderer
//! (selection chrome, highlights, collaborator cursors). The core never
//! mutates elements through this structure — the scene store is the only
//! mutation path.

use crate::linear::LinearEditor;
use ib_core::geometry::{Bounds, Point};
use ib_core::id::{ElementId, GroupId};
use ib_core::model::Color;
use ib_core::units::{Calibration, MetricUnit};

/// Scene zoom factor. Overlay chrome divides by this so handles and line
/// widths keep a constant screen size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    pub value: f32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self { value: 1.0 }
    }
}

/// The active tool, as reported by the (out-of-scope) toolbar layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTool {
    #[default]
    Selection,
    Rectangle,
    Ellipse,
    Diamond,
    Line,
    Arrow,
    Text,
    Image,
    Frame,
    Ruler,
}

/// A remote collaborator, already resolved by the transport layer.
#[derive(Debug, Clone)]
pub struct Collaborator {
    pub color: Color,
    pub cursor: Option<Point>,
    pub username: String,
    /// Elements this collaborator currently has selected.
    pub selected: Vec<ElementId>,
}

/// Which end(s) of a linear element a suggested binding applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingEnd {
    Start,
    End,
    Both,
}

/// A binding the in-progress drag would create if released now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuggestedBinding {
    /// Highlight a bindable shape as a drop candidate.
    Shape(ElementId),
    /// Highlight the capture radius at a linear element's endpoint(s).
    Point {
        linear_id: ElementId,
        end: BindingEnd,
    },
}

/// One search hit, with element-local sub-regions to highlight.
#[derive(Debug, Clone)]
pub struct SearchMatch {
    pub element_id: ElementId,
    pub focused: bool,
    pub regions: Vec<Bounds>,
}

/// An active snapping guide line in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGuide {
    pub from: Point,
    pub to: Point,
}

/// The aggregate editor/UI state for one frame.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    /// Ordered, duplicate-free local selection.
    pub selected: Vec<ElementId>,
    /// Fully-selected groups (selection cascades to all members).
    pub selected_group_ids: Vec<GroupId>,
    /// Group currently being edited in isolation, if any.
    pub editing_group: Option<GroupId>,

    /// Point-editing state for the selected linear element, if any.
    pub linear_editor: Option<LinearEditor>,
    /// Text element under edit, if any.
    pub editing_text: Option<ElementId>,

    /// In-progress marquee/lasso rectangle.
    pub selection_rect: Option<Bounds>,
    /// Bindings the current drag would create on release.
    pub suggested_bindings: Vec<SuggestedBinding>,
    pub binding_enabled: bool,
    /// Frame hovered as a drop target.
    pub frame_highlight: Option<ElementId>,
    /// Ad hoc emphasized elements (e.g. search scoping).
    pub highlighted_elements: Vec<ElementId>,

    /// Image mid-crop, and whether the crop gesture is active right now.
    pub cropping_element: Option<ElementId>,
    pub is_cropping: bool,
    pub is_rotating: bool,

    pub zoom: Zoom,
    pub scroll: Point,
    /// Grid cell size, or `None` when the grid is off.
    pub grid: Option<f32>,
    pub active_tool: ActiveTool,

    pub collaborators: Vec<Collaborator>,
    pub search_matches: Vec<SearchMatch>,
    pub snap_guides: Vec<SnapGuide>,

    pub selected_unit: MetricUnit,
    pub calibration: Calibration,
}

impl EditorState {
    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selected.contains(&id)
    }

    /// Replace the selection with a single element.
    pub fn select_only(&mut self, id: ElementId) {
        self.selected.clear();
        self.selected.push(id);
    }

    /// Toggle membership, preserving order and uniqueness.
    pub fn toggle_selected(&mut self, id: ElementId) {
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id);
        }
    }

    /// True when the element is selected only because one of its groups is
    /// fully selected (its own id need not be in the selection set).
    pub fn is_selected_via_group(&self, group_ids: &[GroupId]) -> bool {
        group_ids
            .iter()
            .any(|g| self.selected_group_ids.contains(g))
    }
}
