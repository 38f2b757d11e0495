pub mod binding;
pub mod drag;
pub mod linear;
pub mod route;
pub mod state;

pub use binding::{
    FIXED_BINDING_DISTANCE, boundary_anchor, max_binding_gap, refresh_annotation,
    refresh_annotations_for_parent, refresh_bound_text, resolve_linear_binding,
    update_bound_elements,
};
pub use drag::{
    GestureSnapshot, SizeNewElement, TEXT_AUTOWRAP_THRESHOLD, drag_selection, size_new_element,
};
pub use linear::{LinearEditor, POINT_HANDLE_SIZE, SegmentMidpoint, segment_midpoints};
pub use route::{ElbowRoute, Heading, route_elbow};
pub use state::{
    ActiveTool, BindingEnd, Collaborator, EditorState, SearchMatch, SnapGuide, SuggestedBinding,
    Zoom,
};
