//! Screen-space scrollbar thumbs.
//!
//! Thumbs are derived from the union of the scene content bounds and the
//! currently visible region: each thumb's position/size is the visible
//! region's share of that union, mapped onto the viewport edge. An axis
//! whose content fits entirely in view gets no thumb.

use ib_core::geometry::{Bounds, Point};

/// Thumb thickness in screen pixels.
pub const SCROLLBAR_WIDTH: f32 = 6.0;

/// Margin between a thumb and the viewport edge, in screen pixels.
pub const SCROLLBAR_MARGIN: f32 = 4.0;

/// Screen-space scrollbar thumbs for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollBars {
    pub horizontal: Option<Bounds>,
    pub vertical: Option<Bounds>,
}

/// Compute the thumbs. `content` is the scene bounds of all elements (in
/// scene units); the visible region is derived from scroll/zoom and the
/// viewport size in screen pixels.
pub fn scrollbars(
    content: Bounds,
    viewport_width: f32,
    viewport_height: f32,
    scroll: Point,
    zoom: f32,
) -> ScrollBars {
    let zoom = zoom.max(f32::EPSILON);
    let visible = Bounds::new(
        -scroll.x,
        -scroll.y,
        viewport_width / zoom,
        viewport_height / zoom,
    );
    let total = content.union(visible);

    let horizontal = (total.width > visible.width + f32::EPSILON).then(|| {
        let track = viewport_width;
        let size = (visible.width / total.width) * track;
        let pos = ((visible.x - total.x) / total.width) * track;
        Bounds::new(
            pos,
            viewport_height - SCROLLBAR_WIDTH - SCROLLBAR_MARGIN,
            size,
            SCROLLBAR_WIDTH,
        )
    });
    let vertical = (total.height > visible.height + f32::EPSILON).then(|| {
        let track = viewport_height;
        let size = (visible.height / total.height) * track;
        let pos = ((visible.y - total.y) / total.height) * track;
        Bounds::new(
            viewport_width - SCROLLBAR_WIDTH - SCROLLBAR_MARGIN,
            pos,
            SCROLLBAR_WIDTH,
            size,
        )
    });

    ScrollBars {
        horizontal,
        vertical,
    }
}
