//! Transform-handle geometry for selected elements.
//!
//! Handles are computed in unrotated scene coordinates around the target
//! bounds; the overlay applies the element's rotation when drawing. All
//! sizes divide by the zoom factor so handles keep a constant screen size
//! regardless of scene zoom.

use ib_core::geometry::Bounds;

/// Handle edge length in screen pixels.
pub const HANDLE_SIZE: f32 = 8.0;

/// Gap between the element bounds and the selection border the handles
/// sit on, in screen pixels.
pub const TRANSFORM_HANDLE_SPACING: f32 = 2.0;

/// Distance of the rotation handle above the top edge, in screen pixels.
pub const ROTATION_HANDLE_GAP: f32 = 16.0;

/// The closed set of transform handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Nw,
    Ne,
    Sw,
    Se,
    N,
    S,
    E,
    W,
    Rotation,
}

impl HandleKind {
    pub fn is_corner(self) -> bool {
        matches!(self, HandleKind::Nw | HandleKind::Ne | HandleKind::Sw | HandleKind::Se)
    }

    pub fn is_side(self) -> bool {
        matches!(self, HandleKind::N | HandleKind::S | HandleKind::E | HandleKind::W)
    }
}

/// One handle, as a scene-space square (circle for rotation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformHandle {
    pub kind: HandleKind,
    pub bounds: Bounds,
}

/// Pointer device, for handle omission. Coarse pointers get no side
/// handles (too easy to hit accidentally between corners).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerDevice {
    #[default]
    Mouse,
    Touch,
    Pen,
}

/// Which handles to withhold for the current device/selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct OmitHandles {
    pub sides: bool,
    pub rotation: bool,
}

pub fn omit_for_device(device: PointerDevice) -> OmitHandles {
    match device {
        PointerDevice::Mouse => OmitHandles::default(),
        PointerDevice::Touch | PointerDevice::Pen => OmitHandles {
            sides: true,
            rotation: false,
        },
    }
}

/// Compute the transform handles for a target's bounds at the given zoom.
pub fn transform_handles(target: Bounds, zoom: f32, omit: OmitHandles) -> Vec<TransformHandle> {
    let zoom = zoom.max(f32::EPSILON);
    let size = HANDLE_SIZE / zoom;
    let half = size / 2.0;
    let spacing = TRANSFORM_HANDLE_SPACING / zoom;
    let outer = target.inflated(spacing);

    let cx = outer.x + outer.width / 2.0;
    let mut handles = Vec::with_capacity(9);
    let mut push = |kind: HandleKind, x: f32, y: f32| {
        handles.push(TransformHandle {
            kind,
            bounds: Bounds::new(x - half, y - half, size, size),
        });
    };

    push(HandleKind::Nw, outer.x, outer.y);
    push(HandleKind::Ne, outer.max_x(), outer.y);
    push(HandleKind::Sw, outer.x, outer.max_y());
    push(HandleKind::Se, outer.max_x(), outer.max_y());

    if !omit.sides {
        let cy = outer.y + outer.height / 2.0;
        push(HandleKind::N, cx, outer.y);
        push(HandleKind::S, cx, outer.max_y());
        push(HandleKind::W, outer.x, cy);
        push(HandleKind::E, outer.max_x(), cy);
    }

    if !omit.rotation {
        push(HandleKind::Rotation, cx, outer.y - ROTATION_HANDLE_GAP / zoom);
    }

    handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn handle_screen_size_is_zoom_invariant() {
        let target = Bounds::new(0.0, 0.0, 100.0, 100.0);
        for zoom in [0.25, 1.0, 4.0] {
            let handles = transform_handles(target, zoom, OmitHandles::default());
            for h in &handles {
                let screen = h.bounds.width * zoom;
                assert!(
                    (screen - HANDLE_SIZE).abs() < 1e-4,
                    "{:?} at zoom {zoom}: {screen}",
                    h.kind
                );
            }
        }
    }

    #[test]
    fn full_set_has_corners_sides_and_rotation() {
        let handles = transform_handles(
            Bounds::new(10.0, 10.0, 50.0, 30.0),
            1.0,
            OmitHandles::default(),
        );
        assert_eq!(handles.len(), 9);
        assert_eq!(handles.iter().filter(|h| h.kind.is_corner()).count(), 4);
        assert_eq!(handles.iter().filter(|h| h.kind.is_side()).count(), 4);
        assert!(handles.iter().any(|h| h.kind == HandleKind::Rotation));
    }

    #[test]
    fn coarse_pointer_omits_sides() {
        let handles = transform_handles(
            Bounds::new(0.0, 0.0, 50.0, 50.0),
            1.0,
            omit_for_device(PointerDevice::Touch),
        );
        assert!(handles.iter().all(|h| !h.kind.is_side()));
        assert!(handles.iter().any(|h| h.kind == HandleKind::Rotation));
    }

    #[test]
    fn rotation_handle_sits_above_top_edge() {
        let handles = transform_handles(
            Bounds::new(0.0, 0.0, 100.0, 100.0),
            2.0,
            OmitHandles::default(),
        );
        let rotation = handles
            .iter()
            .find(|h| h.kind == HandleKind::Rotation)
            .unwrap();
        let center_y = rotation.bounds.y + rotation.bounds.height / 2.0;
        // 1px spacing + 8px gap at zoom 2
        assert!((center_y - (-1.0 - 8.0)).abs() < 1e-4, "{center_y}");
    }
}
