pub mod handles;
pub mod measure;
pub mod overlay;
pub mod scrollbar;
pub mod throttle;

pub use handles::{
    HANDLE_SIZE, HandleKind, OmitHandles, PointerDevice, TransformHandle, omit_for_device,
    transform_handles,
};
pub use measure::{MeasurementLabel, approx_text_width, measurement_label};
pub use overlay::{OverlayOutcome, RenderConfig, paint_overlay};
pub use scrollbar::{SCROLLBAR_WIDTH, ScrollBars, scrollbars};
pub use throttle::FrameThrottle;
