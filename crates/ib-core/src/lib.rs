pub mod geometry;
pub mod id;
pub mod model;
pub mod scene;
pub mod units;

pub use geometry::{Bounds, Point, common_bounds, grid_snap, grid_snap_point, polyline_length};
pub use id::{ElementId, GroupId};
pub use model::*;
pub use scene::{ElementUpdate, MutateOptions, Scene};
pub use units::{Calibration, MetricUnit, format_distance, from_cm, to_cm};
