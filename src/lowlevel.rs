//! Low-level building blocks for custom decode pipelines.
//!
//! Most users should prefer the task-level decoders re-exported at the crate
//! root.

pub use crate::candidate::nms::within_squared_radius;
pub use crate::candidate::ranked::{DrainDesc, RankedQueue};
pub use crate::detect::grid::TINY_YOLO_VOC_ANCHORS;
pub use crate::segment::argb_to_rgba;
pub use crate::util::math::{argmax, sigmoid, softmax};
