//! NetDecode turns raw neural-network output tensors into structured results.
//!
//! Four task families are covered: classification top-K ranking, object
//! detection (pre-regressed boxes and anchor grids), per-pixel segmentation
//! argmax, and multi-person pose decoding over a kinematic tree. Every
//! decoder is a synchronous pure function of borrowed tensors plus a config
//! value; nothing is cached between calls.

mod candidate;
pub mod classify;
pub mod detect;
#[cfg(feature = "image-io")]
pub mod io;
pub mod labels;
pub mod lowlevel;
pub mod pixels;
pub mod pose;
pub mod segment;
pub mod tensor;
mod trace;
pub mod util;

pub use classify::{top_k, top_k_quantized, ClassifyConfig, TopKEntry};
pub use detect::{
    decode_boxes, decode_grid, detection_count, BoxConfig, BoxTensors, Detection, GridConfig,
    Rect,
};
pub use labels::LabelTable;
pub use pixels::{decode_image_f32, decode_image_u8, DecodedImage, Denormalize};
pub use pose::{BodyPart, Keypoint, Pose, PoseConfig, PoseDecoder, PoseTensors, Skeleton};
#[cfg(feature = "rayon")]
pub use segment::decode_segmentation_par;
pub use segment::{
    decode_segmentation, ColorTable, OutputMode, PixelBuffer, SegmentationMap,
};
pub use tensor::{Activation, Quantization, TensorView};
pub use util::{NetDecodeError, NetDecodeResult};
