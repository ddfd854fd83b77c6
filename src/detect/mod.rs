//! Object detection decoders.
//!
//! Two box-decoding strategies share the result types defined here:
//! - `boxes`: pre-regressed `(ymin, xmin, ymax, xmax)` boxes with per-box class
//!   and score, kept in tensor order (SSD-style heads).
//! - `grid`: a dense grid of anchor slots decoded with sigmoid, softmax and
//!   exponential size priors, ranked by confidence (YOLO-style heads).

pub mod boxes;
pub mod grid;

pub use boxes::{decode_boxes, detection_count, BoxConfig, BoxTensors};
pub use grid::{decode_grid, GridConfig, TINY_YOLO_VOC_ANCHORS};

/// Axis-aligned rectangle in normalized image coordinates.
///
/// Decoders guarantee `x, y >= 0`, `x + w <= 1` and `y + h <= 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    /// Builds a rectangle from an origin and size, clipping it to the unit square.
    ///
    /// The origin is clamped to `[0, 1]` and each extent to `[0, 1 - origin]`.
    pub fn clipped(x: f32, y: f32, w: f32, h: f32) -> Self {
        let x = x.max(0.0).min(1.0);
        let y = y.max(0.0).min(1.0);
        Self {
            x,
            y,
            w: w.min(1.0 - x).max(0.0),
            h: h.min(1.0 - y).max(0.0),
        }
    }

    /// Returns the right edge.
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Returns the bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

/// One detected object.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub rect: Rect,
    /// Index into the label table.
    pub class_index: usize,
    pub label: String,
    pub confidence: f32,
}
