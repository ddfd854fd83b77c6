//! Decoding of anchor-grid detector heads.
//!
//! The head is a `grid_h x grid_w` tensor whose channels hold
//! `num_boxes_per_block` slots of `5 + num_classes` values each:
//! `tx, ty, tw, th, to` followed by the class logits. For slot `b` at cell
//! `(y, x)`:
//!
//! - objectness `= sigmoid(to)`, class probabilities `= softmax(logits)`
//! - confidence `= objectness * max(probabilities)`
//! - center `= (cell + sigmoid(t_center)) * block_size`
//! - size `= exp(t_size) * anchor * block_size`
//!
//! Boxes above the threshold are ranked by confidence and admitted subject to
//! the per-class cap.

use crate::candidate::ranked::RankedQueue;
use crate::detect::{Detection, Rect};
use crate::labels::{ClassCounter, LabelTable};
use crate::tensor::TensorView;
use crate::trace::{trace_event, trace_span};
use crate::util::math::{argmax, sigmoid, softmax};
use crate::util::{NetDecodeError, NetDecodeResult};

/// Anchor priors of Tiny-YOLOv2 trained on VOC, as `(width, height)` pairs in grid cells.
pub const TINY_YOLO_VOC_ANCHORS: [f32; 10] =
    [1.08, 1.19, 3.42, 4.41, 6.63, 11.38, 9.42, 5.11, 16.62, 10.52];

/// Values per anchor slot before the class logits.
const BOX_FIELDS: usize = 5;

/// Configuration for [`decode_grid`].
#[derive(Clone, Debug)]
pub struct GridConfig {
    /// Input pixels covered by one grid cell.
    pub block_size: usize,
    /// Anchor slots per grid cell.
    pub num_boxes_per_block: usize,
    /// Flat `(width, height)` priors, one pair per anchor slot.
    pub anchors: Vec<f32>,
    /// Boxes must be strictly above this confidence.
    pub threshold: f32,
    /// Maximum detections kept per class.
    pub max_per_class: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            block_size: 32,
            num_boxes_per_block: 5,
            anchors: TINY_YOLO_VOC_ANCHORS.to_vec(),
            threshold: 0.1,
            max_per_class: 5,
        }
    }
}

struct GridBox {
    class_index: usize,
    rect: Rect,
}

/// Decodes an anchor-grid head into detections ranked by confidence.
///
/// The number of classes is the label table length. An empty label table or
/// anchor list decodes to no detections; any other disagreement between the
/// tensor shape and the configuration is an error.
pub fn decode_grid(
    output: TensorView<'_, f32>,
    labels: &LabelTable,
    cfg: &GridConfig,
) -> NetDecodeResult<Vec<Detection>> {
    if labels.is_empty() || cfg.anchors.is_empty() {
        return Ok(Vec::new());
    }
    if cfg.block_size == 0 {
        return Err(NetDecodeError::InvalidConfig {
            reason: "block_size must be positive",
        });
    }
    if cfg.num_boxes_per_block == 0 {
        return Err(NetDecodeError::InvalidConfig {
            reason: "num_boxes_per_block must be positive",
        });
    }
    let needed_anchors = cfg.num_boxes_per_block * 2;
    if cfg.anchors.len() < needed_anchors {
        return Err(NetDecodeError::AnchorsTooShort {
            needed: needed_anchors,
            got: cfg.anchors.len(),
        });
    }

    let num_classes = labels.len();
    let slot_len = BOX_FIELDS + num_classes;
    output.expect_channels(slot_len * cfg.num_boxes_per_block, "grid anchor slots")?;

    let grid_h = output.height();
    let grid_w = output.width();
    let _span = trace_span!(
        "decode_grid",
        grid_h = grid_h,
        grid_w = grid_w,
        boxes = cfg.num_boxes_per_block
    )
    .entered();

    let block = cfg.block_size as f32;
    let input_w = (grid_w * cfg.block_size) as f32;
    let input_h = (grid_h * cfg.block_size) as f32;

    let mut queue = RankedQueue::new();
    let mut probs = vec![0.0f32; num_classes];
    for y in 0..grid_h {
        for x in 0..grid_w {
            for b in 0..cfg.num_boxes_per_block {
                let base = slot_len * b;
                let read = |field: usize| output.at(y, x, base + field);

                let objectness = sigmoid(read(4));
                for (c, prob) in probs.iter_mut().enumerate() {
                    *prob = read(BOX_FIELDS + c);
                }
                softmax(&mut probs);
                let Some((class_index, max_prob)) = argmax(&probs) else {
                    continue;
                };

                let confidence = objectness * max_prob;
                if !(confidence > cfg.threshold) {
                    continue;
                }

                let center_x = (x as f32 + sigmoid(read(0))) * block;
                let center_y = (y as f32 + sigmoid(read(1))) * block;
                let w = read(2).exp() * cfg.anchors[2 * b] * block;
                let h = read(3).exp() * cfg.anchors[2 * b + 1] * block;

                let xmin = (center_x - w / 2.0) / input_w;
                let ymin = (center_y - h / 2.0) / input_h;
                // Non-finite geometry would otherwise clamp to a box at the origin.
                if ![xmin, ymin, w, h].iter().all(|v| v.is_finite()) {
                    continue;
                }
                let rect = Rect::clipped(xmin, ymin, w / input_w, h / input_h);
                queue.push(confidence, GridBox { class_index, rect });
            }
        }
    }

    let mut counter = ClassCounter::new(num_classes, cfg.max_per_class);
    let mut out = Vec::new();
    for (confidence, candidate) in queue.drain_desc() {
        if !counter.admit(candidate.class_index) {
            continue;
        }
        out.push(Detection {
            rect: candidate.rect,
            class_index: candidate.class_index,
            label: labels
                .get(candidate.class_index)
                .unwrap_or_default()
                .to_owned(),
            confidence,
        });
    }

    trace_event!("grid_detections", count = out.len());
    Ok(out)
}
