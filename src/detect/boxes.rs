//! Decoding of pre-regressed detection boxes.

use crate::detect::{Detection, Rect};
use crate::labels::{ClassCounter, LabelTable};
use crate::trace::{trace_event, trace_span};
use crate::util::{NetDecodeError, NetDecodeResult};

/// Configuration for [`decode_boxes`].
#[derive(Clone, Copy, Debug)]
pub struct BoxConfig {
    /// Boxes scoring below this value are skipped.
    pub threshold: f32,
    /// Maximum detections kept per class.
    pub max_per_class: usize,
    /// Added to each raw class index before the label lookup; `1` skips the
    /// implicit background entry at label 0.
    pub class_offset: usize,
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            max_per_class: 5,
            class_offset: 1,
        }
    }
}

/// Borrowed output tensors of a box-regressing detector.
#[derive(Clone, Copy, Debug)]
pub struct BoxTensors<'a> {
    locations: &'a [f32],
    classes: &'a [f32],
    scores: &'a [f32],
    count: usize,
}

impl<'a> BoxTensors<'a> {
    /// Wraps the location `[N][4]` (`ymin, xmin, ymax, xmax`), class `[N]` and
    /// score `[N]` tensors, of which the first `count` entries are valid.
    pub fn new(
        locations: &'a [f32],
        classes: &'a [f32],
        scores: &'a [f32],
        count: usize,
    ) -> NetDecodeResult<Self> {
        let needed_locations = count.checked_mul(4).ok_or(NetDecodeError::InvalidConfig {
            reason: "detection count overflows",
        })?;
        for (needed, got) in [
            (needed_locations, locations.len()),
            (count, classes.len()),
            (count, scores.len()),
        ] {
            if got < needed {
                return Err(NetDecodeError::BufferTooSmall { needed, got });
            }
        }
        Ok(Self {
            locations,
            classes,
            scores,
            count,
        })
    }

    /// Returns the number of valid boxes.
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Converts the detector's floating-point detection count into a box count.
///
/// Fractional counts round up, so every index strictly below the value is read.
pub fn detection_count(num_detections: f32) -> NetDecodeResult<usize> {
    if !num_detections.is_finite() || num_detections < 0.0 {
        return Err(NetDecodeError::InvalidConfig {
            reason: "detection count must be a finite non-negative number",
        });
    }
    Ok(num_detections.ceil() as usize)
}

/// Decodes boxes in tensor order, applying the score threshold and per-class cap.
///
/// Retained detections keep their tensor order; nothing is re-sorted. A box
/// whose class falls outside the label table fails the whole call with
/// `LabelOutOfRange`. An empty label table decodes to no detections.
pub fn decode_boxes(
    tensors: &BoxTensors<'_>,
    labels: &LabelTable,
    cfg: BoxConfig,
) -> NetDecodeResult<Vec<Detection>> {
    if labels.is_empty() {
        return Ok(Vec::new());
    }

    let _span = trace_span!("decode_boxes", candidates = tensors.count).entered();

    let mut counter = ClassCounter::new(labels.len(), cfg.max_per_class);
    let mut out = Vec::new();
    for i in 0..tensors.count {
        let score = tensors.scores[i];
        // Written negated so NaN scores are skipped too.
        if !(score >= cfg.threshold) {
            continue;
        }

        let class_index = label_index(tensors.classes[i], cfg.class_offset, labels.len())?;
        if !counter.admit(class_index) {
            continue;
        }

        let loc = &tensors.locations[i * 4..i * 4 + 4];
        let ymin = loc[0].max(0.0);
        let xmin = loc[1].max(0.0);
        let ymax = loc[2];
        let xmax = loc[3];

        out.push(Detection {
            rect: Rect::clipped(xmin, ymin, xmax - xmin, ymax - ymin),
            class_index,
            label: labels.get(class_index).unwrap_or_default().to_owned(),
            confidence: score,
        });
    }

    trace_event!("box_detections", count = out.len());
    Ok(out)
}

fn label_index(raw_class: f32, offset: usize, len: usize) -> NetDecodeResult<usize> {
    // Class tensors carry integral values as floats; truncate like an integer cast.
    let index = (raw_class.trunc() as i64).saturating_add(offset as i64);
    if raw_class.is_finite() && index >= 0 && (index as usize) < len {
        Ok(index as usize)
    } else {
        Err(NetDecodeError::LabelOutOfRange { index, len })
    }
}
