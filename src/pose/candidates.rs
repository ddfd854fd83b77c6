//! Heatmap peak extraction.

use crate::candidate::ranked::RankedQueue;
use crate::tensor::TensorView;
use crate::util::math::sigmoid;

/// Heatmap cell that may seed a pose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PartCandidate {
    pub y: usize,
    pub x: usize,
    pub part: usize,
}

/// Applies the sigmoid to every heatmap logit, keeping the layout.
pub(crate) fn heatmap_probabilities(scores: TensorView<'_, f32>) -> Vec<f32> {
    scores.as_slice()[..scores.height() * scores.width() * scores.channels()]
        .iter()
        .map(|&logit| sigmoid(logit))
        .collect()
}

/// True unless some cell in the clipped `(2r + 1)^2` window is strictly greater.
///
/// Equal neighbors do not disqualify a peak, so plateaus yield several peaks.
fn is_local_maximum(
    probs: &TensorView<'_, f32>,
    y: usize,
    x: usize,
    part: usize,
    score: f32,
    radius: usize,
) -> bool {
    let y_end = (y + radius + 1).min(probs.height());
    let x_end = (x + radius + 1).min(probs.width());
    for yy in y.saturating_sub(radius)..y_end {
        for xx in x.saturating_sub(radius)..x_end {
            if probs.at(yy, xx, part) > score {
                return false;
            }
        }
    }
    true
}

/// Queues every part score at or above `threshold` that is a local maximum.
///
/// Cells are pushed in `(y, x, part)` order, which fixes the pop order of
/// equal scores.
pub(crate) fn build_part_queue(
    probs: &TensorView<'_, f32>,
    threshold: f32,
    radius: usize,
) -> RankedQueue<PartCandidate> {
    let mut queue = RankedQueue::new();
    for y in 0..probs.height() {
        for x in 0..probs.width() {
            for part in 0..probs.channels() {
                let score = probs.at(y, x, part);
                if !(score >= threshold) {
                    continue;
                }
                if is_local_maximum(probs, y, x, part, score, radius) {
                    queue.push(score, PartCandidate { y, x, part });
                }
            }
        }
    }
    queue
}
