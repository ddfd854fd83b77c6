//! Top-K ranking of a classifier's confidence vector.

use crate::candidate::ranked::RankedQueue;
use crate::labels::LabelTable;
use crate::tensor::Quantization;
use crate::trace::{trace_event, trace_span};
use crate::util::{NetDecodeError, NetDecodeResult};

/// Configuration for [`top_k`].
#[derive(Clone, Copy, Debug)]
pub struct ClassifyConfig {
    /// Entries must be strictly above this confidence.
    pub threshold: f32,
    /// Maximum number of entries returned.
    pub num_results: usize,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            num_results: 5,
        }
    }
}

/// One ranked classification result.
#[derive(Clone, Debug, PartialEq)]
pub struct TopKEntry {
    /// Position in the confidence vector and the label table.
    pub index: usize,
    pub label: String,
    pub confidence: f32,
}

/// Ranks `confidences` and returns at most `num_results` entries above the threshold.
///
/// Entries come back by descending confidence; equal confidences keep their
/// index order. The vector must hold one confidence per label. An
/// empty label table ranks nothing.
pub fn top_k(
    confidences: &[f32],
    labels: &LabelTable,
    cfg: ClassifyConfig,
) -> NetDecodeResult<Vec<TopKEntry>> {
    if labels.is_empty() {
        return Ok(Vec::new());
    }
    if confidences.len() != labels.len() {
        return Err(NetDecodeError::ChannelMismatch {
            expected: labels.len(),
            got: confidences.len(),
            context: "classification confidences",
        });
    }

    let _span = trace_span!("classify_top_k", labels = labels.len()).entered();

    let mut queue = RankedQueue::new();
    for (index, &confidence) in confidences.iter().enumerate() {
        if confidence > cfg.threshold {
            queue.push(confidence, index);
        }
    }

    let mut out = Vec::with_capacity(cfg.num_results.min(queue.len()));
    for (confidence, index) in queue.drain_desc().take(cfg.num_results) {
        let label = labels.get(index).unwrap_or_default().to_owned();
        out.push(TopKEntry {
            index,
            label,
            confidence,
        });
    }

    trace_event!("classify_results", count = out.len());
    Ok(out)
}

/// Dequantizes an 8-bit confidence vector and ranks it with [`top_k`].
pub fn top_k_quantized(
    raw: &[u8],
    quant: Quantization,
    labels: &LabelTable,
    cfg: ClassifyConfig,
) -> NetDecodeResult<Vec<TopKEntry>> {
    let confidences: Vec<f32> = raw.iter().map(|&v| quant.dequantize(v)).collect();
    top_k(&confidences, labels, cfg)
}
