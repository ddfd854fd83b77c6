//! Numeric helpers shared by the decoders.

/// Logistic function `1 / (1 + e^-v)`, defined over the full `f32` range.
#[inline]
pub fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

/// Softmax in place.
///
/// The maximum logit is subtracted before exponentiation so large logits do
/// not overflow. An empty slice is left untouched.
pub fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for value in values.iter_mut() {
        *value = (*value - max).exp();
        sum += *value;
    }
    for value in values.iter_mut() {
        *value /= sum;
    }
}

/// Returns `(index, value)` of the first maximum, or `None` for an empty slice.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut iter = values.iter().copied().enumerate();
    let first = iter.next()?;
    Some(iter.fold(first, |best, (idx, value)| {
        if value > best.1 {
            (idx, value)
        } else {
            best
        }
    }))
}
