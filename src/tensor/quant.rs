//! Affine quantization parameters for 8-bit tensors.

/// Affine mapping `real = (raw - zero_point) * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quantization {
    pub scale: f32,
    pub zero_point: i32,
}

impl Quantization {
    /// Maps `0..=255` onto `0.0..=1.0`, the usual convention for 8-bit classifiers.
    pub const UNIT_RANGE: Quantization = Quantization {
        scale: 1.0 / 255.0,
        zero_point: 0,
    };

    /// Creates quantization parameters.
    pub fn new(scale: f32, zero_point: i32) -> Self {
        Self { scale, zero_point }
    }

    /// Recovers the real value of a raw byte.
    #[inline]
    pub fn dequantize(&self, raw: u8) -> f32 {
        (raw as i32 - self.zero_point) as f32 * self.scale
    }
}

impl Default for Quantization {
    fn default() -> Self {
        Self::UNIT_RANGE
    }
}
