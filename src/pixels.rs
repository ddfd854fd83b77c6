//! Decoding of image-to-image model outputs into packed pixels.

use crate::tensor::TensorView;
use crate::trace::{trace_event, trace_span};
use crate::util::NetDecodeResult;

/// Denormalization applied to float image outputs: `value * std + mean`.
#[derive(Clone, Copy, Debug)]
pub struct Denormalize {
    pub mean: f32,
    pub std: f32,
}

impl Default for Denormalize {
    fn default() -> Self {
        Self {
            mean: 0.0,
            std: 255.0,
        }
    }
}

/// Opaque RGB image as packed `0xAARRGGBB` pixels, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl DecodedImage {
    /// Converts the pixels into an `image::RgbaImage` for encoding.
    #[cfg(feature = "image-io")]
    pub fn to_rgba_image(&self) -> NetDecodeResult<image::RgbaImage> {
        crate::io::rgba_image_from_argb(self.width, self.height, &self.pixels)
    }
}

#[inline]
fn pack_rgb(r: u32, g: u32, b: u32) -> u32 {
    0xFF00_0000 | (r << 16) | (g << 8) | b
}

#[inline]
fn denormalize_channel(value: f32, denorm: Denormalize) -> u32 {
    // Round half up, then saturate to a byte.
    (value * denorm.std + denorm.mean + 0.5)
        .floor()
        .clamp(0.0, 255.0) as u32
}

/// Decodes a float `(H, W, 3)` image output.
pub fn decode_image_f32(
    output: TensorView<'_, f32>,
    denorm: Denormalize,
) -> NetDecodeResult<DecodedImage> {
    output.expect_channels(3, "image output")?;
    let _span = trace_span!("decode_image_f32", height = output.height(), width = output.width())
        .entered();
    let pixels: Vec<u32> = output
        .as_slice()
        .chunks_exact(3)
        .take(output.height() * output.width())
        .map(|rgb| {
            pack_rgb(
                denormalize_channel(rgb[0], denorm),
                denormalize_channel(rgb[1], denorm),
                denormalize_channel(rgb[2], denorm),
            )
        })
        .collect();
    trace_event!("image_pixels", count = pixels.len());
    Ok(DecodedImage {
        width: output.width(),
        height: output.height(),
        pixels,
    })
}

/// Decodes an 8-bit `(H, W, 3)` image output, taking each byte as-is.
pub fn decode_image_u8(output: TensorView<'_, u8>) -> NetDecodeResult<DecodedImage> {
    output.expect_channels(3, "image output")?;
    let pixels: Vec<u32> = output
        .as_slice()
        .chunks_exact(3)
        .take(output.height() * output.width())
        .map(|rgb| pack_rgb(rgb[0] as u32, rgb[1] as u32, rgb[2] as u32))
        .collect();
    Ok(DecodedImage {
        width: output.width(),
        height: output.height(),
        pixels,
    })
}
