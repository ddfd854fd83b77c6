//! Per-pixel argmax decoding of segmentation heads.
//!
//! For every pixel the channel with the largest activation selects a class
//! and its color. The running maximum starts at zero, so only strictly
//! positive activations compete and a pixel with no positive channel falls
//! back to class 0.
//!
//! Quantized heads are compared on their raw integer values. This matches the
//! float ordering only when every channel shares one scale and zero point;
//! no per-channel dequantization is applied here.

mod color;

pub use color::{argb_to_rgba, ColorTable};

use crate::tensor::{Activation, TensorView};
use crate::trace::{trace_event, trace_span};
use crate::util::{NetDecodeError, NetDecodeResult};

/// Pixel layout produced by [`SegmentationMap::into_pixels`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    /// Four bytes per pixel in `R, G, B, A` order.
    RgbaBytes,
    /// One packed `0xAARRGGBB` word per pixel, ready for an image encoder.
    ArgbPixels,
}

/// Rendered segmentation pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PixelBuffer {
    Rgba(Vec<u8>),
    Argb(Vec<u32>),
}

/// Decoded class and color for every pixel, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentationMap {
    width: usize,
    height: usize,
    class_ids: Vec<usize>,
    colors: Vec<u32>,
}

impl SegmentationMap {
    /// Returns the map width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the map height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Per-pixel winning channel, row-major.
    pub fn class_ids(&self) -> &[usize] {
        &self.class_ids
    }

    /// Per-pixel packed `0xAARRGGBB` color, row-major.
    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// Returns the class at `(y, x)` if it is within bounds.
    pub fn class_at(&self, y: usize, x: usize) -> Option<usize> {
        if y >= self.height || x >= self.width {
            return None;
        }
        self.class_ids.get(y * self.width + x).copied()
    }

    /// Returns the color at `(y, x)` if it is within bounds.
    pub fn color_at(&self, y: usize, x: usize) -> Option<u32> {
        if y >= self.height || x >= self.width {
            return None;
        }
        self.colors.get(y * self.width + x).copied()
    }

    /// Renders the colors in the requested layout.
    pub fn into_pixels(self, mode: OutputMode) -> PixelBuffer {
        match mode {
            OutputMode::RgbaBytes => PixelBuffer::Rgba(argb_to_rgba(&self.colors)),
            OutputMode::ArgbPixels => PixelBuffer::Argb(self.colors),
        }
    }

    /// Converts the colors into an `image::RgbaImage` for encoding.
    #[cfg(feature = "image-io")]
    pub fn to_rgba_image(&self) -> NetDecodeResult<image::RgbaImage> {
        crate::io::rgba_image_from_argb(self.width, self.height, &self.colors)
    }
}

/// Index of the first strictly largest positive activation, or 0.
#[inline]
fn argmax_positive<T: Activation>(cell: &[T]) -> usize {
    let mut max_index = 0usize;
    let mut max_value = T::ZERO;
    for (c, &value) in cell.iter().enumerate() {
        if value > max_value {
            max_index = c;
            max_value = value;
        }
    }
    max_index
}

fn check_colors<T: Copy>(
    output: &TensorView<'_, T>,
    colors: &ColorTable,
) -> NetDecodeResult<()> {
    if colors.len() < output.channels() {
        return Err(NetDecodeError::ColorTableTooShort {
            needed: output.channels(),
            got: colors.len(),
        });
    }
    Ok(())
}

fn decode_row<T: Activation>(
    output: &TensorView<'_, T>,
    colors: &ColorTable,
    y: usize,
    class_row: &mut [usize],
    color_row: &mut [u32],
) {
    let channels = output.channels();
    let row_start = output.index(y, 0, 0);
    let row = &output.as_slice()[row_start..row_start + output.width() * channels];
    for ((cell, class_id), color) in row
        .chunks_exact(channels)
        .zip(class_row.iter_mut())
        .zip(color_row.iter_mut())
    {
        let winner = argmax_positive(cell);
        *class_id = winner;
        *color = colors.color(winner);
    }
}

/// Decodes a `(1, H, W, C)` segmentation head into a class/color map.
///
/// The color table needs at least one entry per channel.
pub fn decode_segmentation<T: Activation>(
    output: TensorView<'_, T>,
    colors: &ColorTable,
) -> NetDecodeResult<SegmentationMap> {
    check_colors(&output, colors)?;
    let width = output.width();
    let height = output.height();
    let _span = trace_span!(
        "decode_segmentation",
        height = height,
        width = width,
        channels = output.channels()
    )
    .entered();

    let mut class_ids = vec![0usize; width * height];
    let mut pixel_colors = vec![0u32; width * height];
    for (y, (class_row, color_row)) in class_ids
        .chunks_exact_mut(width)
        .zip(pixel_colors.chunks_exact_mut(width))
        .enumerate()
    {
        decode_row(&output, colors, y, class_row, color_row);
    }

    trace_event!("segmentation_pixels", count = class_ids.len());
    Ok(SegmentationMap {
        width,
        height,
        class_ids,
        colors: pixel_colors,
    })
}

/// Row-parallel variant of [`decode_segmentation`] with identical output.
#[cfg(feature = "rayon")]
pub fn decode_segmentation_par<T: Activation>(
    output: TensorView<'_, T>,
    colors: &ColorTable,
) -> NetDecodeResult<SegmentationMap> {
    use rayon::prelude::*;

    check_colors(&output, colors)?;
    let width = output.width();
    let height = output.height();
    let _span = trace_span!("decode_segmentation_par", height = height, width = width).entered();

    let mut class_ids = vec![0usize; width * height];
    let mut pixel_colors = vec![0u32; width * height];
    class_ids
        .par_chunks_exact_mut(width)
        .zip(pixel_colors.par_chunks_exact_mut(width))
        .enumerate()
        .for_each(|(y, (class_row, color_row))| {
            decode_row(&output, colors, y, class_row, color_row);
        });

    trace_event!("segmentation_pixels", count = class_ids.len());
    Ok(SegmentationMap {
        width,
        height,
        class_ids,
        colors: pixel_colors,
    })
}
