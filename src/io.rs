//! Conversions into `image` buffers for encoding.
//!
//! Available when the `image-io` feature is enabled. Encoding itself is left
//! to the `image` crate.

use crate::util::{NetDecodeError, NetDecodeResult};
use std::path::Path;

/// Builds an RGBA image from packed `0xAARRGGBB` pixels in row-major order.
pub fn rgba_image_from_argb(
    width: usize,
    height: usize,
    pixels: &[u32],
) -> NetDecodeResult<image::RgbaImage> {
    let needed = width.saturating_mul(height);
    if pixels.len() != needed {
        return Err(NetDecodeError::BufferTooSmall {
            needed,
            got: pixels.len(),
        });
    }
    let w = u32::try_from(width).map_err(|_| NetDecodeError::ImageIo {
        reason: format!("width {width} exceeds u32"),
    })?;
    let h = u32::try_from(height).map_err(|_| NetDecodeError::ImageIo {
        reason: format!("height {height} exceeds u32"),
    })?;
    let raw = crate::segment::argb_to_rgba(pixels);
    image::RgbaImage::from_raw(w, h, raw).ok_or_else(|| NetDecodeError::ImageIo {
        reason: "pixel buffer does not match image size".to_owned(),
    })
}

/// Encodes packed `0xAARRGGBB` pixels as a PNG file.
pub fn save_argb_png<P: AsRef<Path>>(
    path: P,
    width: usize,
    height: usize,
    pixels: &[u32],
) -> NetDecodeResult<()> {
    let img = rgba_image_from_argb(width, height, pixels)?;
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|err| NetDecodeError::ImageIo {
            reason: err.to_string(),
        })
}
