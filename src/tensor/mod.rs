//! Borrowed tensor views.
//!
//! `TensorView` is a read-only `height x width x channels` view over a flat
//! buffer laid out in NHWC order with a batch of one. Every element read is
//! an explicit index expression `(y * width + x) * channels + c`; the view
//! carries no cursor, so the same view can be read from any number of places
//! without ordering concerns.

use crate::util::{NetDecodeError, NetDecodeResult};

mod quant;

pub use quant::Quantization;

/// Element types that can compete in a raw argmax.
///
/// `ZERO` is the starting maximum: only strictly positive activations can
/// displace the default class.
pub trait Activation: Copy + PartialOrd + Send + Sync {
    /// Additive zero for this element type.
    const ZERO: Self;
}

impl Activation for f32 {
    const ZERO: Self = 0.0;
}

impl Activation for u8 {
    const ZERO: Self = 0;
}

impl Activation for i8 {
    const ZERO: Self = 0;
}

/// Borrowed single-batch NHWC tensor.
#[derive(Copy, Clone, Debug)]
pub struct TensorView<'a, T> {
    data: &'a [T],
    height: usize,
    width: usize,
    channels: usize,
}

impl<'a, T: Copy> TensorView<'a, T> {
    /// Creates a view over `height * width * channels` elements.
    pub fn new(
        data: &'a [T],
        height: usize,
        width: usize,
        channels: usize,
    ) -> NetDecodeResult<Self> {
        let needed = required_len(height, width, channels)?;
        if data.len() < needed {
            return Err(NetDecodeError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            height,
            width,
            channels,
        })
    }

    /// Creates a view from a full `[batch, height, width, channels]` shape.
    ///
    /// Only `batch == 1` is accepted.
    pub fn from_nhwc(data: &'a [T], shape: [usize; 4]) -> NetDecodeResult<Self> {
        let [batch, height, width, channels] = shape;
        if batch != 1 {
            return Err(NetDecodeError::BatchUnsupported { batch });
        }
        Self::new(data, height, width, channels)
    }

    /// Returns the number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of channels per cell.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the backing slice.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Flat index of `(y, x, c)`. Callers guarantee the coordinates are in range.
    #[inline]
    pub fn index(&self, y: usize, x: usize, c: usize) -> usize {
        (y * self.width + x) * self.channels + c
    }

    /// Returns the element at `(y, x, c)` if it is within bounds.
    pub fn get(&self, y: usize, x: usize, c: usize) -> Option<T> {
        if y >= self.height || x >= self.width || c >= self.channels {
            return None;
        }
        self.data.get(self.index(y, x, c)).copied()
    }

    /// Reads `(y, x, c)` without the per-axis bounds check.
    ///
    /// Panics if the flat index falls outside the buffer.
    #[inline]
    pub(crate) fn at(&self, y: usize, x: usize, c: usize) -> T {
        self.data[self.index(y, x, c)]
    }

    /// Returns the channel slice for cell `(y, x)`.
    pub fn cell(&self, y: usize, x: usize) -> Option<&'a [T]> {
        if y >= self.height || x >= self.width {
            return None;
        }
        let start = self.index(y, x, 0);
        self.data.get(start..start + self.channels)
    }

    /// Fails with `ChannelMismatch` unless the view has exactly `expected` channels.
    pub(crate) fn expect_channels(
        &self,
        expected: usize,
        context: &'static str,
    ) -> NetDecodeResult<()> {
        if self.channels != expected {
            return Err(NetDecodeError::ChannelMismatch {
                expected,
                got: self.channels,
                context,
            });
        }
        Ok(())
    }
}

fn required_len(height: usize, width: usize, channels: usize) -> NetDecodeResult<usize> {
    let invalid = NetDecodeError::InvalidDimensions {
        height,
        width,
        channels,
    };
    if height == 0 || width == 0 || channels == 0 {
        return Err(invalid);
    }
    height
        .checked_mul(width)
        .and_then(|v| v.checked_mul(channels))
        .ok_or(invalid)
}
