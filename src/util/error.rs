//! Error types for netdecode.

use thiserror::Error;

/// Result alias for netdecode operations.
pub type NetDecodeResult<T> = std::result::Result<T, NetDecodeError>;

/// Errors raised when tensors or configuration do not fit together.
///
/// All of these are configuration errors: a decode call that returns one has
/// produced no partial output.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum NetDecodeError {
    /// A tensor dimension is zero or the element count overflows.
    #[error("invalid dimensions: {height}x{width}x{channels}")]
    InvalidDimensions {
        height: usize,
        width: usize,
        channels: usize,
    },
    /// The backing buffer is shorter than the declared shape requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Only single-batch tensors are decoded.
    #[error("unsupported batch size {batch}, expected 1")]
    BatchUnsupported { batch: usize },
    /// A channel count does not match what the configuration implies.
    #[error("channel mismatch for {context}: expected {expected}, got {got}")]
    ChannelMismatch {
        expected: usize,
        got: usize,
        context: &'static str,
    },
    /// The anchor list holds fewer `(width, height)` pairs than anchor slots.
    #[error("anchor list too short: needed {needed} values, got {got}")]
    AnchorsTooShort { needed: usize, got: usize },
    /// A class index points outside the label table.
    #[error("label index {index} out of range for table of {len}")]
    LabelOutOfRange { index: i64, len: usize },
    /// The color table has fewer entries than segmentation channels.
    #[error("color table too short: needed {needed}, got {got}")]
    ColorTableTooShort { needed: usize, got: usize },
    /// The skeleton edge list is not a rooted tree.
    #[error("invalid skeleton: {reason}")]
    InvalidSkeleton { reason: &'static str },
    /// A scalar configuration value is out of its valid range.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// Image conversion failed (only with the `image-io` feature).
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
