//! Error types for mvscost.

use crate::load_type::Representation;
use thiserror::Error;

/// Result alias for mvscost operations.
pub type CostResult<T> = std::result::Result<T, CostError>;

/// Configuration errors surfaced when building images or cost metrics.
///
/// Evaluation itself never fails: out-of-bounds warps and degenerate
/// statistics are reported through [`crate::BAD_COST`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CostError {
    /// Width or height is zero or overflows.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Backing buffer is shorter than the declared layout.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Region-of-interest mask does not cover the image.
    #[error("mask length mismatch: expected {expected}, got {got}")]
    MaskMismatch { expected: usize, got: usize },
    /// A configuration value is out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
    /// A metric name did not match any known metric kind.
    #[error("unknown cost metric: {0}")]
    UnknownMetric(String),
    /// An image lacks a representation the metric needs.
    #[error("image is missing the {representation:?} representation")]
    MissingRepresentation { representation: Representation },
    /// The matching window does not fit inside an image.
    #[error("window of {window} px does not fit a {width}x{height} image")]
    WindowTooLarge {
        window: usize,
        width: usize,
        height: usize,
    },
    /// The census code would not fit the fixed code capacity.
    #[error("census code of {bits} bits exceeds the {max_bits}-bit capacity")]
    CensusTooLong { bits: usize, max_bits: usize },
    /// Image decoding failed.
    #[error("image io failed: {reason}")]
    ImageIo { reason: String },
}
