//! Error types for gckmatch.

use thiserror::Error;

/// Result alias for gckmatch operations.
pub type GckMatchResult<T> = std::result::Result<T, GckMatchError>;

/// Errors that can occur when running gckmatch algorithms.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GckMatchError {
    /// Width or height is zero or overflows the addressable range.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer cannot hold the described image or descriptor set.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A region of interest does not fit inside the image.
    #[error("roi {x},{y} {width}x{height} outside image {img_width}x{img_height}")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The kernel does not fit inside the image.
    #[error("kernel size {kernel} larger than image {width}x{height}")]
    KernelTooLarge {
        kernel: usize,
        width: usize,
        height: usize,
    },
    /// The kernel size is zero or not a power of two.
    #[error("kernel size {kernel} is not a power of two")]
    InvalidKernelSize { kernel: usize },
    /// The requested basis count is zero or exceeds the kernel area.
    #[error("basis count {bases} outside 1..={max}")]
    InvalidBasisCount { bases: usize, max: usize },
    /// Descriptor dimensionality does not match the index or a sibling set.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    /// The index holds no points.
    #[error("index is empty")]
    EmptyIndex,
    /// An allocation request could not be satisfied.
    #[error("allocation of {bytes} bytes failed")]
    AllocationFailed { bytes: usize },
    /// A source coordinate does not fit the packed 16-bit representation.
    #[error("coordinate {x},{y} does not fit in 16 bits")]
    CoordinateOverflow { x: usize, y: usize },
    /// Image decoding or encoding failed.
    #[error("image io: {reason}")]
    ImageIo { reason: String },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}
