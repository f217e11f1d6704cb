#![doc = include_str!("../README.md")]

use lumapipe_core::format::PixelFormat;

pub mod classify;
pub mod convert;
#[cfg(feature = "image")]
pub mod export;
pub mod luma;
pub mod pipeline;
pub mod worker;

/// Errors surfaced by frame conversion.
///
/// Every variant is detected synchronously inside the conversion call and
/// returned to the caller; the pipeline never retries internally and never
/// returns partial output. The expected reaction to a malformed frame is to
/// skip it and continue with the next capture.
///
/// # Example
/// ```rust
/// use lumapipe_codec::ConversionError;
///
/// let err = ConversionError::InvalidDimensions { width: 3, height: 4 };
/// assert!(matches!(err, ConversionError::InvalidDimensions { .. }));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Declared format is not in the 4:2:0 family, or the frame does not
    /// carry exactly three planes.
    #[error("unsupported format {format} with {planes} plane(s)")]
    UnsupportedFormat {
        /// Format the frame declared.
        format: PixelFormat,
        /// Number of planes the frame carried.
        planes: usize,
    },
    /// Plane geometry that cannot be classified or read safely.
    #[error("invalid chroma layout: {0}")]
    InvalidLayout(String),
    /// Zero or odd frame dimensions.
    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions {
        /// Declared frame width.
        width: u32,
        /// Declared frame height.
        height: u32,
    },
}

pub mod prelude {
    pub use crate::ConversionError;
    pub use crate::classify::{ChromaLayout, ClassifiedChroma, UvOrder, classify_chroma};
    pub use crate::convert::YuvToRgbaConverter;
    #[cfg(feature = "image")]
    pub use crate::export::{IntoGrayImage, luma_to_dynamic_image};
    pub use crate::luma::LumaReducer;
    pub use crate::pipeline::FrameConverter;
    pub use crate::worker::ConvertWorker;
    pub use lumapipe_core::prelude::*;
}
