use std::fmt;

/// Pixel formats that flow through the conversion pipeline.
///
/// # Example
/// ```rust
/// use lumapipe_core::prelude::PixelFormat;
///
/// assert!(PixelFormat::Yuv420.is_yuv420());
/// assert_eq!(PixelFormat::Yuv420.plane_count(), 3);
/// assert_eq!(PixelFormat::Grey8.to_string(), "GREY8");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelFormat {
    /// 8-bit YUV 4:2:0: a full-resolution luma plane plus two half-resolution
    /// chroma planes whose physical layout is resolved per frame.
    Yuv420,
    /// 8-bit RGBA, tightly packed, alpha always opaque.
    Rgba8888,
    /// 8-bit single-channel luma.
    Grey8,
}

impl PixelFormat {
    /// Whether this format belongs to the 4:2:0 family the pipeline accepts.
    pub fn is_yuv420(self) -> bool {
        matches!(self, PixelFormat::Yuv420)
    }

    /// Number of planes a frame of this format carries.
    pub fn plane_count(self) -> usize {
        match self {
            PixelFormat::Yuv420 => 3,
            PixelFormat::Rgba8888 | PixelFormat::Grey8 => 1,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Yuv420 => "YUV420",
            PixelFormat::Rgba8888 => "RGBA8888",
            PixelFormat::Grey8 => "GREY8",
        };
        write!(f, "{name}")
    }
}
