//! Chroma layout classification.
//!
//! Camera stacks deliver 4:2:0 frames as three plane views without saying
//! which physical layout backs them. The layout is derived here from the
//! descriptors alone, once per frame, and anything that cannot be identified
//! safely is rejected rather than guessed at.

use lumapipe_core::prelude::*;

use crate::ConversionError;

/// Byte order of an interleaved chroma pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UvOrder {
    /// U byte first (NV12).
    Uv,
    /// V byte first (NV21).
    Vu,
}

/// Physical chroma layout of a 4:2:0 frame.
///
/// Derived fresh for every frame: hardware can switch layouts between
/// captures, so the result is never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChromaLayout {
    /// Semi-planar: one combined region of interleaved chroma samples.
    Interleaved(UvOrder),
    /// Fully planar: separate U and V planes, each independently strided.
    Planar,
}

/// Classification result: the layout plus the chroma descriptors ordered by
/// their position in the backing region.
#[derive(Debug, Clone, Copy)]
pub struct ClassifiedChroma<'a> {
    /// Derived layout.
    pub layout: ChromaLayout,
    /// Chroma plane whose first byte comes first in the backing region.
    pub first: &'a PlaneDescriptor,
    /// The remaining chroma plane.
    pub second: &'a PlaneDescriptor,
}

/// Determine how a frame's chroma planes are laid out in memory.
///
/// A chroma pixel stride of 2 marks an interleaved pair; the two planes must
/// then start exactly one byte apart, and the sign of the distance picks the
/// byte order. A pixel stride of 1 on both planes means fully planar. Both
/// descriptors index the frame's single backing region, so their start
/// offsets are directly comparable.
///
/// # Example
/// ```rust
/// use lumapipe_codec::prelude::*;
///
/// let planes = nv12_plane_layout(4, 4);
/// let len = backing_len(&planes);
/// let pool = BufferPool::with_capacity(1, len);
/// let mut lease = pool.lease();
/// lease.resize(len);
/// let frame = FrameBuffer::from_pooled(PixelFormat::Yuv420, 4, 4, lease, planes);
///
/// let chroma = classify_chroma(&frame).unwrap();
/// assert_eq!(chroma.layout, ChromaLayout::Interleaved(UvOrder::Uv));
/// ```
pub fn classify_chroma(frame: &FrameBuffer) -> Result<ClassifiedChroma<'_>, ConversionError> {
    let planes = frame.planes();
    if !frame.format().is_yuv420() || planes.len() != 3 {
        return Err(ConversionError::UnsupportedFormat {
            format: frame.format(),
            planes: planes.len(),
        });
    }
    let y = &planes[0];
    if y.pixel_stride != 1 {
        return Err(ConversionError::InvalidLayout(format!(
            "y plane pixel stride {} (expected 1)",
            y.pixel_stride
        )));
    }
    let (a, b) = (&planes[1], &planes[2]);
    match (a.pixel_stride, b.pixel_stride) {
        (2, 2) => {
            let distance = b.offset as isize - a.offset as isize;
            match distance {
                1 => Ok(ClassifiedChroma {
                    layout: ChromaLayout::Interleaved(UvOrder::Uv),
                    first: a,
                    second: b,
                }),
                -1 => Ok(ClassifiedChroma {
                    layout: ChromaLayout::Interleaved(UvOrder::Vu),
                    first: b,
                    second: a,
                }),
                other => Err(ConversionError::InvalidLayout(format!(
                    "interleaved chroma planes {other} bytes apart"
                ))),
            }
        }
        (1, 1) => Ok(ClassifiedChroma {
            layout: ChromaLayout::Planar,
            first: a,
            second: b,
        }),
        (a_stride, b_stride) => Err(ConversionError::InvalidLayout(format!(
            "chroma pixel strides {a_stride}/{b_stride}"
        ))),
    }
}
