use smallvec::{SmallVec, smallvec};
use std::sync::Arc;

use crate::{buffer::BufferLease, format::PixelFormat};

/// Read-only description of one color plane inside a frame's backing region.
///
/// `offset` addresses the plane's first sample. `row_stride` is the byte
/// distance between row starts and may exceed the logical row width when the
/// producer pads rows for alignment. `pixel_stride` is the byte distance
/// between horizontally adjacent samples; interleaved chroma planes use 2.
///
/// # Example
/// ```rust
/// use lumapipe_core::prelude::PlaneDescriptor;
///
/// let y = PlaneDescriptor {
///     offset: 0,
///     row_stride: 640,
///     pixel_stride: 1,
///     width: 640,
///     height: 480,
/// };
/// assert_eq!(y.required_len(), Some(640 * 480));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaneDescriptor {
    /// Byte offset of the first sample within the backing region.
    pub offset: usize,
    /// Bytes from one row start to the next.
    pub row_stride: usize,
    /// Bytes between adjacent samples in a row.
    pub pixel_stride: usize,
    /// Logical samples per row.
    pub width: usize,
    /// Logical rows.
    pub height: usize,
}

impl PlaneDescriptor {
    /// Bytes required past `offset` to cover every sample of this plane.
    ///
    /// The final row only needs its samples, not the trailing padding.
    /// Returns `None` on arithmetic overflow.
    pub fn required_len(&self) -> Option<usize> {
        if self.width == 0 || self.height == 0 {
            return Some(0);
        }
        let last_row = (self.width - 1)
            .checked_mul(self.pixel_stride)?
            .checked_add(1)?;
        self.row_stride
            .checked_mul(self.height - 1)?
            .checked_add(last_row)
    }
}

/// Producer-owned backing for zero-copy frames.
///
/// The whole frame lives in one contiguous region and plane descriptors
/// index into it; implementations can map DMA buffers or other shared
/// memory. The region must stay valid until the conversion call returns.
pub trait ExternalBacking: Send + Sync {
    /// Borrow the backing bytes; lifetime is tied to `self`.
    fn data(&self) -> &[u8];
}

enum Backing {
    Pooled(BufferLease),
    External(Arc<dyn ExternalBacking>),
}

/// A raw sensor frame: format tag, geometry, one backing region, and the
/// plane descriptors indexing into it (Y, chroma-A, chroma-B for 4:2:0).
///
/// The frame is created fresh per capture and fully consumed before the next
/// one; nothing downstream retains plane memory past a conversion's return.
///
/// # Example
/// ```rust
/// use lumapipe_core::prelude::*;
///
/// let planes = nv12_plane_layout(4, 4);
/// let len = backing_len(&planes);
/// let pool = BufferPool::with_capacity(1, len);
/// let mut lease = pool.lease();
/// lease.resize(len);
/// let frame = FrameBuffer::from_pooled(PixelFormat::Yuv420, 4, 4, lease, planes);
/// assert_eq!(frame.planes().len(), 3);
/// ```
pub struct FrameBuffer {
    format: PixelFormat,
    width: u32,
    height: u32,
    backing: Backing,
    planes: SmallVec<[PlaneDescriptor; 3]>,
}

impl FrameBuffer {
    /// Build a frame over a pooled buffer.
    pub fn from_pooled(
        format: PixelFormat,
        width: u32,
        height: u32,
        buffer: BufferLease,
        planes: SmallVec<[PlaneDescriptor; 3]>,
    ) -> Self {
        Self {
            format,
            width,
            height,
            backing: Backing::Pooled(buffer),
            planes,
        }
    }

    /// Build a frame over producer-owned memory.
    pub fn from_external(
        format: PixelFormat,
        width: u32,
        height: u32,
        backing: Arc<dyn ExternalBacking>,
        planes: SmallVec<[PlaneDescriptor; 3]>,
    ) -> Self {
        Self {
            format,
            width,
            height,
            backing: Backing::External(backing),
            planes,
        }
    }

    /// Declared pixel format tag.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Plane descriptors in declaration order.
    pub fn planes(&self) -> &[PlaneDescriptor] {
        &self.planes
    }

    /// The whole backing region.
    pub fn backing_data(&self) -> &[u8] {
        match &self.backing {
            Backing::Pooled(lease) => lease.as_slice(),
            Backing::External(backing) => backing.data(),
        }
    }

    /// Backing bytes from a plane's first sample onward.
    pub fn plane_data(&self, index: usize) -> Option<&[u8]> {
        let desc = self.planes.get(index)?;
        self.backing_data().get(desc.offset..)
    }
}

/// Descriptor triple for an NV12 frame: unpadded Y, then one interleaved
/// chroma region with the U byte at the base address.
///
/// # Example
/// ```rust
/// use lumapipe_core::prelude::nv12_plane_layout;
///
/// let planes = nv12_plane_layout(4, 4);
/// assert_eq!(planes[1].offset, 16);
/// assert_eq!(planes[2].offset, 17);
/// assert_eq!(planes[1].pixel_stride, 2);
/// ```
pub fn nv12_plane_layout(width: u32, height: u32) -> SmallVec<[PlaneDescriptor; 3]> {
    semiplanar_layout(width, height, true)
}

/// Descriptor triple for NV21: as NV12 with the V byte at the base address.
pub fn nv21_plane_layout(width: u32, height: u32) -> SmallVec<[PlaneDescriptor; 3]> {
    semiplanar_layout(width, height, false)
}

fn semiplanar_layout(width: u32, height: u32, u_first: bool) -> SmallVec<[PlaneDescriptor; 3]> {
    let (w, h) = (width as usize, height as usize);
    let (cw, ch) = (w / 2, h / 2);
    let y = PlaneDescriptor {
        offset: 0,
        row_stride: w,
        pixel_stride: 1,
        width: w,
        height: h,
    };
    let base = w * h;
    let chroma = |offset| PlaneDescriptor {
        offset,
        row_stride: cw * 2,
        pixel_stride: 2,
        width: cw,
        height: ch,
    };
    let (u, v) = if u_first {
        (chroma(base), chroma(base + 1))
    } else {
        (chroma(base + 1), chroma(base))
    };
    smallvec![y, u, v]
}

/// Descriptor triple for planar I420 with `chroma_row_padding` trailing bytes
/// after each chroma row.
///
/// # Example
/// ```rust
/// use lumapipe_core::prelude::i420_plane_layout;
///
/// let planes = i420_plane_layout(4, 4, 2);
/// assert_eq!(planes[1].row_stride, 4);
/// assert_eq!(planes[2].offset, 16 + 4 * 2);
/// ```
pub fn i420_plane_layout(
    width: u32,
    height: u32,
    chroma_row_padding: usize,
) -> SmallVec<[PlaneDescriptor; 3]> {
    let (w, h) = (width as usize, height as usize);
    let (cw, ch) = (w / 2, h / 2);
    let stride = cw + chroma_row_padding;
    let y = PlaneDescriptor {
        offset: 0,
        row_stride: w,
        pixel_stride: 1,
        width: w,
        height: h,
    };
    let u = PlaneDescriptor {
        offset: w * h,
        row_stride: stride,
        pixel_stride: 1,
        width: cw,
        height: ch,
    };
    let v = PlaneDescriptor {
        offset: w * h + stride * ch,
        row_stride: stride,
        pixel_stride: 1,
        width: cw,
        height: ch,
    };
    smallvec![y, u, v]
}

/// Total backing bytes needed to hold every plane of a descriptor triple.
pub fn backing_len(planes: &[PlaneDescriptor]) -> usize {
    planes
        .iter()
        .filter_map(|p| p.required_len().and_then(|len| p.offset.checked_add(len)))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nv12_layout_places_u_at_base() {
        let planes = nv12_plane_layout(4, 4);
        assert_eq!(planes[0].row_stride, 4);
        assert_eq!(planes[1].offset, 16);
        assert_eq!(planes[2].offset, 17);
        assert_eq!(backing_len(&planes), 16 + 8);
    }

    #[test]
    fn nv21_layout_places_v_at_base() {
        let planes = nv21_plane_layout(4, 4);
        assert_eq!(planes[1].offset, 17);
        assert_eq!(planes[2].offset, 16);
        assert_eq!(backing_len(&planes), 16 + 8);
    }

    #[test]
    fn i420_layout_accounts_for_row_padding() {
        let planes = i420_plane_layout(4, 4, 2);
        assert_eq!(planes[1].offset, 16);
        assert_eq!(planes[1].row_stride, 4);
        assert_eq!(planes[2].offset, 24);
        // The last chroma row carries samples only, no trailing padding.
        assert_eq!(backing_len(&planes), 24 + 4 + 2);
    }

    #[test]
    fn required_len_covers_strided_plane() {
        let desc = PlaneDescriptor {
            offset: 0,
            row_stride: 8,
            pixel_stride: 2,
            width: 3,
            height: 2,
        };
        // One full row plus the last row's samples: 8 + (2 * 2 + 1).
        assert_eq!(desc.required_len(), Some(13));
    }

    #[test]
    fn plane_data_starts_at_offset() {
        let planes = nv12_plane_layout(2, 2);
        let len = backing_len(&planes);
        let pool = crate::buffer::BufferPool::with_capacity(1, len);
        let mut lease = pool.lease();
        lease.resize(len);
        for (i, b) in lease.as_mut_slice().iter_mut().enumerate() {
            *b = i as u8;
        }
        let frame = FrameBuffer::from_pooled(PixelFormat::Yuv420, 2, 2, lease, planes);
        assert_eq!(frame.plane_data(1).unwrap()[0], 4);
        assert_eq!(frame.plane_data(2).unwrap()[0], 5);
        assert!(frame.plane_data(3).is_none());
    }
}
