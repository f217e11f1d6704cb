use lumapipe_core::prelude::*;

use crate::{ConversionError, convert::YuvToRgbaConverter, luma::LumaReducer};

/// The pipeline's single entry point: classify, convert, reduce.
///
/// Owns the buffer pools for intermediate and output rasters so a steady
/// stream of frames reuses memory. The intermediate RGBA raster never
/// outlives one `convert` call.
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
/// lease.as_mut_slice().fill(128);
/// let frame = FrameBuffer::from_pooled(PixelFormat::Yuv420, 4, 4, lease, planes);
///
/// let converter = FrameConverter::new(4, 4);
/// let luma = converter.convert(&frame).unwrap();
/// assert_eq!((luma.width(), luma.height()), (4, 4));
/// ```
pub struct FrameConverter {
    rgba: YuvToRgbaConverter,
    reducer: LumaReducer,
}

impl FrameConverter {
    /// Size internal pools for frames up to `max_width` x `max_height`.
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            rgba: YuvToRgbaConverter::new(max_width, max_height),
            reducer: LumaReducer::new(max_width, max_height),
        }
    }

    /// Convert one raw frame into a luma raster of the frame's dimensions.
    ///
    /// The frame's plane memory is only read for the duration of this call;
    /// on return the caller is free to recycle or invalidate it. Errors
    /// surface as typed values so a misreported frame can be skipped without
    /// stopping the stream.
    pub fn convert(&self, frame: &FrameBuffer) -> Result<LumaRaster, ConversionError> {
        let rgba = self.rgba.convert(frame)?;
        Ok(self.reducer.reduce(&rgba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::SmallVec;

    fn frame_from_bytes(
        width: u32,
        height: u32,
        planes: SmallVec<[PlaneDescriptor; 3]>,
        bytes: &[u8],
    ) -> FrameBuffer {
        let pool = BufferPool::with_capacity(1, bytes.len());
        let mut lease = pool.lease();
        lease.resize(bytes.len());
        lease.as_mut_slice().copy_from_slice(bytes);
        FrameBuffer::from_pooled(PixelFormat::Yuv420, width, height, lease, planes)
    }

    fn semiplanar_bytes(y: u8, first: u8, second: u8) -> Vec<u8> {
        let mut bytes = vec![y; 16];
        for _ in 0..4 {
            bytes.push(first);
            bytes.push(second);
        }
        bytes
    }

    #[test]
    fn white_nv12_frame_reduces_to_uniform_luma() {
        let converter = FrameConverter::new(4, 4);
        let frame = frame_from_bytes(
            4,
            4,
            nv12_plane_layout(4, 4),
            &semiplanar_bytes(235, 128, 128),
        );
        let luma = converter.convert(&frame).unwrap();
        assert_eq!((luma.width(), luma.height()), (4, 4));
        assert_eq!(luma.data().len(), 16);
        for value in luma.data() {
            assert!((*value as i16 - 235).abs() <= 1);
        }
    }

    #[test]
    fn luma_is_invariant_under_chroma_byte_order() {
        let converter = FrameConverter::new(4, 4);
        let nv12 = frame_from_bytes(
            4,
            4,
            nv12_plane_layout(4, 4),
            &semiplanar_bytes(120, 90, 200),
        );
        // Identical logical U/V content, V byte leading.
        let nv21 = frame_from_bytes(
            4,
            4,
            nv21_plane_layout(4, 4),
            &semiplanar_bytes(120, 200, 90),
        );
        let a = converter.convert(&nv12).unwrap();
        let b = converter.convert(&nv21).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn padded_planar_luma_matches_unpadded() {
        let converter = FrameConverter::new(4, 4);
        let y: Vec<u8> = (0..16).map(|i| (i * 13) as u8).collect();
        let chroma_rows = [[100u8, 140], [160, 90]];

        let mut tight = y.clone();
        for _ in 0..2 {
            for row in &chroma_rows {
                tight.extend_from_slice(row);
            }
        }
        let unpadded = frame_from_bytes(4, 4, i420_plane_layout(4, 4, 0), &tight);

        let mut padded = y.clone();
        for _ in 0..2 {
            for row in &chroma_rows {
                padded.extend_from_slice(row);
                padded.extend_from_slice(&[0x55, 0x55]);
            }
        }
        let strided = frame_from_bytes(4, 4, i420_plane_layout(4, 4, 2), &padded);

        let a = converter.convert(&unpadded).unwrap();
        let b = converter.convert(&strided).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn dimension_errors_propagate() {
        let converter = FrameConverter::new(4, 4);
        let frame = frame_from_bytes(4, 0, nv12_plane_layout(4, 0), &[]);
        assert!(matches!(
            converter.convert(&frame),
            Err(ConversionError::InvalidDimensions { height: 0, .. })
        ));
    }
}
