//! YUV 4:2:0 → RGBA conversion.
//!
//! Two paths, selected by the classified chroma layout. The interleaved path
//! reads the Y plane and the combined chroma region straight out of the
//! frame's backing memory. The planar path first repacks the possibly padded
//! planes into one tight buffer and converts that as standard I420. Both
//! paths run the `yuv` conversion primitive with full-range Rec.601
//! coefficients and fall back to a row-parallel scalar loop when the
//! primitive rejects the input geometry.

use lumapipe_core::prelude::*;
use rayon::prelude::*;
use yuv::{YuvBiPlanarImage, YuvConversionMode, YuvPlanarImage, YuvRange, YuvStandardMatrix};

use crate::ConversionError;
use crate::classify::{ChromaLayout, UvOrder, classify_chroma};

// Full-range Rec.601 coefficients in 8-bit fixed point (Y range 0..255).
const R_V: i32 = 359;
const G_U: i32 = 88;
const G_V: i32 = 183;
const B_U: i32 = 454;

/// Integer full-range Rec.601 conversion with clamping.
#[inline(always)]
fn yuv_to_rgb(y: i32, u: i32, v: i32) -> (u8, u8, u8) {
    let d = u - 128;
    let e = v - 128;
    let c = y.max(0);
    let r = (256 * c + R_V * e + 128) >> 8;
    let g = (256 * c - G_U * d - G_V * e + 128) >> 8;
    let b = (256 * c + B_U * d + 128) >> 8;
    (
        r.clamp(0, 255) as u8,
        g.clamp(0, 255) as u8,
        b.clamp(0, 255) as u8,
    )
}

/// Bytes a plane occupies given its stride; the last row carries samples
/// only, no trailing padding.
fn plane_span(stride: usize, rows: usize, row_bytes: usize) -> Option<usize> {
    if rows == 0 {
        return Some(0);
    }
    stride.checked_mul(rows - 1)?.checked_add(row_bytes)
}

fn region<'a>(
    backing: &'a [u8],
    offset: usize,
    len: usize,
    what: &str,
) -> Result<&'a [u8], ConversionError> {
    offset
        .checked_add(len)
        .and_then(|end| backing.get(offset..end))
        .ok_or_else(|| ConversionError::InvalidLayout(format!("{what} exceeds backing region")))
}

/// YUV 4:2:0 → RGBA converter.
///
/// Stateless between frames apart from its buffer pools; the chroma layout
/// is re-derived on every call.
pub struct YuvToRgbaConverter {
    pool: BufferPool,
    packed: BufferPool,
}

impl YuvToRgbaConverter {
    /// Size the internal pools for frames up to `max_width` x `max_height`.
    pub fn new(max_width: u32, max_height: u32) -> Self {
        let pixels = max_width as usize * max_height as usize;
        Self {
            pool: BufferPool::with_limits(2, pixels * 4, 4),
            packed: BufferPool::with_limits(2, pixels + pixels / 2, 4),
        }
    }

    /// Convert a frame into a freshly leased RGBA raster of the frame's
    /// dimensions.
    ///
    /// Dimensions are validated before any plane memory is touched; exact
    /// half-resolution chroma requires them to be even and nonzero.
    pub fn convert(&self, frame: &FrameBuffer) -> Result<RgbaRaster, ConversionError> {
        let width = frame.width();
        let height = frame.height();
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(ConversionError::InvalidDimensions { width, height });
        }
        let chroma = classify_chroma(frame)?;
        match chroma.layout {
            ChromaLayout::Interleaved(order) => {
                self.convert_interleaved(frame, order, chroma.first)
            }
            ChromaLayout::Planar => self.convert_planar(frame, chroma.first, chroma.second),
        }
    }

    fn convert_interleaved(
        &self,
        frame: &FrameBuffer,
        order: UvOrder,
        base: &PlaneDescriptor,
    ) -> Result<RgbaRaster, ConversionError> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let chroma_width = width / 2;
        let chroma_height = height / 2;
        let y_desc = &frame.planes()[0];
        let y_stride = y_desc.row_stride.max(width);
        let uv_stride = base.row_stride.max(chroma_width * 2);
        let backing = frame.backing_data();

        let y_span = plane_span(y_stride, height, width)
            .ok_or_else(|| ConversionError::InvalidLayout("y plane span overflow".into()))?;
        let uv_span = plane_span(uv_stride, chroma_height, chroma_width * 2)
            .ok_or_else(|| ConversionError::InvalidLayout("chroma span overflow".into()))?;
        let y_data = region(backing, y_desc.offset, y_span, "y plane")?;
        let uv_data = region(backing, base.offset, uv_span, "chroma region")?;

        let row_bytes = width
            .checked_mul(4)
            .ok_or_else(|| ConversionError::InvalidLayout("output row overflow".into()))?;
        let out_len = row_bytes
            .checked_mul(height)
            .ok_or_else(|| ConversionError::InvalidLayout("output size overflow".into()))?;
        let mut buf = self.pool.lease();
        unsafe { buf.resize_uninit(out_len) };
        let dst = buf.as_mut_slice();

        let bi = YuvBiPlanarImage {
            y_plane: y_data,
            y_stride: y_stride as u32,
            uv_plane: uv_data,
            uv_stride: uv_stride as u32,
            width: frame.width(),
            height: frame.height(),
        };
        let primitive = match order {
            UvOrder::Uv => yuv::yuv_nv12_to_rgba(
                &bi,
                dst,
                row_bytes as u32,
                YuvRange::Full,
                YuvStandardMatrix::Bt601,
                YuvConversionMode::Balanced,
            ),
            UvOrder::Vu => yuv::yuv_nv21_to_rgba(
                &bi,
                dst,
                row_bytes as u32,
                YuvRange::Full,
                YuvStandardMatrix::Bt601,
                YuvConversionMode::Balanced,
            ),
        };
        if primitive.is_err() {
            interleaved_rows(
                dst,
                row_bytes,
                y_data,
                y_stride,
                uv_data,
                uv_stride,
                width,
                chroma_width,
                order,
            );
        }

        Ok(RgbaRaster::new(frame.width(), frame.height(), buf))
    }

    fn convert_planar(
        &self,
        frame: &FrameBuffer,
        u_desc: &PlaneDescriptor,
        v_desc: &PlaneDescriptor,
    ) -> Result<RgbaRaster, ConversionError> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let chroma_width = width / 2;
        let chroma_height = height / 2;
        let y_desc = &frame.planes()[0];
        let y_stride = y_desc.row_stride.max(width);
        let u_stride = u_desc.row_stride.max(chroma_width);
        let v_stride = v_desc.row_stride.max(chroma_width);
        let backing = frame.backing_data();

        let y_span = plane_span(y_stride, height, width)
            .ok_or_else(|| ConversionError::InvalidLayout("y plane span overflow".into()))?;
        let u_span = plane_span(u_stride, chroma_height, chroma_width)
            .ok_or_else(|| ConversionError::InvalidLayout("u plane span overflow".into()))?;
        let v_span = plane_span(v_stride, chroma_height, chroma_width)
            .ok_or_else(|| ConversionError::InvalidLayout("v plane span overflow".into()))?;
        let y_data = region(backing, y_desc.offset, y_span, "y plane")?;
        let u_data = region(backing, u_desc.offset, u_span, "u plane")?;
        let v_data = region(backing, v_desc.offset, v_span, "v plane")?;

        let y_len = width
            .checked_mul(height)
            .ok_or_else(|| ConversionError::InvalidLayout("y size overflow".into()))?;
        let chroma_len = chroma_width * chroma_height;
        let packed_len = y_len + 2 * chroma_len;

        // Row padding means the planes cannot be treated as one contiguous
        // block; repack them into a tight buffer first.
        let mut packed = self.packed.lease();
        unsafe { packed.resize_uninit(packed_len) };
        let packed_slice = packed.as_mut_slice();
        if y_stride == width {
            packed_slice[..y_len].copy_from_slice(&y_data[..y_len]);
        } else {
            for row in 0..height {
                let src = &y_data[row * y_stride..][..width];
                packed_slice[row * width..(row + 1) * width].copy_from_slice(src);
            }
        }
        copy_chroma_plane(
            &mut packed_slice[y_len..y_len + chroma_len],
            u_data,
            u_stride,
            chroma_width,
            chroma_height,
        );
        copy_chroma_plane(
            &mut packed_slice[y_len + chroma_len..],
            v_data,
            v_stride,
            chroma_width,
            chroma_height,
        );

        let row_bytes = width
            .checked_mul(4)
            .ok_or_else(|| ConversionError::InvalidLayout("output row overflow".into()))?;
        let out_len = row_bytes
            .checked_mul(height)
            .ok_or_else(|| ConversionError::InvalidLayout("output size overflow".into()))?;
        let mut buf = self.pool.lease();
        unsafe { buf.resize_uninit(out_len) };
        let dst = buf.as_mut_slice();

        let packed_ref = packed.as_slice();
        let planar = YuvPlanarImage {
            y_plane: &packed_ref[..y_len],
            y_stride: width as u32,
            u_plane: &packed_ref[y_len..y_len + chroma_len],
            u_stride: chroma_width as u32,
            v_plane: &packed_ref[y_len + chroma_len..packed_len],
            v_stride: chroma_width as u32,
            width: frame.width(),
            height: frame.height(),
        };
        if yuv::yuv420_to_rgba(
            &planar,
            dst,
            row_bytes as u32,
            YuvRange::Full,
            YuvStandardMatrix::Bt601,
        )
        .is_err()
        {
            planar_rows(
                dst,
                row_bytes,
                &packed_ref[..y_len],
                width,
                &packed_ref[y_len..y_len + chroma_len],
                &packed_ref[y_len + chroma_len..packed_len],
                chroma_width,
            );
        }

        Ok(RgbaRaster::new(frame.width(), frame.height(), buf))
    }
}

/// Copy one chroma plane into a tight destination, skipping trailing row
/// padding. Bounded by the declared plane height.
fn copy_chroma_plane(dst: &mut [u8], src: &[u8], stride: usize, row_len: usize, rows: usize) {
    if stride == row_len {
        dst[..row_len * rows].copy_from_slice(&src[..row_len * rows]);
        return;
    }
    for row in 0..rows {
        let line = &src[row * stride..][..row_len];
        dst[row * row_len..(row + 1) * row_len].copy_from_slice(line);
    }
}

#[allow(clippy::too_many_arguments)]
fn interleaved_rows(
    dst: &mut [u8],
    row_bytes: usize,
    y_data: &[u8],
    y_stride: usize,
    uv_data: &[u8],
    uv_stride: usize,
    width: usize,
    chroma_width: usize,
    order: UvOrder,
) {
    dst.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(row, dst_line)| {
            let y_line = &y_data[row * y_stride..][..width];
            let uv_line = &uv_data[(row / 2) * uv_stride..][..chroma_width * 2];
            for x in 0..width {
                let uv_base = (x / 2) * 2;
                let (u, v) = match order {
                    UvOrder::Uv => (uv_line[uv_base], uv_line[uv_base + 1]),
                    UvOrder::Vu => (uv_line[uv_base + 1], uv_line[uv_base]),
                };
                let (r, g, b) = yuv_to_rgb(y_line[x] as i32, u as i32, v as i32);
                let di = x * 4;
                dst_line[di] = r;
                dst_line[di + 1] = g;
                dst_line[di + 2] = b;
                dst_line[di + 3] = 255;
            }
        });
}

fn planar_rows(
    dst: &mut [u8],
    row_bytes: usize,
    y_data: &[u8],
    width: usize,
    u_data: &[u8],
    v_data: &[u8],
    chroma_width: usize,
) {
    dst.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(row, dst_line)| {
            let y_line = &y_data[row * width..][..width];
            let u_line = &u_data[(row / 2) * chroma_width..][..chroma_width];
            let v_line = &v_data[(row / 2) * chroma_width..][..chroma_width];
            for x in 0..width {
                let ci = x / 2;
                let (r, g, b) = yuv_to_rgb(y_line[x] as i32, u_line[ci] as i32, v_line[ci] as i32);
                let di = x * 4;
                dst_line[di] = r;
                dst_line[di + 1] = g;
                dst_line[di + 2] = b;
                dst_line[di + 3] = 255;
            }
        });
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

    fn nv12_bytes(y: u8, u: u8, v: u8) -> Vec<u8> {
        let mut bytes = vec![y; 16];
        for _ in 0..4 {
            bytes.push(u);
            bytes.push(v);
        }
        bytes
    }

    #[test]
    fn nv12_output_matches_frame_dimensions() {
        let conv = YuvToRgbaConverter::new(4, 4);
        let frame = frame_from_bytes(4, 4, nv12_plane_layout(4, 4), &nv12_bytes(90, 128, 128));
        let raster = conv.convert(&frame).unwrap();
        assert_eq!(raster.width(), 4);
        assert_eq!(raster.height(), 4);
        assert_eq!(raster.data().len(), 4 * 4 * 4);
    }

    #[test]
    fn neutral_chroma_white_frame_is_uniform() {
        let conv = YuvToRgbaConverter::new(4, 4);
        let frame = frame_from_bytes(4, 4, nv12_plane_layout(4, 4), &nv12_bytes(235, 128, 128));
        let raster = conv.convert(&frame).unwrap();
        for px in raster.data().chunks_exact(4) {
            for channel in &px[..3] {
                assert!((*channel as i16 - 235).abs() <= 1);
            }
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn chroma_byte_order_does_not_change_output() {
        let conv = YuvToRgbaConverter::new(4, 4);
        let nv12 = frame_from_bytes(4, 4, nv12_plane_layout(4, 4), &nv12_bytes(120, 90, 200));
        let mut bytes = vec![120u8; 16];
        for _ in 0..4 {
            // Same logical chroma content with the V byte leading.
            bytes.push(200);
            bytes.push(90);
        }
        let nv21 = frame_from_bytes(4, 4, nv21_plane_layout(4, 4), &bytes);

        let a = conv.convert(&nv12).unwrap();
        let b = conv.convert(&nv21).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn padded_chroma_rows_match_unpadded() {
        let conv = YuvToRgbaConverter::new(4, 4);
        let y: Vec<u8> = (0..16).map(|i| (i * 8) as u8).collect();
        let u = [[10u8, 20], [30, 40]];
        let v = [[50u8, 60], [70, 80]];

        let mut tight = y.clone();
        for row in &u {
            tight.extend_from_slice(row);
        }
        for row in &v {
            tight.extend_from_slice(row);
        }
        let unpadded = frame_from_bytes(4, 4, i420_plane_layout(4, 4, 0), &tight);

        let mut padded = y.clone();
        for row in &u {
            padded.extend_from_slice(row);
            padded.extend_from_slice(&[0xAA, 0xAA]);
        }
        for row in &v {
            padded.extend_from_slice(row);
            padded.extend_from_slice(&[0xAA, 0xAA]);
        }
        let strided = frame_from_bytes(4, 4, i420_plane_layout(4, 4, 2), &padded);

        let a = conv.convert(&unpadded).unwrap();
        let b = conv.convert(&strided).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn padded_y_rows_match_unpadded() {
        let conv = YuvToRgbaConverter::new(8, 4);
        let mut planes = i420_plane_layout(4, 4, 0);

        let mut tight = Vec::new();
        for row in 0..4u8 {
            tight.extend_from_slice(&[row * 10, row * 10 + 1, row * 10 + 2, row * 10 + 3]);
        }
        tight.extend_from_slice(&[128; 8]);
        let unpadded = frame_from_bytes(4, 4, planes.clone(), &tight);

        // Same logical content with two trailing pad bytes per luma row.
        planes[0].row_stride = 6;
        for plane in planes.iter_mut().skip(1) {
            plane.offset += 2 * 4;
        }
        let mut padded = Vec::new();
        for row in 0..4u8 {
            padded.extend_from_slice(&[row * 10, row * 10 + 1, row * 10 + 2, row * 10 + 3]);
            padded.extend_from_slice(&[0xEE, 0xEE]);
        }
        padded.extend_from_slice(&[128; 8]);
        let strided = frame_from_bytes(4, 4, planes, &padded);

        let a = conv.convert(&unpadded).unwrap();
        let b = conv.convert(&strided).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let conv = YuvToRgbaConverter::new(4, 4);
        let frame = frame_from_bytes(0, 4, nv12_plane_layout(0, 4), &[]);
        assert!(matches!(
            conv.convert(&frame),
            Err(ConversionError::InvalidDimensions { width: 0, .. })
        ));
    }

    #[test]
    fn odd_dimensions_are_rejected() {
        let conv = YuvToRgbaConverter::new(6, 3);
        let frame = frame_from_bytes(6, 3, nv12_plane_layout(6, 3), &[0u8; 24]);
        assert!(matches!(
            conv.convert(&frame),
            Err(ConversionError::InvalidDimensions { height: 3, .. })
        ));
    }

    #[test]
    fn external_backing_converts_like_pooled() {
        struct OwnedRegion(Vec<u8>);

        impl lumapipe_core::frame::ExternalBacking for OwnedRegion {
            fn data(&self) -> &[u8] {
                &self.0
            }
        }

        let conv = YuvToRgbaConverter::new(4, 4);
        let bytes = nv12_bytes(64, 100, 180);
        let pooled = frame_from_bytes(4, 4, nv12_plane_layout(4, 4), &bytes);
        let external = FrameBuffer::from_external(
            PixelFormat::Yuv420,
            4,
            4,
            std::sync::Arc::new(OwnedRegion(bytes)),
            nv12_plane_layout(4, 4),
        );

        let a = conv.convert(&pooled).unwrap();
        let b = conv.convert(&external).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn truncated_backing_is_rejected() {
        let conv = YuvToRgbaConverter::new(4, 4);
        let frame = frame_from_bytes(4, 4, nv12_plane_layout(4, 4), &[0u8; 20]);
        assert!(matches!(
            conv.convert(&frame),
            Err(ConversionError::InvalidLayout(_))
        ));
    }
}
