use lumapipe_core::prelude::*;

// Rec.601 perceptual weights in 8-bit fixed point; they sum to 256.
const WEIGHT_R: u32 = 77;
const WEIGHT_G: u32 = 150;
const WEIGHT_B: u32 = 29;

/// RGBA → single-channel luma reducer.
///
/// Applies the perceptual weighted sum of the color channels with rounding;
/// alpha is ignored. Output dimensions always equal the input's, so the
/// reduction has no failure modes.
///
/// # Example
/// ```rust
/// use lumapipe_codec::prelude::*;
///
/// let pool = BufferPool::with_capacity(1, 4);
/// let mut lease = pool.lease();
/// lease.resize(4);
/// lease.as_mut_slice().copy_from_slice(&[255, 255, 255, 255]);
/// let rgba = RgbaRaster::new(1, 1, lease);
///
/// let reducer = LumaReducer::new(1, 1);
/// let luma = reducer.reduce(&rgba);
/// assert_eq!(luma.data(), &[255]);
/// ```
pub struct LumaReducer {
    pool: BufferPool,
}

impl LumaReducer {
    /// Size the output pool for rasters up to `max_width` x `max_height`.
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            pool: BufferPool::with_limits(2, max_width as usize * max_height as usize, 4),
        }
    }

    /// Reduce a full-color raster to luma; dimensions carry over unchanged.
    pub fn reduce(&self, rgba: &RgbaRaster) -> LumaRaster {
        let len = rgba.width() as usize * rgba.height() as usize;
        let mut buf = self.pool.lease();
        unsafe { buf.resize_uninit(len) };
        for (dst, px) in buf.as_mut_slice().iter_mut().zip(rgba.data().chunks_exact(4)) {
            let weighted =
                WEIGHT_R * px[0] as u32 + WEIGHT_G * px[1] as u32 + WEIGHT_B * px[2] as u32;
            *dst = ((weighted + 128) >> 8) as u8;
        }
        LumaRaster::new(rgba.width(), rgba.height(), buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_raster(width: u32, height: u32, pixels: &[u8]) -> RgbaRaster {
        let pool = BufferPool::with_capacity(1, pixels.len());
        let mut lease = pool.lease();
        lease.resize(pixels.len());
        lease.as_mut_slice().copy_from_slice(pixels);
        RgbaRaster::new(width, height, lease)
    }

    #[test]
    fn primary_colors_reduce_to_weighted_values() {
        let raster = rgba_raster(
            2,
            2,
            &[
                255, 0, 0, 255, // red
                0, 255, 0, 255, // green
                0, 0, 255, 255, // blue
                255, 255, 255, 255, // white
            ],
        );
        let reducer = LumaReducer::new(2, 2);
        let luma = reducer.reduce(&raster);
        assert_eq!(luma.data(), &[77, 149, 29, 255]);
    }

    #[test]
    fn alpha_is_ignored() {
        let opaque = rgba_raster(1, 1, &[40, 80, 160, 255]);
        let transparent = rgba_raster(1, 1, &[40, 80, 160, 0]);
        let reducer = LumaReducer::new(1, 1);
        assert_eq!(
            reducer.reduce(&opaque).data(),
            reducer.reduce(&transparent).data()
        );
    }

    #[test]
    fn dimensions_carry_over() {
        let raster = rgba_raster(4, 2, &[128u8; 4 * 2 * 4]);
        let reducer = LumaReducer::new(4, 2);
        let luma = reducer.reduce(&raster);
        assert_eq!((luma.width(), luma.height()), (4, 2));
        assert_eq!(luma.data().len(), 8);
    }
}
