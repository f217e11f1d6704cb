use image::{DynamicImage, GrayImage};
use lumapipe_core::prelude::*;

/// Wrap a luma raster into a displayable grayscale image.
///
/// The adapter is deliberately thin: width, height, and a tightly packed
/// one-byte-per-pixel buffer go in, an owned image handle comes out. Any
/// further presentation transform (rotation for device orientation, scaling)
/// belongs to the display collaborator.
pub trait IntoGrayImage {
    /// Consume the raster and produce an owned `GrayImage`; `None` only when
    /// the buffer does not match the declared dimensions.
    fn into_gray_image(self) -> Option<GrayImage>;
}

impl IntoGrayImage for LumaRaster {
    fn into_gray_image(self) -> Option<GrayImage> {
        let (width, height) = (self.width(), self.height());
        GrayImage::from_raw(width, height, self.into_vec())
    }
}

/// Convenience wrapper for callers working with the `image` crate's generic
/// image type.
pub fn luma_to_dynamic_image(raster: LumaRaster) -> Option<DynamicImage> {
    raster.into_gray_image().map(DynamicImage::ImageLuma8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn luma_raster(width: u32, height: u32, bytes: &[u8]) -> LumaRaster {
        let pool = BufferPool::with_capacity(1, bytes.len());
        let mut lease = pool.lease();
        lease.resize(bytes.len());
        lease.as_mut_slice().copy_from_slice(bytes);
        LumaRaster::new(width, height, lease)
    }

    #[test]
    fn gray_image_preserves_dimensions_and_content() {
        let raster = luma_raster(2, 2, &[0, 64, 128, 255]);
        let img = raster.into_gray_image().unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(1, 0).0, [64]);
        assert_eq!(img.get_pixel(1, 1).0, [255]);
    }

    #[test]
    fn dynamic_image_wraps_luma() {
        let raster = luma_raster(1, 2, &[7, 9]);
        let img = luma_to_dynamic_image(raster).unwrap();
        assert!(matches!(img, DynamicImage::ImageLuma8(_)));
    }
}
