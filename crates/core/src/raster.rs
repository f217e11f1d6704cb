use crate::{buffer::BufferLease, format::PixelFormat};

/// Full-color raster produced by the converter.
///
/// Tightly packed RGBA rows with opaque alpha. It only lives between
/// conversion and luma reduction; the backing buffer returns to its pool on
/// drop.
pub struct RgbaRaster {
    width: u32,
    height: u32,
    data: BufferLease,
}

impl RgbaRaster {
    /// Wrap a fully written buffer of exactly `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, data: BufferLease) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            data,
        }
    }

    /// Raster width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raster height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format tag of the raster bytes.
    pub fn format(&self) -> PixelFormat {
        PixelFormat::Rgba8888
    }

    /// The packed RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }
}

/// Single-channel output raster handed to the display collaborator.
///
/// Ownership transfers to the caller on return from the pipeline; the bytes
/// can be borrowed in place or taken out as an owned vector for export.
///
/// # Example
/// ```rust
/// use lumapipe_core::prelude::{BufferPool, LumaRaster, PixelFormat};
///
/// let pool = BufferPool::with_capacity(1, 16);
/// let mut lease = pool.lease();
/// lease.resize(16);
/// let raster = LumaRaster::new(4, 4, lease);
/// assert_eq!(raster.format(), PixelFormat::Grey8);
/// assert_eq!(raster.into_vec().len(), 16);
/// ```
pub struct LumaRaster {
    width: u32,
    height: u32,
    data: BufferLease,
}

impl LumaRaster {
    /// Wrap a fully written buffer of exactly `width * height` bytes.
    pub fn new(width: u32, height: u32, data: BufferLease) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        Self {
            width,
            height,
            data,
        }
    }

    /// Raster width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raster height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format tag of the raster bytes.
    pub fn format(&self) -> PixelFormat {
        PixelFormat::Grey8
    }

    /// The packed luma bytes, one per pixel, row-major.
    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Take the bytes as an owned vector; the buffer does not return to its
    /// pool.
    pub fn into_vec(self) -> Vec<u8> {
        self.data.into_vec()
    }
}
