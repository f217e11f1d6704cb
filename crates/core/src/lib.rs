#![doc = include_str!("../README.md")]

pub mod buffer;
pub mod format;
pub mod frame;
pub mod metrics;
pub mod queue;
pub mod raster;

pub mod prelude {
    pub use crate::{
        buffer::{BufferLease, BufferPool, BufferPoolMetrics},
        format::PixelFormat,
        frame::{
            ExternalBacking, FrameBuffer, PlaneDescriptor, backing_len, i420_plane_layout,
            nv12_plane_layout, nv21_plane_layout,
        },
        metrics::Metrics,
        queue::{BoundedRx, BoundedTx, RecvOutcome, SendOutcome, bounded},
        raster::{LumaRaster, RgbaRaster},
    };
}
