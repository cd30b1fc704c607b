//! Raster generation and encoding collaborators
//!
//! The streaming engine only depends on the two traits here. A generator
//! produces raw 8-bit intensity samples; an encoder wraps them in a container
//! the client can display.

mod bmp;
mod noise;

pub use bmp::{BmpEncoder, read_bmp_geometry};
pub use noise::NoiseGenerator;

use bytes::Bytes;

use crate::Result;
use crate::types::Geometry;

/// Source of raw frame rasters
pub trait RasterGenerator: Send + Sync + 'static {
    /// Produce exactly `geometry.pixel_count()` intensity samples, row-major
    fn generate(&self, geometry: Geometry) -> Vec<u8>;
}

/// Container encoding for raw rasters
pub trait FrameEncoder: Send + Sync + 'static {
    /// Encode a row-major raster of `geometry`.
    ///
    /// Fails only on malformed input: a sample count that does not match the
    /// geometry, or a geometry the container cannot represent.
    fn encode(&self, pixels: &[u8], geometry: Geometry) -> Result<Bytes>;
}
