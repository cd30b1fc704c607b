//! Frame buffer pool
//!
//! A pool is an immutable, fixed-length cycle of pre-encoded frames for one
//! geometry. It is never mutated after construction: a geometry change
//! renders a brand new pool and publishes it by reference, so a send already
//! holding a frame from the old pool completes untouched.

use std::sync::Arc;
use tracing::{debug, info};

use crate::raster::{BmpEncoder, FrameEncoder, NoiseGenerator, RasterGenerator};
use crate::types::{EncodedFrame, Geometry};
use crate::{Result, StreamError};

/// Number of distinct frames in the playback cycle
pub const DEFAULT_POOL_SIZE: usize = 5;

/// Immutable cycle of encoded frames for a single geometry
#[derive(Debug)]
pub struct FramePool {
    geometry: Geometry,
    frames: Vec<EncodedFrame>,
}

impl FramePool {
    /// Build a pool from already encoded frames
    pub fn from_frames(geometry: Geometry, frames: Vec<EncodedFrame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(StreamError::Render { reason: "frame pool cannot be empty".to_string() });
        }
        Ok(Self { geometry, frames })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame shown at 1-based playback index `index`.
    ///
    /// The first frame of a run (`index == 1`) is entry 0 and the cycle repeats
    /// every `len()` frames. This is one slot behind a plain `index mod len()`
    /// lookup, which would open each run on entry 1; with noise frames the
    /// offset is not observable by a client.
    pub fn frame_for_index(&self, index: u64) -> &EncodedFrame {
        let slot = (index.saturating_sub(1) % self.frames.len() as u64) as usize;
        &self.frames[slot]
    }

    pub fn frames(&self) -> &[EncodedFrame] {
        &self.frames
    }
}

/// Renders whole frame pools from a generator and an encoder
#[derive(Clone)]
pub struct FrameRenderer {
    generator: Arc<dyn RasterGenerator>,
    encoder: Arc<dyn FrameEncoder>,
    pool_size: usize,
}

impl FrameRenderer {
    pub fn new(
        generator: Arc<dyn RasterGenerator>,
        encoder: Arc<dyn FrameEncoder>,
        pool_size: usize,
    ) -> Self {
        Self { generator, encoder, pool_size: pool_size.max(1) }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Render every frame for `geometry` on the calling thread.
    ///
    /// Either all frames encode and a complete pool is returned, or nothing is.
    pub fn render_blocking(&self, geometry: Geometry) -> Result<FramePool> {
        let frames = (0..self.pool_size)
            .map(|slot| {
                let pixels = self.generator.generate(geometry);
                let payload = self.encoder.encode(&pixels, geometry)?;
                debug!(slot, bytes = payload.len(), "Encoded frame for {}", geometry);
                Ok(EncodedFrame::new(payload))
            })
            .collect::<Result<Vec<_>>>()?;

        FramePool::from_frames(geometry, frames)
    }

    /// Render a pool on the blocking thread pool, keeping the async runtime free
    pub async fn render(&self, geometry: Geometry) -> Result<Arc<FramePool>> {
        let renderer = self.clone();
        let started = tokio::time::Instant::now();

        let pool = tokio::task::spawn_blocking(move || renderer.render_blocking(geometry))
            .await
            .map_err(|e| StreamError::Render { reason: format!("render task failed: {}", e) })??;

        info!(
            frames = pool.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rendered frame pool for {}",
            geometry
        );
        Ok(Arc::new(pool))
    }
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self::new(Arc::new(NoiseGenerator), Arc::new(BmpEncoder), DEFAULT_POOL_SIZE)
    }
}

impl std::fmt::Debug for FrameRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer").field("pool_size", &self.pool_size).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::read_bmp_geometry;
    use crate::test_utils::SequenceGenerator;

    fn frame(tag: u8) -> EncodedFrame {
        EncodedFrame::new(vec![tag])
    }

    #[test]
    fn index_selection_cycles_through_pool() {
        let frames = (0..5).map(frame).collect();
        let pool = FramePool::from_frames(Geometry::new(1, 1), frames).unwrap();

        // k-th frame of a run uses entry (k - 1) mod 5
        for k in 1..=12u64 {
            let expected = ((k - 1) % 5) as u8;
            assert_eq!(pool.frame_for_index(k).as_ref(), &[expected]);
        }
    }

    #[test]
    fn empty_pool_is_rejected() {
        let error = FramePool::from_frames(Geometry::new(1, 1), Vec::new()).unwrap_err();
        assert!(matches!(error, StreamError::Render { .. }));
    }

    #[test]
    fn default_renderer_produces_distinct_bmp_frames() {
        let geometry = Geometry::new(32, 16);
        let pool = FrameRenderer::default().render_blocking(geometry).unwrap();

        assert_eq!(pool.len(), DEFAULT_POOL_SIZE);
        assert_eq!(pool.geometry(), geometry);
        for frame in pool.frames() {
            assert_eq!(read_bmp_geometry(frame.as_ref()), Some(geometry));
        }
        assert_ne!(pool.frames()[0], pool.frames()[1]);
    }

    #[test]
    fn encoder_failure_yields_no_pool() {
        // Generator returns the wrong sample count for any geometry wider than 1
        struct ShortGenerator;
        impl RasterGenerator for ShortGenerator {
            fn generate(&self, _geometry: Geometry) -> Vec<u8> {
                vec![0; 1]
            }
        }

        let renderer = FrameRenderer::new(Arc::new(ShortGenerator), Arc::new(BmpEncoder), 3);
        let error = renderer.render_blocking(Geometry::new(2, 2)).unwrap_err();
        assert!(matches!(error, StreamError::Encode { .. }));
    }

    #[tokio::test]
    async fn async_render_matches_pool_size() {
        let renderer =
            FrameRenderer::new(Arc::new(SequenceGenerator::default()), Arc::new(BmpEncoder), 3);
        let pool = renderer.render(Geometry::new(4, 4)).await.unwrap();

        assert_eq!(pool.len(), 3);
        assert_ne!(pool.frames()[0], pool.frames()[2]);
    }
}
