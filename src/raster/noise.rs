//! Uniform random intensity rasters

use rand::Rng;

use super::RasterGenerator;
use crate::types::Geometry;

/// Generates visual noise: every sample is an independent uniform byte
#[derive(Debug, Clone, Copy, Default)]
pub struct NoiseGenerator;

impl RasterGenerator for NoiseGenerator {
    fn generate(&self, geometry: Geometry) -> Vec<u8> {
        let mut pixels = vec![0u8; geometry.pixel_count()];
        rand::thread_rng().fill(&mut pixels[..]);
        pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_one_sample_per_pixel() {
        let pixels = NoiseGenerator.generate(Geometry::new(17, 9));
        assert_eq!(pixels.len(), 17 * 9);
    }

    #[test]
    fn consecutive_frames_differ() {
        let geometry = Geometry::new(64, 64);
        let first = NoiseGenerator.generate(geometry);
        let second = NoiseGenerator.generate(geometry);
        assert_ne!(first, second);
    }
}
