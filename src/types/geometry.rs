//! Frame geometry

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of a raster frame in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of intensity samples a raster of this geometry holds
    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check that both sides are in `1..=max_dimension`
    pub fn fits_within(self, max_dimension: u32) -> bool {
        (1..=max_dimension).contains(&self.width) && (1..=max_dimension).contains(&self.height)
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(1024, 1024)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
