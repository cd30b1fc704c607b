//! Target frame rate and the pacing interval derived from it

use serde::{Deserialize, Serialize};
use std::time::Duration;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Client-requested frames per second
///
/// The pacing interval is derived once, in whole microseconds, and never
/// drops below one microsecond.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FrameRate {
    fps: f64,
    interval_micros: u64,
}

impl FrameRate {
    /// Returns `None` unless `fps` is finite and strictly positive
    pub fn new(fps: f64) -> Option<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return None;
        }
        let interval_micros = (MICROS_PER_SECOND / fps).round().max(1.0) as u64;
        Some(Self { fps, interval_micros })
    }

    pub fn fps(self) -> f64 {
        self.fps
    }

    /// Microseconds per frame
    pub fn interval_micros(self) -> u64 {
        self.interval_micros
    }

    pub fn interval(self) -> Duration {
        Duration::from_micros(self.interval_micros)
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self { fps: 60.0, interval_micros: 16_667 }
    }
}

impl TryFrom<f64> for FrameRate {
    type Error = String;

    fn try_from(fps: f64) -> Result<Self, Self::Error> {
        FrameRate::new(fps).ok_or_else(|| format!("frame rate must be positive, got {}", fps))
    }
}

impl From<FrameRate> for f64 {
    fn from(rate: FrameRate) -> Self {
        rate.fps
    }
}
