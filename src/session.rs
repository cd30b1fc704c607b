//! Per-connection session state
//!
//! A [`SessionState`] is an immutable snapshot of everything the frame sender
//! needs: geometry, target rate, playback flag with its time origin, and the
//! frame pool rendered for that geometry. The control channel is the only
//! writer; it publishes a complete new snapshot through a `watch` channel for
//! every applied command, so readers never observe a half-applied Resize.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::pacing::PacingClock;
use crate::pool::FramePool;
use crate::types::{FrameRate, Geometry};

/// Playback flag plus the data that only exists while playing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Stopped,
    Playing {
        /// Time origin for target index computation
        started_at: Instant,
        /// Distinguishes successive Start commands; a new run restarts at index 0
        run: u64,
    },
}

/// Immutable snapshot of one connection's configuration
#[derive(Debug, Clone)]
pub struct SessionState {
    rate: FrameRate,
    playback: Playback,
    pool: Arc<FramePool>,
}

impl SessionState {
    /// Stopped session using `pool` for its geometry
    pub fn new(rate: FrameRate, pool: Arc<FramePool>) -> Self {
        Self { rate, playback: Playback::Stopped, pool }
    }

    /// Geometry is always the geometry of the published pool
    pub fn geometry(&self) -> Geometry {
        self.pool.geometry()
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    pub fn pacing_interval_micros(&self) -> u64 {
        self.rate.interval_micros()
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.playback, Playback::Playing { .. })
    }

    pub fn pool(&self) -> &Arc<FramePool> {
        &self.pool
    }

    /// Pacing clock for the current run, `None` while stopped
    pub fn clock(&self) -> Option<PacingClock> {
        match self.playback {
            Playback::Stopped => None,
            Playback::Playing { started_at, .. } => {
                Some(PacingClock::new(started_at, self.rate.interval_micros()))
            }
        }
    }

    /// Same playback, new rate and pool
    pub fn resized(&self, rate: FrameRate, pool: Arc<FramePool>) -> Self {
        Self { rate, playback: self.playback, pool }
    }

    pub fn started(&self, started_at: Instant, run: u64) -> Self {
        Self { playback: Playback::Playing { started_at, run }, ..self.clone() }
    }

    pub fn stopped(&self) -> Self {
        Self { playback: Playback::Stopped, ..self.clone() }
    }
}

/// Reading end of a session, shared by the frame sender and observers
pub type SessionWatch = watch::Receiver<Arc<SessionState>>;

/// Writing end of a session, owned by the control channel
pub type SessionPublisher = watch::Sender<Arc<SessionState>>;
