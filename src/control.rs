//! Control channel
//!
//! Reads inbound messages in arrival order, decodes them and applies them to
//! the session. It is the single writer of session state: every applied
//! command publishes one complete snapshot. Malformed or rejected commands
//! are logged and dropped with the prior state left untouched.

use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pool::FrameRenderer;
use crate::protocol::Command;
use crate::session::{SessionPublisher, SessionState};
use crate::transport::CommandSource;
use crate::types::{FrameRate, Geometry};
use crate::{Result, StreamError};

/// Counters reported when a connection ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlStats {
    pub commands_applied: u64,
    pub commands_dropped: u64,
    pub commands_ignored: u64,
}

/// Owner of a connection's session state
pub struct ControlChannel {
    session: SessionPublisher,
    renderer: FrameRenderer,
    max_dimension: u32,
    runs: u64,
    stats: ControlStats,
}

impl ControlChannel {
    pub fn new(session: SessionPublisher, renderer: FrameRenderer, max_dimension: u32) -> Self {
        Self { session, renderer, max_dimension, runs: 0, stats: ControlStats::default() }
    }

    pub fn stats(&self) -> ControlStats {
        self.stats
    }

    /// Consume messages until the peer closes, a read fails, or `cancel` fires
    pub async fn run<S: CommandSource>(
        &mut self,
        mut source: S,
        cancel: CancellationToken,
    ) -> Result<()> {
        info!("Control channel started");

        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Control channel cancelled");
                    break;
                }
                message = source.next_message() => message?,
            };

            let Some(message) = message else {
                info!("Client closed the control channel");
                break;
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.handle_message(&message) => {}
            }
        }

        info!(
            applied = self.stats.commands_applied,
            dropped = self.stats.commands_dropped,
            "Control channel ended"
        );
        Ok(())
    }

    /// Decode and apply one message, absorbing recoverable failures
    pub async fn handle_message(&mut self, message: &str) {
        let command = match Command::parse(message) {
            Ok(Some(command)) => command,
            Ok(None) => {
                debug!("Ignoring unrecognised command {:?}", message);
                self.stats.commands_ignored += 1;
                return;
            }
            Err(e) => {
                warn!("Dropping command: {}", e);
                self.stats.commands_dropped += 1;
                return;
            }
        };

        match self.apply(command).await {
            Ok(()) => self.stats.commands_applied += 1,
            Err(e) => {
                warn!("Dropping {:?}: {}", command, e);
                self.stats.commands_dropped += 1;
            }
        }
    }

    /// Apply a decoded command to the session
    pub async fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Resize { geometry, rate } => self.resize(geometry, rate).await,
            Command::Start => {
                self.runs += 1;
                let run = self.runs;
                self.publish(|state| state.started(Instant::now(), run));
                info!(run, "Playback started");
                Ok(())
            }
            Command::Quit => {
                self.publish(|state| state.stopped());
                info!("Playback stopped");
                Ok(())
            }
        }
    }

    /// Render the new pool first, then commit geometry, rate and pool together
    async fn resize(&mut self, geometry: Geometry, rate: FrameRate) -> Result<()> {
        if !geometry.fits_within(self.max_dimension) {
            return Err(StreamError::geometry_rejected(
                geometry,
                format!("each side must be between 1 and {}", self.max_dimension),
            ));
        }

        let pool = self.renderer.render(geometry).await?;
        self.publish(|state| state.resized(rate, pool));

        info!(
            width = geometry.width,
            height = geometry.height,
            fps = rate.fps(),
            interval_us = rate.interval_micros(),
            "Client geometry applied"
        );
        Ok(())
    }

    fn publish(&self, next: impl FnOnce(&SessionState) -> SessionState) {
        let current = Arc::clone(&self.session.borrow());
        self.session.send_replace(Arc::new(next(&current)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{BmpEncoder, read_bmp_geometry};
    use crate::session::{Playback, SessionWatch};
    use crate::test_utils::{SequenceGenerator, command_channel, tagged_pool};
    use tokio::sync::watch;

    fn control() -> (ControlChannel, SessionWatch) {
        let initial =
            SessionState::new(FrameRate::default(), tagged_pool(Geometry::new(4, 4), 0, 5));
        let (publisher, session) = watch::channel(Arc::new(initial));
        let renderer =
            FrameRenderer::new(Arc::new(SequenceGenerator::default()), Arc::new(BmpEncoder), 5);
        (ControlChannel::new(publisher, renderer, 64), session)
    }

    #[tokio::test]
    async fn resize_publishes_geometry_rate_and_pool_together() {
        let (mut control, mut session) = control();

        control.handle_message("16,8,30").await;

        assert!(session.has_changed().unwrap());
        let state = Arc::clone(&session.borrow_and_update());
        assert_eq!(state.geometry(), Geometry::new(16, 8));
        assert_eq!(state.rate().fps(), 30.0);
        assert_eq!(state.pacing_interval_micros(), 33_333);
        assert_eq!(state.pool().len(), 5);
        for frame in state.pool().frames() {
            assert_eq!(read_bmp_geometry(frame.as_ref()), Some(Geometry::new(16, 8)));
        }
        assert_eq!(control.stats().commands_applied, 1);
    }

    #[tokio::test]
    async fn malformed_resize_leaves_state_unchanged() {
        let (mut control, mut session) = control();
        let before = Arc::clone(&session.borrow_and_update());

        control.handle_message("abc,def,xyz").await;

        assert!(!session.has_changed().unwrap());
        let after = Arc::clone(&session.borrow());
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(control.stats().commands_dropped, 1);
    }

    #[tokio::test]
    async fn oversized_geometry_is_rejected() {
        let (mut control, session) = control();

        control.handle_message("65,8,30").await;

        assert!(!session.has_changed().unwrap());
        assert_eq!(session.borrow().geometry(), Geometry::new(4, 4));
        assert_eq!(control.stats().commands_dropped, 1);
    }

    #[tokio::test]
    async fn start_and_quit_toggle_playback() {
        let (mut control, session) = control();

        control.handle_message("start").await;
        let first_run = match session.borrow().playback() {
            Playback::Playing { run, .. } => run,
            Playback::Stopped => panic!("Expected playback after start"),
        };

        control.handle_message("start").await;
        match session.borrow().playback() {
            Playback::Playing { run, .. } => assert!(run > first_run, "restart begins a new run"),
            Playback::Stopped => panic!("Expected playback after restart"),
        }

        control.handle_message("quit").await;
        assert_eq!(session.borrow().playback(), Playback::Stopped);
        assert_eq!(control.stats().commands_applied, 3);
    }

    #[tokio::test]
    async fn resize_during_playback_keeps_run() {
        let (mut control, session) = control();

        control.handle_message("start").await;
        let playback = session.borrow().playback();

        control.handle_message("8,8,120").await;
        assert_eq!(session.borrow().playback(), playback);
        assert_eq!(session.borrow().pacing_interval_micros(), 8_333);
    }

    #[tokio::test]
    async fn unknown_messages_are_ignored() {
        let (mut control, session) = control();

        control.handle_message("hello").await;

        assert!(!session.has_changed().unwrap());
        assert_eq!(
            control.stats(),
            ControlStats { commands_ignored: 1, ..ControlStats::default() }
        );
    }

    #[tokio::test]
    async fn run_applies_commands_in_order_until_close() {
        let (mut control, session) = control();
        let (feed, source) = command_channel();

        feed.send("start");
        feed.send("32,32,10");
        feed.send("quit");
        feed.send("8,4,5");
        drop(feed);

        control.run(source, CancellationToken::new()).await.unwrap();

        let state = Arc::clone(&session.borrow());
        assert_eq!(state.geometry(), Geometry::new(8, 4));
        assert_eq!(state.rate().fps(), 5.0);
        assert!(!state.is_playing());
        assert_eq!(control.stats().commands_applied, 4);
    }

    #[tokio::test]
    async fn read_failure_is_returned() {
        let (mut control, _session) = control();
        let (feed, source) = command_channel();

        feed.fail();
        let error = control.run(source, CancellationToken::new()).await.unwrap_err();
        assert!(error.is_connection_fatal());
    }

    #[tokio::test]
    async fn cancellation_stops_waiting_for_messages() {
        let (mut control, _session) = control();
        let (_feed, source) = command_channel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        control.run(source, cancel).await.unwrap();
    }
}
