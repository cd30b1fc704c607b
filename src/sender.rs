//! Frame sender
//!
//! Keeps the client's displayed index caught up to the pacing clock. While
//! `sent_index < target_index` it sends the next frame, one message at a time
//! and strictly in index order. Once caught up it sleeps until the next frame
//! is due, a new session snapshot is published, or the connection is
//! cancelled. It never spins.

use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::Result;
use crate::session::{Playback, SessionState, SessionWatch};
use crate::transport::FrameSink;

/// Sent/target counters for one playback run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCursor {
    run: Option<u64>,
    sent_index: u64,
    target_index: u64,
}

impl FrameCursor {
    pub fn sent_index(&self) -> u64 {
        self.sent_index
    }

    pub fn target_index(&self) -> u64 {
        self.target_index
    }

    /// Reset counters when a new run begins; a Resize keeps the same run
    fn follow(&mut self, playback: Playback) {
        match playback {
            Playback::Stopped => *self = FrameCursor::default(),
            Playback::Playing { run, .. } if self.run != Some(run) => {
                *self = FrameCursor { run: Some(run), ..FrameCursor::default() };
            }
            Playback::Playing { .. } => {}
        }
    }

    fn is_behind(&self) -> bool {
        self.sent_index < self.target_index
    }

    fn advance(&mut self) -> u64 {
        self.sent_index += 1;
        self.sent_index
    }

    /// Next index whose deadline the sender should wait for
    fn next_due(&self) -> u64 {
        self.sent_index.max(self.target_index) + 1
    }
}

/// Why the wait between bursts ended
enum Wake {
    Due,
    StateChanged,
    Shutdown,
}

/// Single writer of frames to one client
pub struct FrameSender<K> {
    sink: K,
    session: SessionWatch,
    cancel: CancellationToken,
    cursor: FrameCursor,
    frames_sent: u64,
}

impl<K: FrameSink> FrameSender<K> {
    pub fn new(sink: K, session: SessionWatch, cancel: CancellationToken) -> Self {
        Self { sink, session, cancel, cursor: FrameCursor::default(), frames_sent: 0 }
    }

    pub fn cursor(&self) -> FrameCursor {
        self.cursor
    }

    /// Total frames written over the sender's lifetime
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Run until cancelled, the session publisher goes away, or a write fails.
    ///
    /// A write failure is returned as-is and never retried.
    pub async fn run(&mut self) -> Result<()> {
        info!("Frame sender started");

        loop {
            let state = Arc::clone(&self.session.borrow_and_update());
            self.cursor.follow(state.playback());

            if let Some(clock) = state.clock() {
                self.cursor.target_index = clock.target_index(Instant::now());
                if !self.catch_up(&state).await? {
                    break;
                }
            }

            let deadline = state.clock().and_then(|clock| clock.deadline(self.cursor.next_due()));
            match self.wait(deadline).await {
                Wake::Due | Wake::StateChanged => {}
                Wake::Shutdown => break,
            }
        }

        self.sink.close().await.ok();
        info!("Frame sender ended ({} frames sent)", self.frames_sent);
        Ok(())
    }

    /// Emit every frame between the sent and target index.
    ///
    /// Stops early when a new snapshot is pending so that the following sends
    /// use the freshly published pool. Returns `false` on shutdown.
    async fn catch_up(&mut self, state: &SessionState) -> Result<bool> {
        let burst_start = self.cursor.sent_index;

        while self.cursor.is_behind() {
            match self.session.has_changed() {
                Ok(false) => {}
                Ok(true) => break,
                Err(_) => return Ok(false),
            }

            let index = self.cursor.advance();
            let frame = state.pool().frame_for_index(index).clone();

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(false),
                sent = self.sink.send_frame(frame) => sent?,
            }

            self.frames_sent += 1;
            trace!(index, geometry = %state.geometry(), "Frame sent");
        }

        let burst = self.cursor.sent_index - burst_start;
        if burst > 1 {
            debug!(burst, target = self.cursor.target_index, "Caught up after burst");
        }
        Ok(true)
    }

    async fn wait(&mut self, deadline: Option<Instant>) -> Wake {
        let due = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Wake::Shutdown,
            changed = self.session.changed() => match changed {
                Ok(()) => Wake::StateChanged,
                Err(_) => Wake::Shutdown,
            },
            _ = due => Wake::Due,
        }
    }
}
