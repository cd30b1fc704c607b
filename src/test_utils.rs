//! Test utilities: in-memory transport doubles and deterministic rasters
//!
//! These stand in for a real websocket so the control channel, sender and
//! connection wiring can be driven directly from tests.

#![cfg(test)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::mpsc;

use crate::pool::FramePool;
use crate::raster::RasterGenerator;
use crate::transport::{CommandSource, FrameSink};
use crate::types::{EncodedFrame, Geometry};
use crate::{Result, StreamError};

/// Pool whose entry `slot` carries the payload `[epoch, slot]`
pub fn tagged_pool(geometry: Geometry, epoch: u8, size: u8) -> Arc<FramePool> {
    let frames = (0..size).map(|slot| EncodedFrame::new(vec![epoch, slot])).collect();
    Arc::new(FramePool::from_frames(geometry, frames).expect("non-empty pool"))
}

/// Generator that fills each successive raster with the next byte value
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    next: AtomicU8,
}

impl RasterGenerator for SequenceGenerator {
    fn generate(&self, geometry: Geometry) -> Vec<u8> {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        vec![value; geometry.pixel_count()]
    }
}

/// Test-side handle for feeding control messages
pub struct CommandFeed {
    tx: mpsc::UnboundedSender<Result<String>>,
}

impl CommandFeed {
    pub fn send(&self, message: &str) {
        self.tx.send(Ok(message.to_string())).expect("command source dropped");
    }

    /// Make the next read fail as if the socket broke
    pub fn fail(&self) {
        self.tx.send(Err(StreamError::transport("simulated read failure"))).ok();
    }
}

/// Command source backed by an unbounded channel; dropping the feed closes it
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<Result<String>>,
}

#[async_trait::async_trait]
impl CommandSource for ChannelSource {
    async fn next_message(&mut self) -> Result<Option<String>> {
        self.rx.recv().await.transpose()
    }
}

pub fn command_channel() -> (CommandFeed, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandFeed { tx }, ChannelSource { rx })
}

/// Frame sink backed by an unbounded channel, optionally failing after a quota
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<EncodedFrame>,
    remaining: Option<u64>,
    _retained: Option<mpsc::UnboundedReceiver<EncodedFrame>>,
}

#[async_trait::async_trait]
impl FrameSink for ChannelSink {
    async fn send_frame(&mut self, frame: EncodedFrame) -> Result<()> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Err(StreamError::transport("simulated write failure"));
            }
            *remaining -= 1;
        }
        self.tx.send(frame).map_err(|_| StreamError::ChannelClosed)
    }
}

pub fn frame_channel() -> (ChannelSink, mpsc::UnboundedReceiver<EncodedFrame>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx, remaining: None, _retained: None }, rx)
}

/// Sink that accepts `successes` frames and fails every write after that
pub fn failing_sink(successes: u64) -> ChannelSink {
    let (tx, rx) = mpsc::unbounded_channel();
    ChannelSink { tx, remaining: Some(successes), _retained: Some(rx) }
}

/// Collect every frame delivered so far without waiting
pub fn drain_frames(rx: &mut mpsc::UnboundedReceiver<EncodedFrame>) -> Vec<EncodedFrame> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}
