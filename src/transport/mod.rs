//! Transport seam
//!
//! The engine only assumes an ordered, reliable, message-framed duplex
//! channel. Inbound it reads text commands from a [`CommandSource`];
//! outbound it writes one binary message per frame to a [`FrameSink`].

pub mod websocket;

use crate::Result;
use crate::types::EncodedFrame;

/// Inbound half of a client channel
#[async_trait::async_trait]
pub trait CommandSource: Send + 'static {
    /// Wait for the next control message
    ///
    /// Returns:
    /// - `Ok(Some(text))` - Next message, in arrival order
    /// - `Ok(None)` - Peer closed the channel
    /// - `Err(e)` - Read failure, terminal for the connection
    async fn next_message(&mut self) -> Result<Option<String>>;
}

/// Outbound half of a client channel
///
/// A sink has exactly one writer, the frame sender, so sends never interleave.
#[async_trait::async_trait]
pub trait FrameSink: Send + 'static {
    /// Transmit one frame as a single binary message
    async fn send_frame(&mut self, frame: EncodedFrame) -> Result<()>;

    /// Flush and close the outbound half
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
