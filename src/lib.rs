//! Paced raster frame streaming over WebSocket.
//!
//! framepace streams a repeating cycle of pre-encoded frames to one client per
//! connection, pacing delivery to a client-chosen frame rate, while accepting
//! in-band text commands that resize the frames, start playback and stop it.
//!
//! # Architecture
//!
//! - [`control::ControlChannel`] decodes commands and is the only writer of
//!   [`session::SessionState`], publishing whole snapshots through a watch channel
//! - [`pacing::PacingClock`] derives the target frame index from elapsed time
//! - [`sender::FrameSender`] sends one binary message per index until caught up,
//!   then sleeps until the next frame is due
//! - [`pool::FramePool`] holds the immutable frame cycle for one geometry,
//!   replaced by reference on every Resize
//!
//! # Protocol
//!
//! Inbound text messages: `"<width>,<height>,<fps>"`, `"start"`, `"quit"`;
//! anything else is ignored. Outbound: binary messages, each one complete
//! 8-bit grayscale BMP. No acknowledgements are sent.
//!
//! # Example
//!
//! ```rust,no_run
//! use framepace::{Server, ServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> framepace::Result<()> {
//!     let server = Server::bind(ServerConfig::default()).await?;
//!     server.run(CancellationToken::new()).await
//! }
//! ```

mod error;
#[cfg(test)]
mod test_utils;
pub mod types;

// Streaming engine
pub mod connection;
pub mod control;
pub mod pacing;
pub mod pool;
pub mod protocol;
pub mod sender;
pub mod session;

// Collaborators and outer surface
pub mod config;
pub mod raster;
pub mod server;
pub mod transport;

pub use error::*;
pub use types::*;

pub use config::ServerConfig;
pub use connection::{Connection, ConnectionContext, ConnectionHandle, ConnectionSummary};
pub use pool::{FramePool, FrameRenderer};
pub use protocol::Command;
pub use server::Server;
pub use session::{Playback, SessionState};
