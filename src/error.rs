//! Error types for the frame streaming engine.
//!
//! All errors implement `std::error::Error` and carry enough context to decide
//! how far a failure should propagate.
//!
//! ## Error Categories
//!
//! - **Protocol Errors**: malformed control commands, absorbed by dropping the message
//! - **Geometry Errors**: Resize requests outside the configured limits
//! - **Transport Errors**: duplex channel read/write failures, terminal for a connection
//! - **Encode/Render Errors**: frame pool generation failures, scoped to one regeneration
//! - **Server Errors**: listener bind and configuration failures
//!
//! ## Classification
//!
//! ```rust
//! use framepace::StreamError;
//!
//! let error = StreamError::protocol("abc,def,xyz", "invalid width");
//! assert!(error.is_recoverable());
//! assert!(!error.is_connection_fatal());
//!
//! let closed = StreamError::ChannelClosed;
//! assert!(closed.is_connection_fatal());
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::Geometry;

/// Result type alias for streaming operations.
pub type Result<T, E = StreamError> = std::result::Result<T, E>;

/// Main error type for streaming operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StreamError {
    #[error("Malformed command {message:?}: {reason}")]
    Protocol { message: String, reason: String },

    #[error("Geometry {geometry} rejected: {reason}")]
    GeometryRejected { geometry: Geometry, reason: String },

    #[error("Transport failure: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Channel closed by peer")]
    ChannelClosed,

    #[error("Failed to encode {geometry} frame: {reason}")]
    Encode { geometry: Geometry, reason: String },

    #[error("Frame pool render failed: {reason}")]
    Render { reason: String },

    #[error("Failed to bind listener on {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Configuration file error: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StreamError {
    /// Returns whether this error ends the connection it occurred on.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(self, StreamError::Transport { .. } | StreamError::ChannelClosed)
    }

    /// Returns whether the failure is absorbed locally without affecting session state.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StreamError::Protocol { .. } => true,
            StreamError::GeometryRejected { .. } => true,
            StreamError::Encode { .. } => true,
            StreamError::Render { .. } => true,
            StreamError::Transport { .. } => false,
            StreamError::ChannelClosed => false,
            StreamError::Bind { .. } => false,
            StreamError::Config { .. } => false,
            StreamError::ConfigFile { .. } => false,
        }
    }

    /// Helper constructor for malformed control commands.
    pub fn protocol(message: impl Into<String>, reason: impl Into<String>) -> Self {
        StreamError::Protocol { message: message.into(), reason: reason.into() }
    }

    /// Helper constructor for transport failures.
    pub fn transport(reason: impl Into<String>) -> Self {
        StreamError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport failures with source.
    pub fn transport_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        StreamError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for encoder failures.
    pub fn encode(geometry: Geometry, reason: impl Into<String>) -> Self {
        StreamError::Encode { geometry, reason: reason.into() }
    }

    /// Helper constructor for rejected geometry.
    pub fn geometry_rejected(geometry: Geometry, reason: impl Into<String>) -> Self {
        StreamError::GeometryRejected { geometry, reason: reason.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        StreamError::Config { reason: reason.into() }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for StreamError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => StreamError::ChannelClosed,
            other => StreamError::transport_with_source("websocket failure", Box::new(other)),
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::transport_with_source("socket I/O failure", Box::new(err))
    }
}
