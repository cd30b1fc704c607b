//! WebSocket server
//!
//! Binds one listening socket and serves every accepted client as an
//! independent connection. The default-geometry pool is rendered once at
//! startup and shared by reference with each new connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::connection::{Connection, ConnectionContext};
use crate::pool::FrameRenderer;
use crate::session::SessionState;
use crate::transport::websocket;
use crate::{Result, StreamError};

/// Pause after a failed accept before trying again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Bound, not yet serving, frame streaming server
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    renderer: FrameRenderer,
}

impl Server {
    /// Validate `config` and bind its listening address
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let renderer = config.renderer();
        Self::bind_with_renderer(config, renderer).await
    }

    /// Bind using a custom frame renderer
    pub async fn bind_with_renderer(config: ServerConfig, renderer: FrameRenderer) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|source| StreamError::Bind { addr: config.bind_addr, source })?;

        Ok(Self { listener, config, renderer })
    }

    /// Address actually bound, useful when the configured port is 0
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|source| StreamError::Bind { addr: self.config.bind_addr, source })
    }

    /// Accept clients until `shutdown` is cancelled, then wait for open
    /// connections to wind down.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let pool = self.renderer.render(self.config.default_geometry).await?;
        let context = ConnectionContext {
            initial: Arc::new(SessionState::new(self.config.default_rate, pool)),
            renderer: self.renderer.clone(),
            max_dimension: self.config.max_dimension,
        };

        info!("Accepting connections on {}", self.local_addr()?);
        let mut connections = JoinSet::new();

        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished {
                        warn!("Connection task failed: {}", e);
                    }
                    continue;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("Accept failed: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
            };

            debug!(%peer, "Accepted TCP connection");
            connections.spawn(serve_client(stream, peer, context.clone(), shutdown.child_token()));
        }

        info!("Shutting down, waiting for {} connection(s)", connections.len());
        while let Some(finished) = connections.join_next().await {
            if let Err(e) = finished {
                warn!("Connection task failed: {}", e);
            }
        }
        info!("Server stopped");
        Ok(())
    }
}

async fn serve_client(
    stream: TcpStream,
    peer: SocketAddr,
    context: ConnectionContext,
    cancel: CancellationToken,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(%peer, "Could not disable Nagle: {}", e);
    }

    let socket = tokio::select! {
        _ = cancel.cancelled() => return,
        socket = websocket::accept(stream) => match socket {
            Ok(socket) => socket,
            Err(e) => {
                warn!(%peer, "WebSocket upgrade error: {}", e);
                return;
            }
        },
    };

    info!(%peer, "WebSocket opened");
    let (commands, frames) = websocket::split(socket);
    let summary = Connection::serve(commands, frames, context, cancel).await;

    info!(
        %peer,
        frames_sent = summary.frames_sent,
        commands_applied = summary.control.commands_applied,
        commands_dropped = summary.control.commands_dropped,
        "WebSocket closed"
    );
}
