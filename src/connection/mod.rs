//! Per-client connection lifecycle
//!
//! A connection runs two activities over one duplex channel: the control
//! channel (sole writer of session state) and the frame sender (sole writer
//! of the transport). The pacing clock is evaluated on demand by the sender.
//! Both share one cancellation token; whichever ends first cancels the other,
//! so a read failure, a write failure, or a server shutdown tears the whole
//! connection down promptly.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::StreamError;
use crate::control::{ControlChannel, ControlStats};
use crate::pool::FrameRenderer;
use crate::sender::FrameSender;
use crate::session::{SessionPublisher, SessionState, SessionWatch};
use crate::transport::{CommandSource, FrameSink};


/// Everything a new connection starts from
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    /// Initial, stopped session with the default geometry's pool
    pub initial: Arc<SessionState>,
    pub renderer: FrameRenderer,
    pub max_dimension: u32,
}

/// Outcome of a finished connection
#[derive(Debug, Default)]
pub struct ConnectionSummary {
    pub frames_sent: u64,
    pub control: ControlStats,
    /// The transport failure that ended the connection, if any
    pub error: Option<StreamError>,
}

/// Connection runner
pub struct Connection;

impl Connection {
    /// Run a connection to completion on the current task
    pub async fn serve<S, K>(
        source: S,
        sink: K,
        context: ConnectionContext,
        cancel: CancellationToken,
    ) -> ConnectionSummary
    where
        S: CommandSource,
        K: FrameSink,
    {
        let (publisher, _) = watch::channel(Arc::clone(&context.initial));
        Self::drive(source, sink, publisher, context, cancel).await
    }

    /// Spawn a connection and return a handle for observing and stopping it
    pub fn spawn<S, K>(source: S, sink: K, context: ConnectionContext) -> ConnectionHandle
    where
        S: CommandSource,
        K: FrameSink,
    {
        let (publisher, session) = watch::channel(Arc::clone(&context.initial));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(Self::drive(source, sink, publisher, context, cancel.clone()));

        ConnectionHandle { session, cancel, task: Some(task) }
    }

    async fn drive<S, K>(
        source: S,
        sink: K,
        publisher: SessionPublisher,
        context: ConnectionContext,
        cancel: CancellationToken,
    ) -> ConnectionSummary
    where
        S: CommandSource,
        K: FrameSink,
    {
        info!(geometry = %context.initial.geometry(), "Connection opened");

        let mut sender = FrameSender::new(sink, publisher.subscribe(), cancel.clone());
        let sender_cancel = cancel.clone();
        let sender_task = tokio::spawn(async move {
            let result = sender.run().await;
            // A failed write ends the control channel too
            sender_cancel.cancel();
            (sender.frames_sent(), result)
        });

        let mut control = ControlChannel::new(publisher, context.renderer, context.max_dimension);
        let control_result = control.run(source, cancel.clone()).await;
        cancel.cancel();
        let stats = control.stats();
        // Dropping the publisher also wakes a sender parked on session changes
        drop(control);

        let mut summary = ConnectionSummary { control: stats, ..Default::default() };
        if let Err(e) = control_result {
            summary.error = Some(e);
        }

        match sender_task.await {
            Ok((frames_sent, result)) => {
                summary.frames_sent = frames_sent;
                if let Err(e) = result {
                    summary.error.get_or_insert(e);
                }
            }
            Err(e) => {
                summary.error.get_or_insert(StreamError::transport(format!(
                    "frame sender task failed: {}",
                    e
                )));
            }
        }

        match &summary.error {
            Some(e) => warn!(frames = summary.frames_sent, "Connection closed: {}", e),
            None => info!(frames = summary.frames_sent, "Connection closed"),
        }
        summary
    }
}

/// Handle to a spawned connection
///
/// Dropping the handle cancels the connection.
pub struct ConnectionHandle {
    session: SessionWatch,
    cancel: CancellationToken,
    task: Option<JoinHandle<ConnectionSummary>>,
}

impl ConnectionHandle {
    /// Latest published session snapshot
    pub fn session(&self) -> Arc<SessionState> {
        Arc::clone(&self.session.borrow())
    }

    /// Watch session snapshots as they are published
    pub fn watch_session(&self) -> SessionWatch {
        self.session.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Wait for the connection to end
    pub async fn join(mut self) -> ConnectionSummary {
        let Some(task) = self.task.take() else {
            return ConnectionSummary::default();
        };
        task.await.unwrap_or_else(|e| ConnectionSummary {
            error: Some(StreamError::transport(format!("connection task failed: {}", e))),
            ..Default::default()
        })
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        debug!("Dropping connection handle");
        self.cancel.cancel();
    }
}
