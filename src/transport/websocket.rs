//! WebSocket transport

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};

use super::{CommandSource, FrameSink};
use crate::types::EncodedFrame;
use crate::{Result, StreamError};

/// Complete the HTTP Upgrade handshake on an accepted stream.
///
/// Any request path is accepted.
pub async fn accept<S>(stream: S) -> Result<WebSocketStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tokio_tungstenite::accept_async(stream).await.map_err(|e| {
        StreamError::transport_with_source("websocket upgrade failed", Box::new(e))
    })
}

/// Split a websocket into its command and frame halves
pub fn split<S>(socket: WebSocketStream<S>) -> (WebSocketCommands<S>, WebSocketFrames<S>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sink, stream) = socket.split();
    (WebSocketCommands { stream }, WebSocketFrames { sink })
}

/// Text command reader over the inbound half of a websocket
pub struct WebSocketCommands<S> {
    stream: SplitStream<WebSocketStream<S>>,
}

#[async_trait::async_trait]
impl<S> CommandSource for WebSocketCommands<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn next_message(&mut self) -> Result<Option<String>> {
        loop {
            let message = match self.stream.next().await {
                None => return Ok(None),
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    return match StreamError::from(e) {
                        StreamError::ChannelClosed => Ok(None),
                        other => Err(other),
                    };
                }
            };

            match message {
                Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
                Message::Binary(data) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => debug!("Ignoring non-UTF-8 binary message ({} bytes)", data.len()),
                },
                Message::Close(frame) => {
                    debug!("Close frame received: {:?}", frame);
                    return Ok(None);
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                    trace!("Control frame received");
                }
            }
        }
    }
}

/// Binary frame writer over the outbound half of a websocket
pub struct WebSocketFrames<S> {
    sink: SplitSink<WebSocketStream<S>, Message>,
}

#[async_trait::async_trait]
impl<S> FrameSink for WebSocketFrames<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send_frame(&mut self, frame: EncodedFrame) -> Result<()> {
        self.sink.send(Message::Binary(frame.into_payload())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }
}
