//! WebSocket packet socket over tokio-tungstenite.
//!
//! tungstenite reassembles continuation frames itself, so every received
//! data message arrives as one final [`Fragment`]. Ping and pong are handled
//! by the library and skipped here.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::WebSocketStream;

use super::{Fragment, PacketKind, PacketReceiver, PacketSender};
use crate::error::{Result, WireError};

type SharedSink<S> = Arc<Mutex<SplitSink<WebSocketStream<S>, WsMessage>>>;

/// Split a WebSocket into independently usable receive and send halves.
///
/// Both halves share the sink so the receiver can answer a close request.
pub fn split<S>(ws: WebSocketStream<S>) -> (WebSocketReceiver<S>, WebSocketSender<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (sink, stream) = ws.split();
    let sink = Arc::new(Mutex::new(sink));
    (
        WebSocketReceiver {
            stream,
            sink: Arc::clone(&sink),
        },
        WebSocketSender { sink },
    )
}

pub struct WebSocketReceiver<S> {
    stream: SplitStream<WebSocketStream<S>>,
    sink: SharedSink<S>,
}

pub struct WebSocketSender<S> {
    sink: SharedSink<S>,
}

impl<S> PacketReceiver for WebSocketReceiver<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn receive(&mut self) -> Result<Fragment> {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(Fragment::text(text)),
                Some(Ok(WsMessage::Binary(data))) => return Ok(Fragment::binary(data)),
                Some(Ok(WsMessage::Close(frame))) => {
                    tracing::debug!(?frame, "websocket close received");
                    return Ok(Fragment::close());
                }
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                    continue
                }
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    return Ok(Fragment::close())
                }
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn close(&mut self, reason: &str) -> Result<()> {
        close_sink(&self.sink, reason).await
    }
}

impl<S> PacketSender for WebSocketSender<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, data: Bytes, kind: PacketKind) -> Result<()> {
        let message = match kind {
            PacketKind::Text => {
                let text = String::from_utf8(data.to_vec())
                    .map_err(|_| WireError::Protocol("text message is not valid UTF-8".into()))?;
                WsMessage::Text(text)
            }
            PacketKind::Binary => WsMessage::Binary(data.to_vec()),
            PacketKind::Close => return self.close("").await,
        };
        self.sink.lock().await.send(message).await?;
        Ok(())
    }

    async fn close(&mut self, reason: &str) -> Result<()> {
        close_sink(&self.sink, reason).await
    }
}

async fn close_sink<S>(sink: &SharedSink<S>, reason: &str) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: reason.to_owned().into(),
    };
    let mut sink = sink.lock().await;
    match sink.send(WsMessage::Close(Some(frame))).await {
        Ok(())
        | Err(WsError::ConnectionClosed)
        | Err(WsError::AlreadyClosed)
        | Err(WsError::Protocol(ProtocolError::SendAfterClosing)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
