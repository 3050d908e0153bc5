//! Packet-socket framing: one message per logical transmission unit.
//!
//! A packet socket (WebSocket being the usual one) delivers a message as one
//! or more fragments; the last fragment carries `end_of_message`. The reader
//! concatenates fragments until then. A close fragment from the peer ends
//! the stream after the close handshake is completed.

use std::future::Future;

use bytes::{Bytes, BytesMut};
use tokio_util::sync::CancellationToken;

use super::{FrameReader, FrameWriter};
use crate::error::{Result, WireError};
use crate::protocol::{Frame, DEFAULT_MAX_FRAME_SIZE};

/// Initial receive buffer size.
pub const DEFAULT_RECEIVE_SIZE_HINT: usize = 4096;

/// Reason sent when answering the peer's close request.
const PEER_CLOSE_REASON: &str = "Closed as requested.";

/// Reason sent when the local side closes.
const LOCAL_CLOSE_REASON: &str = "Client closing.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Text,
    Binary,
    Close,
}

/// One partial receive from a packet socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub data: Bytes,
    pub end_of_message: bool,
    pub kind: PacketKind,
}

impl Fragment {
    pub fn new(data: impl Into<Bytes>, end_of_message: bool, kind: PacketKind) -> Self {
        Self {
            data: data.into(),
            end_of_message,
            kind,
        }
    }

    /// A complete text message in one fragment.
    pub fn text(data: impl Into<Bytes>) -> Self {
        Self::new(data, true, PacketKind::Text)
    }

    /// A complete binary message in one fragment.
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::new(data, true, PacketKind::Binary)
    }

    /// The peer asked to close the connection.
    pub fn close() -> Self {
        Self::new(Bytes::new(), true, PacketKind::Close)
    }
}

/// Receiving half of a packet socket.
pub trait PacketReceiver: Send {
    /// Wait for the next fragment.
    fn receive(&mut self) -> impl Future<Output = Result<Fragment>> + Send;

    /// Complete the close handshake after the peer sent a close fragment.
    fn close(&mut self, reason: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Sending half of a packet socket.
pub trait PacketSender: Send {
    /// Send `data` as one complete message.
    fn send(&mut self, data: Bytes, kind: PacketKind) -> impl Future<Output = Result<()>> + Send;

    /// Start the close handshake.
    fn close(&mut self, reason: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Assembles fragments from a [`PacketReceiver`] into frames.
pub struct PacketFrameReader<S> {
    socket: S,
    buffer: BytesMut,
    size_hint: usize,
    max_frame_size: usize,
    closed: bool,
}

impl<S> PacketFrameReader<S> {
    pub fn new(socket: S) -> Self {
        Self::with_size_hint(socket, DEFAULT_RECEIVE_SIZE_HINT)
    }

    pub fn with_size_hint(socket: S, size_hint: usize) -> Self {
        Self {
            socket,
            buffer: BytesMut::with_capacity(size_hint),
            size_hint,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            closed: false,
        }
    }

    pub fn max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Whether end of stream has been reached (peer close or empty packet).
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn get_ref(&self) -> &S {
        &self.socket
    }
}

impl<S> PacketFrameReader<S>
where
    S: PacketReceiver,
{
    /// Answer the peer's close and mark the socket closed.
    async fn finish_close(&mut self) {
        self.closed = true;
        self.buffer.clear();
        if let Err(e) = self.socket.close(PEER_CLOSE_REASON).await {
            tracing::warn!(error = %e, "close handshake failed after peer close");
        }
    }
}

impl<S> FrameReader for PacketFrameReader<S>
where
    S: PacketReceiver,
{
    async fn read_frame(&mut self, cancel: &CancellationToken) -> Result<Option<Frame>> {
        if self.closed {
            return Ok(None);
        }

        self.buffer.clear();
        self.buffer.reserve(self.size_hint);

        loop {
            let fragment = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.buffer.clear();
                    return Err(WireError::Cancelled);
                }
                fragment = self.socket.receive() => fragment?,
            };

            if fragment.kind == PacketKind::Close {
                tracing::debug!("peer requested close");
                self.finish_close().await;
                return Ok(None);
            }

            let size = self.buffer.len() + fragment.data.len();
            if size > self.max_frame_size {
                self.buffer.clear();
                return Err(WireError::FrameTooLarge {
                    size,
                    max: self.max_frame_size,
                });
            }
            self.buffer.extend_from_slice(&fragment.data);

            if fragment.end_of_message {
                break;
            }
        }

        if self.buffer.is_empty() {
            tracing::debug!("empty packet, treating as end of stream");
            self.closed = true;
            return Ok(None);
        }

        let payload = self.buffer.split().freeze();
        tracing::trace!(len = payload.len(), "read packet frame");
        Ok(Some(Frame::new(payload)))
    }
}

/// Sends frames as whole messages on a [`PacketSender`].
pub struct PacketFrameWriter<S> {
    socket: S,
    kind: PacketKind,
    max_frame_size: usize,
    closed: bool,
}

impl<S> PacketFrameWriter<S> {
    /// `kind` selects text or binary messages; text formatters want `Text`.
    pub fn new(socket: S, kind: PacketKind) -> Self {
        Self {
            socket,
            kind,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            closed: false,
        }
    }

    pub fn max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn get_ref(&self) -> &S {
        &self.socket
    }
}

impl<S> FrameWriter for PacketFrameWriter<S>
where
    S: PacketSender,
{
    async fn write_frame(&mut self, payload: Bytes, cancel: &CancellationToken) -> Result<()> {
        if self.closed {
            return Err(WireError::ConnectionClosed);
        }
        if payload.len() > self.max_frame_size {
            return Err(WireError::FrameTooLarge {
                size: payload.len(),
                max: self.max_frame_size,
            });
        }

        let len = payload.len();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(WireError::Cancelled),
            sent = self.socket.send(payload, self.kind) => {
                tracing::trace!(len, "sent packet frame");
                sent
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.socket.close(LOCAL_CLOSE_REASON).await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted packet sockets for tests.

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Replays a fixed list of fragments, then waits forever.
    #[derive(Default)]
    pub struct ScriptedReceiver {
        pub fragments: VecDeque<Fragment>,
        pub receives: usize,
        pub close_reasons: Vec<String>,
    }

    impl ScriptedReceiver {
        pub fn new(fragments: impl IntoIterator<Item = Fragment>) -> Self {
            Self {
                fragments: fragments.into_iter().collect(),
                ..Self::default()
            }
        }
    }

    impl PacketReceiver for ScriptedReceiver {
        async fn receive(&mut self) -> Result<Fragment> {
            self.receives += 1;
            match self.fragments.pop_front() {
                Some(fragment) => Ok(fragment),
                None => std::future::pending().await,
            }
        }

        async fn close(&mut self, reason: &str) -> Result<()> {
            self.close_reasons.push(reason.to_owned());
            Ok(())
        }
    }

    /// Records every sent message.
    #[derive(Clone, Default)]
    pub struct RecordingSender {
        pub sent: Arc<Mutex<Vec<(Bytes, PacketKind)>>>,
        pub closes: Arc<Mutex<Vec<String>>>,
    }

    impl PacketSender for RecordingSender {
        async fn send(&mut self, data: Bytes, kind: PacketKind) -> Result<()> {
            self.sent.lock().unwrap().push((data, kind));
            Ok(())
        }

        async fn close(&mut self, reason: &str) -> Result<()> {
            self.closes.lock().unwrap().push(reason.to_owned());
            Ok(())
        }
    }
}
