//! Message pipeline: framing + formatting + unbatching composed per connection.
//!
//! The [`PipelineBuilder`] provides a fluent API for the transport-level
//! settings and builds a [`MessagePipeline`] over either transport family:
//! 1. Pick the frame reader/writer for the transport
//! 2. Pair them with one formatter, shared by both directions
//! 3. Wrap the reader in an [`Unbatcher`]
//!
//! # Example
//!
//! ```
//! use jsonrpc_wire::formatter::JsonFormatter;
//! use jsonrpc_wire::message::Notification;
//! use jsonrpc_wire::pipeline::PipelineBuilder;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> jsonrpc_wire::Result<()> {
//! let (a, b) = tokio::io::duplex(4096);
//! let mut client = PipelineBuilder::new().length_prefixed(a, JsonFormatter::new())?;
//! let mut server = PipelineBuilder::new().length_prefixed(b, JsonFormatter::new())?;
//! let cancel = CancellationToken::new();
//!
//! client.write_message(&Notification::new("ping", None).into(), &cancel).await?;
//! let received = server.read_message(&cancel).await?.unwrap();
//! assert_eq!(received.method(), Some("ping"));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;

use crate::batch::Unbatcher;
use crate::error::{Result, WireError};
use crate::formatter::{Encoding, Formatter};
use crate::message::Message;
use crate::protocol::DEFAULT_MAX_FRAME_SIZE;
use crate::transport::websocket::{self, WebSocketReceiver, WebSocketSender};
use crate::transport::{
    FrameReader, FrameWriter, LengthPrefixedReader, LengthPrefixedWriter, PacketFrameReader,
    PacketFrameWriter, PacketKind, PacketReceiver, PacketSender, DEFAULT_RECEIVE_SIZE_HINT,
};

/// Pipeline over a split tokio byte stream.
pub type LengthPrefixedPipeline<S, F> =
    MessagePipeline<LengthPrefixedReader<ReadHalf<S>>, LengthPrefixedWriter<WriteHalf<S>>, F>;

/// Pipeline over a tokio-tungstenite WebSocket.
pub type WebSocketPipeline<S, F> =
    MessagePipeline<PacketFrameReader<WebSocketReceiver<S>>, PacketFrameWriter<WebSocketSender<S>>, F>;

/// Writes messages as frames using a formatter.
pub struct MessageWriter<W, F> {
    writer: W,
    formatter: Arc<F>,
}

impl<W, F> MessageWriter<W, F>
where
    W: FrameWriter,
    F: Formatter,
{
    pub fn new(writer: W, formatter: Arc<F>) -> Self {
        Self { writer, formatter }
    }

    /// Encode `message` and send it as one frame.
    ///
    /// # Errors
    ///
    /// - `ConnectionClosed` after [`MessageWriter::close`]
    /// - `FrameTooLarge` if the encoded message exceeds the frame limit
    /// - transport errors and `Cancelled`
    pub async fn write_message(&mut self, message: &Message, cancel: &CancellationToken) -> Result<()> {
        let payload = self.formatter.encode(message);
        self.writer.write_frame(payload, cancel).await
    }

    /// Encode `messages` as one array frame.
    pub async fn write_batch(&mut self, messages: &[Message], cancel: &CancellationToken) -> Result<()> {
        if messages.is_empty() {
            return Err(WireError::EmptyBatch);
        }
        let payload = self.formatter.encode_batch(messages);
        self.writer.write_frame(payload, cancel).await
    }

    /// Close the transport's write side. Repeated calls are no-ops.
    pub async fn close(&mut self) -> Result<()> {
        self.writer.close().await
    }

    pub fn formatter(&self) -> &F {
        &self.formatter
    }

    pub fn encoding(&self) -> Option<Encoding> {
        self.formatter.encoding()
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

/// Full-duplex message channel over one connection.
///
/// Reads and writes may run concurrently once the pipeline is [`split`];
/// on the unsplit value every operation takes `&mut self`.
///
/// [`split`]: MessagePipeline::split
pub struct MessagePipeline<R, W, F> {
    reader: Unbatcher<R, F>,
    writer: MessageWriter<W, F>,
}

impl<R, W, F> MessagePipeline<R, W, F>
where
    R: FrameReader,
    W: FrameWriter,
    F: Formatter,
{
    /// Compose a pipeline from a frame reader, a frame writer and a formatter.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedEncoding` for a text formatter whose encoding is
    /// not UTF-8.
    pub fn new(reader: R, writer: W, formatter: F) -> Result<Self> {
        let formatter = Arc::new(formatter);
        let reader = Unbatcher::new(reader, Arc::clone(&formatter))?;
        let writer = MessageWriter::new(writer, formatter);
        Ok(Self { reader, writer })
    }

    /// Read the next message, or `Ok(None)` at end of stream.
    pub async fn read_message(&mut self, cancel: &CancellationToken) -> Result<Option<Message>> {
        self.reader.read_message(cancel).await
    }

    pub async fn write_message(&mut self, message: &Message, cancel: &CancellationToken) -> Result<()> {
        self.writer.write_message(message, cancel).await
    }

    pub async fn write_batch(&mut self, messages: &[Message], cancel: &CancellationToken) -> Result<()> {
        self.writer.write_batch(messages, cancel).await
    }

    /// Text encoding of the formatter, `None` for binary formats.
    pub fn encoding(&self) -> Option<Encoding> {
        self.writer.encoding()
    }

    pub fn formatter(&self) -> &F {
        self.writer.formatter()
    }

    /// Close the write side. Repeated calls are no-ops.
    pub async fn close(&mut self) -> Result<()> {
        self.writer.close().await
    }

    /// Split into independently owned read and write halves.
    pub fn split(self) -> (Unbatcher<R, F>, MessageWriter<W, F>) {
        (self.reader, self.writer)
    }
}

/// Transport-level settings shared by every pipeline a builder creates.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Largest frame accepted or sent, in bytes.
    pub max_frame_size: usize,
    /// Initial receive buffer size for packet sockets.
    pub receive_size_hint: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            receive_size_hint: DEFAULT_RECEIVE_SIZE_HINT,
        }
    }
}

/// Builder for [`MessagePipeline`]s.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Set the maximum frame size.
    ///
    /// Frames announcing or producing more bytes fail with `FrameTooLarge`.
    /// Default: 100MB
    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.config.max_frame_size = bytes;
        self
    }

    /// Set the initial packet receive buffer size.
    ///
    /// Default: 4096
    pub fn receive_size_hint(mut self, bytes: usize) -> Self {
        self.config.receive_size_hint = bytes;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Length-prefixed pipeline over a duplex byte stream.
    pub fn length_prefixed<S, F>(&self, stream: S, formatter: F) -> Result<LengthPrefixedPipeline<S, F>>
    where
        S: AsyncRead + AsyncWrite + Send,
        F: Formatter,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        self.length_prefixed_halves(read_half, write_half, formatter)
    }

    /// Length-prefixed pipeline over separate read and write streams.
    pub fn length_prefixed_halves<R, W, F>(
        &self,
        reader: R,
        writer: W,
        formatter: F,
    ) -> Result<MessagePipeline<LengthPrefixedReader<R>, LengthPrefixedWriter<W>, F>>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
        F: Formatter,
    {
        MessagePipeline::new(
            LengthPrefixedReader::with_max_frame_size(reader, self.config.max_frame_size),
            LengthPrefixedWriter::with_max_frame_size(writer, self.config.max_frame_size),
            formatter,
        )
    }

    /// Packet pipeline over a tokio-tungstenite WebSocket.
    ///
    /// Text formatters send text messages, binary formatters binary ones.
    pub fn websocket<S, F>(&self, ws: WebSocketStream<S>, formatter: F) -> Result<WebSocketPipeline<S, F>>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
        F: Formatter,
    {
        let (receiver, sender) = websocket::split(ws);
        self.packet(receiver, sender, formatter)
    }

    /// Packet pipeline over any packet socket halves.
    pub fn packet<Rx, Tx, F>(
        &self,
        receiver: Rx,
        sender: Tx,
        formatter: F,
    ) -> Result<MessagePipeline<PacketFrameReader<Rx>, PacketFrameWriter<Tx>, F>>
    where
        Rx: PacketReceiver,
        Tx: PacketSender,
        F: Formatter,
    {
        let kind = match formatter.encoding() {
            Some(_) => PacketKind::Text,
            None => PacketKind::Binary,
        };
        MessagePipeline::new(
            PacketFrameReader::with_size_hint(receiver, self.config.receive_size_hint)
                .max_frame_size(self.config.max_frame_size),
            PacketFrameWriter::new(sender, kind).max_frame_size(self.config.max_frame_size),
            formatter,
        )
    }
}
