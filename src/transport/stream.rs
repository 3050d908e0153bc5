//! Length-prefixed framing over a duplex byte stream.
//!
//! Wire format: `[4-byte length as u32 big-endian] + [content]`.
//!
//! # Example
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use jsonrpc_wire::transport::{FrameReader, FrameWriter, LengthPrefixedReader, LengthPrefixedWriter};
//! use tokio_util::sync::CancellationToken;
//! use bytes::Bytes;
//!
//! let (client, server) = tokio::io::duplex(1024);
//! let mut writer = LengthPrefixedWriter::new(client);
//! let mut reader = LengthPrefixedReader::new(server);
//! let cancel = CancellationToken::new();
//!
//! writer.write_frame(Bytes::from_static(b"{}"), &cancel).await.unwrap();
//! let frame = reader.read_frame(&cancel).await.unwrap().unwrap();
//! assert_eq!(frame.payload(), b"{}");
//! # }
//! ```

use std::io::IoSlice;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use super::{FrameReader, FrameWriter};
use crate::error::{Result, WireError};
use crate::protocol::{Frame, FrameBuffer, LengthHeader, DEFAULT_MAX_FRAME_SIZE};

/// Default number of bytes requested per stream read (64KB).
const DEFAULT_READ_SIZE: usize = 64 * 1024;

/// Reads length-prefixed frames from an async byte stream.
///
/// Partially received frames stay in an internal [`FrameBuffer`], so
/// cancelling a read never desynchronizes the framing: the next read picks up
/// where the cancelled one stopped.
pub struct LengthPrefixedReader<R> {
    reader: R,
    buffer: FrameBuffer,
    read_size: usize,
    finished: bool,
}

impl<R> LengthPrefixedReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_frame_size(reader, DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(reader: R, max_frame_size: usize) -> Self {
        Self {
            reader,
            buffer: FrameBuffer::with_max_frame_size(max_frame_size),
            read_size: DEFAULT_READ_SIZE,
            finished: false,
        }
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Bytes received but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl<R> FrameReader for LengthPrefixedReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read_frame(&mut self, cancel: &CancellationToken) -> Result<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            if let Some(frame) = self.buffer.next_frame()? {
                if frame.is_empty() {
                    tracing::debug!("zero-length frame, treating as end of stream");
                    self.finished = true;
                    return Ok(None);
                }
                tracing::trace!(len = frame.len(), "read length-prefixed frame");
                return Ok(Some(frame));
            }

            let target = self.buffer.read_target(self.read_size);
            let n = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WireError::Cancelled),
                read = self.reader.read_buf(target) => read?,
            };

            if n == 0 {
                if self.buffer.is_mid_frame() {
                    tracing::warn!(
                        buffered = self.buffer.len(),
                        "stream ended mid-frame, discarding partial frame"
                    );
                    self.buffer.clear();
                }
                self.finished = true;
                return Ok(None);
            }
        }
    }
}

/// Writes length-prefixed frames to an async byte stream.
pub struct LengthPrefixedWriter<W> {
    writer: W,
    max_frame_size: usize,
    closed: bool,
}

impl<W> LengthPrefixedWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_max_frame_size(writer, DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(writer: W, max_frame_size: usize) -> Self {
        Self {
            writer,
            max_frame_size,
            closed: false,
        }
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W> FrameWriter for LengthPrefixedWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_frame(&mut self, payload: Bytes, cancel: &CancellationToken) -> Result<()> {
        if self.closed {
            return Err(WireError::ConnectionClosed);
        }

        let header = LengthHeader::for_payload(payload.len(), self.max_frame_size)?.encode();
        let parts = [&header[..], &payload[..]];
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(WireError::Cancelled),
            written = write_all_vectored(&mut self.writer, &parts) => {
                tracing::trace!(len = payload.len(), "wrote length-prefixed frame");
                written
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Write all parts using scatter/gather I/O (write_vectored), then flush.
///
/// The common case is a single syscall for header + content; a partial write
/// continues from the first unwritten byte.
async fn write_all_vectored<W>(writer: &mut W, parts: &[&[u8]]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let total_size: usize = parts.iter().map(|p| p.len()).sum();
    let mut total_written = 0;

    while total_written < total_size {
        let slices = remaining_slices(parts, total_written);
        let written = writer.write_vectored(&slices).await?;
        if written == 0 {
            return Err(WireError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write_vectored returned 0",
            )));
        }
        total_written += written;
    }

    writer.flush().await?;
    Ok(())
}

/// Build IoSlice array for the data left after `skip_bytes` were written.
fn remaining_slices<'a>(parts: &[&'a [u8]], skip_bytes: usize) -> Vec<IoSlice<'a>> {
    let mut slices = Vec::with_capacity(parts.len());
    let mut start = 0;

    for part in parts {
        let end = start + part.len();
        if skip_bytes < end && !part.is_empty() {
            let offset = skip_bytes.saturating_sub(start);
            slices.push(IoSlice::new(&part[offset..]));
        }
        start = end;
    }

    slices
}
